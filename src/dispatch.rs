use crate::error::{LearnerError, Result};
use crate::models::Observation;
use crate::predictor::{PredictorKind, Scores};
use crate::registry::LearnerId;
use crate::service::{LearnerService, RegisterOptions};
use serde::{Deserialize, Serialize};

const SUPPORTED_ACTIONS: [&str; 3] = ["register", "observe", "predict"];

/// Action envelope: a single loosely-typed request routed to the
/// service. Extra request fields are ignored; observation payloads stay
/// strict (validated field by field on the way in).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Absent action lists the registered ids
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub learner_id: Option<LearnerId>,

    /// Raw observation payload for observe/predict
    #[serde(default)]
    pub observation: Option<serde_json::Value>,

    /// Predictor selection for register
    #[serde(default)]
    pub predictor: Option<PredictorKind>,

    /// Seed observations for register
    #[serde(default)]
    pub observations: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Registered(LearnerId),
    Scores(Scores),
    Ids(Vec<LearnerId>),
}

/// Route a request to the service
pub async fn dispatch(service: &LearnerService, request: Request) -> Result<Response> {
    let action = match request.action {
        None => return Ok(Response::Ids(service.list_ids().await?)),
        Some(action) => action,
    };

    match action.as_str() {
        "register" => {
            let observations = match request.observations {
                Some(raw) => Some(
                    raw.iter()
                        .map(Observation::from_value)
                        .collect::<Result<Vec<_>>>()?,
                ),
                None => None,
            };

            let id = service
                .register(RegisterOptions {
                    predictor: request.predictor,
                    observations,
                })
                .await?;
            Ok(Response::Registered(id))
        }

        "observe" => {
            let id = required_id(request.learner_id, "observe")?;
            let observation = required_observation(request.observation, "observe")?;
            Ok(Response::Scores(service.observe(id, &observation).await?))
        }

        "predict" => {
            let id = required_id(request.learner_id, "predict")?;
            let observation = required_observation(request.observation, "predict")?;
            Ok(Response::Scores(service.predict(id, &observation).await?))
        }

        other => Err(LearnerError::Validation(format!(
            "{} is an unsupported action. Supported actions: {:?}",
            other, SUPPORTED_ACTIONS
        ))),
    }
}

fn required_id(id: Option<LearnerId>, action: &str) -> Result<LearnerId> {
    id.ok_or_else(|| LearnerError::Validation(format!("{} requires learnerId", action)))
}

fn required_observation(
    observation: Option<serde_json::Value>,
    action: &str,
) -> Result<serde_json::Value> {
    observation.ok_or_else(|| LearnerError::Validation(format!("{} requires observation", action)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::create_in_memory_store;
    use serde_json::json;

    fn service() -> LearnerService {
        LearnerService::new(create_in_memory_store())
    }

    fn request(value: serde_json::Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_register_then_observe_then_predict() {
        let service = service();

        let response = dispatch(&service, request(json!({"action": "register"})))
            .await
            .unwrap();
        assert_eq!(response, Response::Registered(0));

        let response = dispatch(
            &service,
            request(json!({
                "action": "observe",
                "learnerId": 0,
                "observation": {"classLabel": "a", "measurement": {"x": 1.0}}
            })),
        )
        .await
        .unwrap();
        let Response::Scores(scores) = response else {
            panic!("expected scores");
        };
        assert_eq!(scores["a"], 0.0);

        let response = dispatch(
            &service,
            request(json!({
                "action": "predict",
                "learnerId": 0,
                "observation": {"measurement": {"x": 3.0}}
            })),
        )
        .await
        .unwrap();
        let Response::Scores(scores) = response else {
            panic!("expected scores");
        };
        assert_eq!(scores["a"], 2.0);
    }

    #[tokio::test]
    async fn test_absent_action_lists_ids() {
        let service = service();
        dispatch(&service, request(json!({"action": "register"})))
            .await
            .unwrap();

        let response = dispatch(&service, Request::default()).await.unwrap();
        assert_eq!(response, Response::Ids(vec![0]));
    }

    #[tokio::test]
    async fn test_unsupported_action() {
        let service = service();
        let err = dispatch(&service, request(json!({"action": "destroy"})))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("destroy"));
        assert!(err.to_string().contains("register"));
    }

    #[tokio::test]
    async fn test_observe_requires_learner_id_and_observation() {
        let service = service();

        let err = dispatch(
            &service,
            request(json!({
                "action": "observe",
                "observation": {"measurement": {"x": 1.0}}
            })),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("learnerId"));

        let err = dispatch(
            &service,
            request(json!({"action": "observe", "learnerId": 0})),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("observation"));
    }

    #[tokio::test]
    async fn test_register_with_options() {
        let service = service();
        let response = dispatch(
            &service,
            request(json!({
                "action": "register",
                "predictor": "neural_network",
                "observations": [
                    {"classLabel": "a", "measurement": {"x": 1.0}},
                    {"measurement": {"x": 2.0}}
                ]
            })),
        )
        .await
        .unwrap();

        assert_eq!(response, Response::Registered(0));
        let learner = service.store().load(0).await.unwrap();
        assert_eq!(learner.predictor(), PredictorKind::NeuralNetwork);
        assert_eq!(learner.observation_count(), 2);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_seed() {
        let service = service();
        let err = dispatch(
            &service,
            request(json!({
                "action": "register",
                "observations": [{"measurement": {"x": "bad"}}]
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(service.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extra_request_fields_ignored() {
        let service = service();
        let response = dispatch(
            &service,
            request(json!({"action": "register", "verbose": true})),
        )
        .await
        .unwrap();
        assert_eq!(response, Response::Registered(0));
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            serde_json::to_value(Response::Registered(3)).unwrap(),
            json!(3)
        );
        assert_eq!(
            serde_json::to_value(Response::Ids(vec![0, 1])).unwrap(),
            json!([0, 1])
        );
    }
}
