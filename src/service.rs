use crate::error::Result;
use crate::learner::Learner;
use crate::models::Observation;
use crate::predictor::{PredictorKind, Scores};
use crate::registry::{LearnerId, LearnerStore};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Options for registering a new learner
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Strategy to bind; nearest-neighbor when absent
    pub predictor: Option<PredictorKind>,

    /// Validated past observations to seed the history with
    pub observations: Option<Vec<Observation>>,
}

/// Service façade over a learner store: register / observe / predict /
/// list.
///
/// `observe` calls against one learner id run under a per-id lock so a
/// history is never appended from two calls concurrently; operations on
/// different ids proceed in parallel. `predict` reads a snapshot and
/// needs no lock.
pub struct LearnerService {
    store: Arc<dyn LearnerStore>,
    locks: DashMap<LearnerId, Arc<Mutex<()>>>,
}

impl LearnerService {
    pub fn new(store: Arc<dyn LearnerStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Get a reference to the learner store
    pub fn store(&self) -> &Arc<dyn LearnerStore> {
        &self.store
    }

    /// Create a learner and store it under a freshly allocated id
    pub async fn register(&self, options: RegisterOptions) -> Result<LearnerId> {
        let mut learner = match options.predictor {
            Some(kind) => Learner::with_predictor(kind),
            None => Learner::new(),
        };
        if let Some(observations) = options.observations {
            learner = learner.with_observations(observations);
        }

        let id = self.store.allocate_id().await?;
        self.store.save(id, &learner).await?;

        tracing::info!(
            learner_id = id,
            predictor = %learner.predictor(),
            seeded = learner.observation_count(),
            "Learner registered"
        );
        Ok(id)
    }

    /// Record an observation against a learner and return its scores.
    /// Persisted only when the whole observe succeeds.
    pub async fn observe(&self, id: LearnerId, observation: &serde_json::Value) -> Result<Scores> {
        let observation = Observation::from_value(observation)?;

        let result = self.observe_locked(id, observation).await;
        self.release_id_lock(id);
        result
    }

    async fn observe_locked(&self, id: LearnerId, observation: Observation) -> Result<Scores> {
        let lock = self.id_lock(id);
        let _guard = lock.lock().await;

        let mut learner = self.store.load(id).await?;
        let scores = learner.observe(observation)?;
        self.store.save(id, &learner).await?;

        tracing::debug!(
            learner_id = id,
            observations = learner.observation_count(),
            "Observation recorded"
        );
        Ok(scores)
    }

    /// Score an observation against a learner without recording it
    pub async fn predict(&self, id: LearnerId, observation: &serde_json::Value) -> Result<Scores> {
        let observation = Observation::from_value(observation)?;
        let learner = self.store.load(id).await?;
        learner.predict(&observation)
    }

    /// List every registered learner id
    pub async fn list_ids(&self) -> Result<Vec<LearnerId>> {
        self.store.list_ids().await
    }

    fn id_lock(&self, id: LearnerId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry once no in-flight observe holds it, keeping the
    /// map bounded by concurrent callers rather than by ids ever seen. The
    /// predicate runs under the shard lock, so a concurrent `id_lock` cannot
    /// clone the Arc between the count check and the removal.
    fn release_id_lock(&self, id: LearnerId) {
        self.locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_LABEL;
    use crate::registry::create_in_memory_store;
    use serde_json::json;

    fn service() -> LearnerService {
        LearnerService::new(create_in_memory_store())
    }

    #[tokio::test]
    async fn test_register_defaults_to_nearest_neighbor() {
        let service = service();
        let id = service.register(RegisterOptions::default()).await.unwrap();

        let learner = service.store().load(id).await.unwrap();
        assert_eq!(learner.predictor(), PredictorKind::NearestNeighbor);
        assert_eq!(learner.observation_count(), 0);
    }

    #[tokio::test]
    async fn test_register_with_predictor_and_seed() {
        let service = service();
        let seed = vec![Observation::from_value(&json!({
            "classLabel": "a",
            "measurement": {"x": 1.0}
        }))
        .unwrap()];

        let id = service
            .register(RegisterOptions {
                predictor: Some(PredictorKind::NeuralNetwork),
                observations: Some(seed),
            })
            .await
            .unwrap();

        let learner = service.store().load(id).await.unwrap();
        assert_eq!(learner.predictor(), PredictorKind::NeuralNetwork);
        assert_eq!(learner.observation_count(), 1);
    }

    #[tokio::test]
    async fn test_observe_persists_and_scores() {
        let service = service();
        let id = service.register(RegisterOptions::default()).await.unwrap();

        let scores = service
            .observe(id, &json!({"classLabel": "a", "measurement": {"x": 1.0}}))
            .await
            .unwrap();

        assert_eq!(scores["a"], 0.0);
        assert_eq!(service.store().load(id).await.unwrap().observation_count(), 1);
    }

    #[tokio::test]
    async fn test_observe_validation_failure_appends_nothing() {
        let service = service();
        let id = service.register(RegisterOptions::default()).await.unwrap();

        let err = service
            .observe(id, &json!({"measurement": {"a": "not-a-number"}}))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(service.store().load(id).await.unwrap().observation_count(), 0);
    }

    #[tokio::test]
    async fn test_predict_does_not_persist() {
        let service = service();
        let id = service.register(RegisterOptions::default()).await.unwrap();
        service
            .observe(id, &json!({"classLabel": "a", "measurement": {"x": 0.0}}))
            .await
            .unwrap();

        let scores = service
            .predict(id, &json!({"measurement": {"x": 1.0}}))
            .await
            .unwrap();

        assert_eq!(scores["a"], 1.0);
        assert_eq!(scores[UNKNOWN_LABEL], f64::MAX);
        assert_eq!(service.store().load(id).await.unwrap().observation_count(), 1);
    }

    #[tokio::test]
    async fn test_observe_releases_id_lock() {
        let service = service();
        let id = service.register(RegisterOptions::default()).await.unwrap();

        service
            .observe(id, &json!({"classLabel": "a", "measurement": {"x": 1.0}}))
            .await
            .unwrap();
        assert!(service.locks.is_empty());

        // Error paths inside the locked section release the entry too
        service
            .observe(99, &json!({"classLabel": "a", "measurement": {"x": 1.0}}))
            .await
            .unwrap_err();
        assert!(service.locks.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_learner_id() {
        let service = service();
        let err = service
            .predict(99, &json!({"measurement": {"x": 1.0}}))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_ids() {
        let service = service();
        assert!(service.list_ids().await.unwrap().is_empty());

        let first = service.register(RegisterOptions::default()).await.unwrap();
        let second = service.register(RegisterOptions::default()).await.unwrap();
        assert_eq!(service.list_ids().await.unwrap(), vec![first, second]);
    }
}
