use crate::error::Result;
use crate::models::Observation;
use crate::predictor::{PredictorKind, Scores};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stateful accumulator of observations bound to one predictor
/// strategy.
///
/// The observation history is append-only and per-instance; accessors
/// return copies so callers can never mutate it out-of-band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    observations: Vec<Observation>,
    predictor: PredictorKind,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Learner {
    /// Create a learner bound to the default nearest-neighbor strategy
    pub fn new() -> Self {
        Self::with_predictor(PredictorKind::default())
    }

    /// Create a learner bound to the given strategy
    pub fn with_predictor(predictor: PredictorKind) -> Self {
        let now = Utc::now();
        Self {
            observations: Vec::new(),
            predictor,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed the history with validated past observations
    pub fn with_observations(mut self, observations: Vec<Observation>) -> Self {
        self.observations = observations;
        self
    }

    /// Record an observation and return scores for it against the
    /// now-updated history. The new observation scores against itself
    /// too, so its own class always gets a zero-distance match under
    /// the nearest-neighbor strategy.
    ///
    /// On predictor failure nothing is appended.
    pub fn observe(&mut self, observation: Observation) -> Result<Scores> {
        self.observations.push(observation);
        let new = &self.observations[self.observations.len() - 1];

        match self.predictor.predictor().score(new, &self.observations) {
            Ok(scores) => {
                self.updated_at = Utc::now();
                Ok(scores)
            }
            Err(err) => {
                self.observations.pop();
                Err(err)
            }
        }
    }

    /// Score an observation against the current history without
    /// recording it. The query's label, if any, is ignored for scoring.
    pub fn predict(&self, observation: &Observation) -> Result<Scores> {
        self.predictor.predictor().score(observation, &self.observations)
    }

    /// Defensive copy of the observation history
    pub fn observations(&self) -> Vec<Observation> {
        self.observations.clone()
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    pub fn predictor(&self) -> PredictorKind {
        self.predictor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Default for Learner {
    fn default() -> Self {
        Self::new()
    }
}
