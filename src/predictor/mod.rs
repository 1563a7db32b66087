pub mod nearest_neighbor;
pub mod neural_network;

pub use nearest_neighbor::NearestNeighborPredictor;
pub use neural_network::{NeuralNetworkPredictor, TrainerParams};

use crate::error::Result;
use crate::models::Observation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Per-class scores for a single prediction.
///
/// The polarity depends on the strategy that produced the map: the
/// nearest-neighbor predictor reports distances (lower = more likely),
/// the network predictor reports raw output activations (higher = more
/// likely). Scores are never comparable across predictor kinds.
pub type Scores = BTreeMap<String, f64>;

/// Scoring strategy: given a new observation and the history of past
/// observations, produce per-class scores.
pub trait Predictor: Send + Sync {
    fn score(&self, new: &Observation, past: &[Observation]) -> Result<Scores>;
}

/// Serializable tag selecting the predictor strategy bound to a
/// learner. Fixed at registration time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictorKind {
    #[default]
    NearestNeighbor,
    NeuralNetwork,
}

impl PredictorKind {
    /// Instantiate the strategy this tag names.
    pub fn predictor(&self) -> Box<dyn Predictor> {
        match self {
            PredictorKind::NearestNeighbor => Box::new(NearestNeighborPredictor),
            PredictorKind::NeuralNetwork => Box::new(NeuralNetworkPredictor::default()),
        }
    }
}
