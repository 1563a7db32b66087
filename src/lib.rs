//! Incremental, in-process online classifier.
//!
//! Register a learner, feed it labeled or unlabeled observations, and
//! ask for per-class likelihood scores for new observations. Scoring is
//! delegated to a pluggable predictor strategy chosen at registration
//! time: nearest-neighbor distances (lower = more likely) or a small
//! trainable network retrained from scratch per prediction (higher =
//! more likely). Learners are addressed by monotonically allocated ids
//! through an in-memory or sled-backed registry.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod learner;
pub mod models;
pub mod predictor;
pub mod registry;
pub mod service;

pub use error::{LearnerError, Result};
pub use learner::Learner;
pub use models::{Observation, UNKNOWN_LABEL};
pub use predictor::{Predictor, PredictorKind, Scores};
pub use registry::{LearnerId, LearnerStore};
pub use service::{LearnerService, RegisterOptions};
