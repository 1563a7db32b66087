pub mod observation;

pub use observation::{Observation, UNKNOWN_LABEL};
