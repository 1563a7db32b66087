//! Shared helpers for integration tests

use online_learner::{Learner, Observation};

/// Build a validated observation from label and (feature, value) pairs
pub fn observation(label: Option<&str>, pairs: &[(&str, f64)]) -> Observation {
    Observation::new(
        label.map(|l| l.to_string()),
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    )
    .unwrap()
}

/// A learner pre-seeded with one labeled observation per pair
pub fn seeded_learner(pairs: &[(&str, f64)]) -> Learner {
    let observations = pairs
        .iter()
        .map(|(label, value)| observation(Some(label), &[("x", *value)]))
        .collect();
    Learner::new().with_observations(observations)
}
