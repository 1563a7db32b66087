use crate::error::Result;
use crate::models::{Observation, UNKNOWN_LABEL};
use crate::predictor::{Predictor, Scores};
use std::collections::BTreeMap;

/// Distance-based scoring: each class is assigned the minimum Euclidean
/// distance between the new observation and any past observation of
/// that class. Lower = more similar.
///
/// This is an intentionally simple algorithm. Better algorithms might
/// consider additional factors such as how many observations have been
/// made per class, and how much variance exists between those
/// observations.
///
/// `UNKNOWN` is always present in the result; its `f64::MAX` seed
/// survives when no unlabeled data has been supplied. The same sentinel
/// marks a class whose every past observation was incomparable with the
/// query (see [`distance`]).
pub struct NearestNeighborPredictor;

impl Predictor for NearestNeighborPredictor {
    fn score(&self, new: &Observation, past: &[Observation]) -> Result<Scores> {
        let mut scores = Scores::new();
        scores.insert(UNKNOWN_LABEL.to_string(), f64::MAX);

        for observation in past {
            let label = observation.label_or_unknown();
            let entry = scores.entry(label.to_string()).or_insert(f64::MAX);

            if let Some(d) = distance(new.measurement(), observation.measurement()) {
                if d < *entry {
                    *entry = d;
                }
            }
        }

        Ok(scores)
    }
}

/// Euclidean distance projected onto the query's feature names.
///
/// Returns `None` when the past observation lacks a feature the query
/// has: the pair is incomparable and is skipped rather than scored with
/// a made-up fill value. Features only the past observation has fall
/// outside the projection and are ignored.
fn distance(query: &BTreeMap<String, f64>, past: &BTreeMap<String, f64>) -> Option<f64> {
    let mut sum = 0.0;
    for (feature, value) in query {
        let other = past.get(feature)?;
        sum += (value - other) * (value - other);
    }
    Some(sum.sqrt())
}
