use crate::error::{LearnerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

/// Reserved class label for observations supplied without one.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// A single data point: a numeric measurement vector plus an optional
/// class label.
///
/// Immutable once constructed; a [`Learner`](crate::learner::Learner)
/// only ever appends new observations. The measurement is kept as a
/// `BTreeMap` so any projection into a fixed-order numeric vector is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    /// Class label; `None` means unlabeled. Scoring substitutes the
    /// reserved `UNKNOWN` label for unlabeled observations.
    #[serde(rename = "classLabel", default)]
    class_label: Option<String>,

    /// Feature name to numeric value
    #[validate(custom(function = validate_measurement))]
    measurement: BTreeMap<String, f64>,
}

impl Observation {
    /// Create a validated observation. An empty label is normalized to
    /// `None`; non-finite measurement values are rejected.
    pub fn new(class_label: Option<String>, measurement: BTreeMap<String, f64>) -> Result<Self> {
        let observation = Self {
            class_label: class_label.filter(|label| !label.is_empty()),
            measurement,
        };
        observation.validate()?;
        Ok(observation)
    }

    /// Build a validated observation from a raw JSON value, reporting
    /// which field failed.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            LearnerError::Validation(format!("observation must be an object, got: {}", value))
        })?;

        for key in object.keys() {
            if key != "classLabel" && key != "measurement" {
                return Err(LearnerError::Validation(format!(
                    "unknown observation field: {}",
                    key
                )));
            }
        }

        let class_label = match object.get("classLabel") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(label)) => Some(label.clone()),
            Some(other) => {
                return Err(LearnerError::Validation(format!(
                    "classLabel must be a string, got: {}",
                    other
                )))
            }
        };

        let raw_measurement = object
            .get("measurement")
            .ok_or_else(|| LearnerError::Validation("observation is missing measurement".to_string()))?
            .as_object()
            .ok_or_else(|| {
                LearnerError::Validation("measurement must be an object of numeric values".to_string())
            })?;

        let mut measurement = BTreeMap::new();
        for (feature, raw) in raw_measurement {
            let number = raw.as_f64().ok_or_else(|| {
                LearnerError::Validation(format!(
                    "measurement value for {} must be a number, got: {}",
                    feature, raw
                ))
            })?;
            measurement.insert(feature.clone(), number);
        }

        Self::new(class_label, measurement)
    }

    /// Class label if present
    pub fn class_label(&self) -> Option<&str> {
        self.class_label.as_deref()
    }

    /// Class label with unlabeled observations normalized to `UNKNOWN`
    pub fn label_or_unknown(&self) -> &str {
        self.class_label.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// Measurement vector, keyed by feature name
    pub fn measurement(&self) -> &BTreeMap<String, f64> {
        &self.measurement
    }
}

fn validate_measurement(measurement: &BTreeMap<String, f64>) -> std::result::Result<(), ValidationError> {
    for value in measurement.values() {
        if !value.is_finite() {
            return Err(ValidationError::new("measurement values must be finite"));
        }
    }
    Ok(())
}
