use crate::error::{LearnerError, Result};
use crate::models::{Observation, UNKNOWN_LABEL};
use crate::predictor::{Predictor, Scores};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;

/// Hyperparameters for the per-call training pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerParams {
    pub learning_rate: f64,
    pub l1_decay: f64,
    pub l2_decay: f64,
    pub momentum: f64,
    /// Seed for weight initialization; a fixed seed makes every score
    /// call a pure function of (params, history, query).
    pub seed: u64,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            l1_decay: 0.001,
            l2_decay: 0.001,
            momentum: 0.9,
            seed: 42,
        }
    }
}

/// Trainable-network scoring: a small feed-forward classifier is built
/// and trained from scratch inside every call, one SGD step per past
/// observation in insertion order, then run once on the query. Scores
/// are raw output activations: higher = more likely.
///
/// No model state survives between calls; the predictor stays stateless
/// at the trait boundary at the cost of retraining per prediction.
#[derive(Debug, Default)]
pub struct NeuralNetworkPredictor {
    params: TrainerParams,
}

impl NeuralNetworkPredictor {
    pub fn with_params(params: TrainerParams) -> Self {
        Self { params }
    }
}

impl Predictor for NeuralNetworkPredictor {
    fn score(&self, new: &Observation, past: &[Observation]) -> Result<Scores> {
        if past.is_empty() {
            // Nothing to train on; neutral score for the sentinel class
            // instead of sampling an untrained net.
            let mut scores = Scores::new();
            scores.insert(UNKNOWN_LABEL.to_string(), 0.0);
            return Ok(scores);
        }

        let classes = class_labels(past);
        let features: Vec<&str> = new.measurement().keys().map(|k| k.as_str()).collect();

        let mut net = Network::new(features.len(), classes.len(), self.params.seed);

        for observation in past {
            let x = project(observation.measurement(), &features);
            let label = observation.label_or_unknown();
            let target = classes.iter().position(|c| c == label).ok_or_else(|| {
                LearnerError::Predictor(format!("class {} missing from training map", label))
            })?;
            net.train_step(&x, target, &self.params);
        }

        let output = net.forward(&project(new.measurement(), &features));

        Ok(classes
            .into_iter()
            .enumerate()
            .map(|(index, class)| (class, output[index]))
            .collect())
    }
}

/// Distinct class labels in first-seen order, with `UNKNOWN` appended
/// when absent so index 0 always has a companion class to margin
/// against.
fn class_labels(past: &[Observation]) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for observation in past {
        let label = observation.label_or_unknown();
        if !classes.iter().any(|c| c == label) {
            classes.push(label.to_string());
        }
    }
    if !classes.iter().any(|c| c == UNKNOWN_LABEL) {
        classes.push(UNKNOWN_LABEL.to_string());
    }
    classes
}

/// Project a measurement onto the query's feature order: missing
/// features are zero-filled, features outside the order are dropped.
fn project(measurement: &BTreeMap<String, f64>, features: &[&str]) -> Array1<f64> {
    Array1::from_iter(
        features
            .iter()
            .map(|feature| measurement.get(*feature).copied().unwrap_or(0.0)),
    )
}

/// One input layer, one hidden ReLU layer of width
/// `floor((inputs + classes) / 2)`, one linear output per class trained
/// with a one-vs-all hinge update.
struct Network {
    hidden: DenseLayer,
    output: DenseLayer,
}

impl Network {
    fn new(inputs: usize, classes: usize, seed: u64) -> Self {
        let hidden_width = (inputs + classes) / 2;
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            hidden: DenseLayer::new(inputs, hidden_width, &mut rng),
            output: DenseLayer::new(hidden_width, classes, &mut rng),
        }
    }

    fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        let hidden = self.hidden.forward(x).mapv(|v| v.max(0.0));
        self.output.forward(&hidden)
    }

    /// Single-example SGD step: forward, hinge gradient on the output,
    /// backprop through the linear and ReLU layers, parameter update.
    fn train_step(&mut self, x: &Array1<f64>, target: usize, params: &TrainerParams) {
        let hidden = self.hidden.forward(x).mapv(|v| v.max(0.0));
        let output = self.output.forward(&hidden);

        // Hinge gradient, margin 1: every class scoring within the
        // margin of the target pushes itself down and the target up.
        let mut d_output = Array1::<f64>::zeros(output.len());
        let target_score = output[target];
        for index in 0..output.len() {
            if index == target {
                continue;
            }
            if output[index] - target_score + 1.0 > 0.0 {
                d_output[index] += 1.0;
                d_output[target] -= 1.0;
            }
        }

        let grad_output_weights = outer(&d_output, &hidden);
        let mut d_hidden = self.output.weights.t().dot(&d_output);
        // ReLU gate
        for (grad, activation) in d_hidden.iter_mut().zip(hidden.iter()) {
            if *activation <= 0.0 {
                *grad = 0.0;
            }
        }
        let grad_hidden_weights = outer(&d_hidden, x);

        self.output.apply(&grad_output_weights, &d_output, params);
        self.hidden.apply(&grad_hidden_weights, &d_hidden, params);
    }
}

struct DenseLayer {
    /// (outputs, inputs)
    weights: Array2<f64>,
    bias: Array1<f64>,
    weight_velocity: Array2<f64>,
    bias_velocity: Array1<f64>,
}

impl DenseLayer {
    /// Gaussian init scaled by sqrt(1 / fan_in); biases start at zero.
    fn new(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        let scale = if inputs > 0 {
            (1.0 / inputs as f64).sqrt()
        } else {
            0.0
        };
        let weights = Array2::from_shape_fn((outputs, inputs), |_| {
            let sample: f64 = StandardNormal.sample(rng);
            scale * sample
        });

        Self {
            weights,
            bias: Array1::zeros(outputs),
            weight_velocity: Array2::zeros((outputs, inputs)),
            bias_velocity: Array1::zeros(outputs),
        }
    }

    fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(x) + &self.bias
    }

    /// Momentum SGD update. L1/L2 decay applies to weights only, never
    /// biases.
    fn apply(&mut self, grad_weights: &Array2<f64>, grad_bias: &Array1<f64>, params: &TrainerParams) {
        for ((weight, velocity), grad) in self
            .weights
            .iter_mut()
            .zip(self.weight_velocity.iter_mut())
            .zip(grad_weights.iter())
        {
            let decay = params.l2_decay * *weight + params.l1_decay * weight.signum();
            let step = params.momentum * *velocity - params.learning_rate * (grad + decay);
            *velocity = step;
            *weight += step;
        }

        for ((bias, velocity), grad) in self
            .bias
            .iter_mut()
            .zip(self.bias_velocity.iter_mut())
            .zip(grad_bias.iter())
        {
            let step = params.momentum * *velocity - params.learning_rate * grad;
            *velocity = step;
            *bias += step;
        }
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
