//! Directional signal sources.
//!
//! The simulator only ever calls [`SignalSource::predict`]; whether the
//! probability comes from a trained classifier or a fixture is invisible to it.

use crate::domain::error::TradelabError;
use crate::domain::features::FeatureRow;
use crate::domain::ohlcv::Timestamp;
use std::collections::HashMap;

/// Probability that the next move is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    probability_up: f64,
}

impl Signal {
    pub fn new(probability_up: f64) -> Result<Self, String> {
        if probability_up.is_nan() {
            return Err("probability is NaN".into());
        }
        if !(0.0..=1.0).contains(&probability_up) {
            return Err(format!("probability {probability_up} outside [0, 1]"));
        }
        Ok(Self { probability_up })
    }

    pub fn probability_up(&self) -> f64 {
        self.probability_up
    }

    pub fn probability_down(&self) -> f64 {
        1.0 - self.probability_up
    }
}

pub trait SignalSource {
    fn predict(&mut self, row: &FeatureRow) -> Result<Signal, TradelabError>;
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn predict(&mut self, row: &FeatureRow) -> Result<Signal, TradelabError> {
        (**self).predict(row)
    }
}

fn signal_at(row: &FeatureRow, probability_up: f64) -> Result<Signal, TradelabError> {
    Signal::new(probability_up).map_err(|reason| TradelabError::SignalSource {
        timestamp: row.timestamp,
        reason,
    })
}

/// A trained binary classifier over an ordered feature vector.
pub trait Classifier {
    fn feature_names(&self) -> &[String];
    fn predict_proba(&self, features: &[f64]) -> Result<f64, String>;
}

/// Logistic regression: sigmoid(intercept + Σ wᵢ·xᵢ).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogisticModel {
    pub features: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn new(features: Vec<String>, weights: Vec<f64>, intercept: f64) -> Result<Self, String> {
        let model = Self {
            features,
            weights,
            intercept,
        };
        model.check()?;
        Ok(model)
    }

    pub fn check(&self) -> Result<(), String> {
        if self.features.len() != self.weights.len() {
            return Err(format!(
                "{} features but {} weights",
                self.features.len(),
                self.weights.len()
            ));
        }
        Ok(())
    }
}

impl Classifier for LogisticModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, String> {
        if features.len() != self.weights.len() {
            return Err(format!(
                "expected {} features, got {}",
                self.weights.len(),
                features.len()
            ));
        }
        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Signal backed by a trained classifier.
pub struct ModelSignal<C> {
    classifier: C,
}

impl<C: Classifier> ModelSignal<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }
}

impl<C: Classifier> SignalSource for ModelSignal<C> {
    fn predict(&mut self, row: &FeatureRow) -> Result<Signal, TradelabError> {
        let features = row
            .vector(self.classifier.feature_names())
            .map_err(|name| TradelabError::SignalSource {
                timestamp: row.timestamp,
                reason: format!("feature '{name}' missing from row"),
            })?;
        let p = self
            .classifier
            .predict_proba(&features)
            .map_err(|reason| TradelabError::SignalSource {
                timestamp: row.timestamp,
                reason,
            })?;
        signal_at(row, p)
    }
}

/// Same probability for every row.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSignal {
    pub probability_up: f64,
}

impl ConstantSignal {
    pub fn new(probability_up: f64) -> Self {
        Self { probability_up }
    }
}

impl SignalSource for ConstantSignal {
    fn predict(&mut self, row: &FeatureRow) -> Result<Signal, TradelabError> {
        signal_at(row, self.probability_up)
    }
}

/// Flips between `high` and `low` on every call, starting with `high`.
#[derive(Debug, Clone)]
pub struct AlternatingSignal {
    high: f64,
    low: f64,
    next_high: bool,
}

impl AlternatingSignal {
    pub fn new(high: f64, low: f64) -> Self {
        Self {
            high,
            low,
            next_high: true,
        }
    }
}

impl SignalSource for AlternatingSignal {
    fn predict(&mut self, row: &FeatureRow) -> Result<Signal, TradelabError> {
        let p = if self.next_high { self.high } else { self.low };
        self.next_high = !self.next_high;
        signal_at(row, p)
    }
}

/// Per-timestamp fixture with a fallback probability.
#[derive(Debug, Clone)]
pub struct TableSignal {
    table: HashMap<Timestamp, f64>,
    default: f64,
}

impl TableSignal {
    pub fn new(default: f64) -> Self {
        Self {
            table: HashMap::new(),
            default,
        }
    }

    pub fn with(mut self, timestamp: Timestamp, probability_up: f64) -> Self {
        self.table.insert(timestamp, probability_up);
        self
    }
}

impl SignalSource for TableSignal {
    fn predict(&mut self, row: &FeatureRow) -> Result<Signal, TradelabError> {
        let p = self.table.get(&row.timestamp).copied().unwrap_or(self.default);
        signal_at(row, p)
    }
}
