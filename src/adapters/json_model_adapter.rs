//! JSON model adapter.
//!
//! Reads a serialized `LogisticModel`:
//! `{"features": ["rsi", ...], "weights": [...], "intercept": 0.0}`.

use crate::domain::error::TradelabError;
use crate::domain::signal::LogisticModel;
use crate::ports::model_port::ModelPort;
use std::fs;
use std::path::PathBuf;

pub struct JsonModelAdapter {
    path: PathBuf,
}

impl JsonModelAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ModelPort for JsonModelAdapter {
    fn load_classifier(&self) -> Result<LogisticModel, TradelabError> {
        let model_err = |reason: String| TradelabError::Model { reason };
        let content = fs::read_to_string(&self.path)
            .map_err(|e| model_err(format!("failed to read {}: {}", self.path.display(), e)))?;
        let model: LogisticModel = serde_json::from_str(&content)
            .map_err(|e| model_err(format!("{}: {}", self.path.display(), e)))?;
        model.check().map_err(model_err)?;
        log::info!(
            "loaded logistic model with {} features from {}",
            model.features.len(),
            self.path.display()
        );
        Ok(model)
    }
}
