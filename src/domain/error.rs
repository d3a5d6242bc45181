//! Domain error types.

use chrono::{DateTime, Duration, Utc};

/// Structural timeline violation in a bar series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderingError {
    #[error("bar {index} at {current} precedes previous bar at {previous}")]
    Unordered {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("bar {index} duplicates timestamp {timestamp}")]
    Duplicate {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("gap of {gap} before bar {index} exceeds allowed {max_gap}")]
    Gap {
        index: usize,
        gap: Duration,
        max_gap: Duration,
    },
}

/// Top-level error type for tradelab.
#[derive(Debug, thiserror::Error)]
pub enum TradelabError {
    #[error("ordering error: {0}")]
    Ordering(#[from] OrderingError),

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("insufficient warm-up: have {bars} bars, need {required}")]
    InsufficientWarmup { bars: usize, required: usize },

    #[error("feature frame does not match bar series: {reason}")]
    FrameMismatch { reason: String },

    #[error("signal source failed at {timestamp}: {reason}")]
    SignalSource {
        timestamp: DateTime<Utc>,
        reason: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradelabError> for std::process::ExitCode {
    fn from(err: &TradelabError) -> Self {
        let code: u8 = match err {
            TradelabError::Io(_) => 1,
            TradelabError::ConfigParse { .. } | TradelabError::ConfigInvalid { .. } => 2,
            TradelabError::Data { .. } => 3,
            TradelabError::Model { .. } => 4,
            TradelabError::Ordering(_)
            | TradelabError::InvalidBar { .. }
            | TradelabError::InsufficientWarmup { .. }
            | TradelabError::FrameMismatch { .. } => 5,
            TradelabError::SignalSource { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
