//! Trained-model loading port.

use crate::domain::error::TradelabError;
use crate::domain::signal::LogisticModel;

pub trait ModelPort {
    fn load_classifier(&self) -> Result<LogisticModel, TradelabError>;
}
