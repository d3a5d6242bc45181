//! Core domain types and logic.

pub mod ohlcv;
pub mod bar_series;
pub mod indicator;
pub mod features;
pub mod labels;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
