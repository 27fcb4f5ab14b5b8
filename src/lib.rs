//! Retrace - pullback-aware directional signal engine

pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use config::{IndicatorConfig, SignalConfig, TrainingConfig};
pub use error::{Result, SignalError};
pub use services::signals::{
    analyze_pullbacks, compute_indicators, extract_features, generate_signal, generate_signal_at,
    predict, score, train, validate,
};
pub use services::SignalStore;
pub use types::*;
