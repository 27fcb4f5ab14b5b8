//! Directional signal pipeline.
//!
//! Raw observations flow through indicator calculation, candlestick and
//! pullback analysis, and feature extraction into a weighted scoring
//! engine. A scored candidate is released only if every validation gate
//! passes. The training simulator replays history through the same path
//! and nudges the weight table.

pub mod features;
pub mod generator;
pub mod indicators;
pub mod patterns;
pub mod pullback;
pub mod scoring;
pub mod store;
pub mod training;
pub mod validator;

pub use features::{extract_features, market_context, return_volatility};
pub use generator::{generate_signal, generate_signal_at};
pub use indicators::{compute_indicators, Indicator};
pub use patterns::{classify_candle, recent_patterns};
pub use pullback::{analyze_pullbacks, classify_trend, find_extrema, identify_pullbacks};
pub use scoring::{confidence, predict, score};
pub use store::SignalStore;
pub use training::{adjust_weights, build_samples, train, Sample};
pub use validator::validate;
