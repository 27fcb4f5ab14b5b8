//! Signal store: shared weights, per-instrument fan-out and latest signals.

use crate::config::{SignalConfig, TrainingConfig};
use crate::error::{Result, SignalError};
use crate::services::signals::generator::generate_signal_at;
use crate::services::signals::training::train;
use crate::types::{Observation, Signal, SignalOutcome, TrainingOutcome, WeightTable};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Store for generating signals against a shared weight table.
///
/// Scoring reads an `Arc` snapshot of the weights; training builds a new
/// table and swaps it in, so a reader never sees a partial update.
pub struct SignalStore {
    config: Arc<SignalConfig>,
    training_config: TrainingConfig,
    weights: RwLock<Arc<WeightTable>>,
    /// Held for the whole of a training run.
    training: Mutex<()>,
    /// Latest released signal per instrument.
    latest: DashMap<String, Signal>,
}

impl SignalStore {
    /// Create a new signal store.
    pub fn new(
        config: SignalConfig,
        training_config: TrainingConfig,
        weights: WeightTable,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            training_config,
            weights: RwLock::new(Arc::new(weights)),
            training: Mutex::new(()),
            latest: DashMap::new(),
        })
    }

    /// Current weight snapshot.
    pub async fn weights(&self) -> Arc<WeightTable> {
        self.weights.read().await.clone()
    }

    /// Replace the weights, e.g. with a table restored from storage.
    pub async fn set_weights(&self, weights: WeightTable) {
        *self.weights.write().await = Arc::new(weights);
        debug!("Weight table replaced");
    }

    fn remember(&self, instrument: &str, outcome: &SignalOutcome) {
        if let Some(signal) = outcome.signal() {
            self.latest.insert(instrument.to_uppercase(), signal.clone());
        }
    }

    /// Generate a signal for one instrument.
    pub async fn generate(&self, instrument: &str, window: &[Observation]) -> SignalOutcome {
        let weights = self.weights().await;
        let outcome =
            generate_signal_at(instrument, window, &weights, &self.config, None, Utc::now());
        self.remember(instrument, &outcome);
        outcome
    }

    /// Generate signals for many instruments on blocking worker threads.
    ///
    /// Every instrument is scored against the same weight snapshot. Results
    /// are sorted by instrument.
    pub async fn generate_many(
        &self,
        windows: HashMap<String, Vec<Observation>>,
    ) -> Vec<(String, SignalOutcome)> {
        let weights = self.weights().await;
        let now = Utc::now();
        let mut tasks = JoinSet::new();

        for (instrument, window) in windows {
            let weights = weights.clone();
            let config = self.config.clone();
            tasks.spawn_blocking(move || {
                let outcome =
                    generate_signal_at(&instrument, &window, &weights, &config, None, now);
                (instrument, outcome)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((instrument, outcome)) => {
                    self.remember(&instrument, &outcome);
                    results.push((instrument, outcome));
                }
                Err(e) => warn!("Signal worker failed: {}", e),
            }
        }

        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Run a training pass and swap in the resulting weights.
    ///
    /// Runs are serialised; a second caller waits for the first to finish.
    pub async fn train(
        &self,
        history: HashMap<String, Vec<Observation>>,
    ) -> Result<TrainingOutcome> {
        let _guard = self.training.lock().await;
        let weights = self.weights().await;
        let config = self.config.clone();
        let training_config = self.training_config.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            train(&history, &weights, &config, &training_config)
        })
        .await
        .map_err(|e| SignalError::Internal(format!("training task failed: {}", e)))?;

        if let TrainingOutcome::Completed(report) = &outcome {
            *self.weights.write().await = Arc::new(report.weights);
            info!(
                "Swapped in trained weights ({:?}, {:.2}% accuracy)",
                report.adjustment,
                report.accuracy * 100.0
            );
        }

        Ok(outcome)
    }

    /// Latest released signal for an instrument.
    pub fn latest_signal(&self, instrument: &str) -> Option<Signal> {
        self.latest.get(&instrument.to_uppercase()).map(|e| e.clone())
    }

    /// Latest released signal for every instrument, newest first.
    pub fn latest_signals(&self) -> Vec<Signal> {
        let mut signals: Vec<Signal> = self.latest.iter().map(|e| e.value().clone()).collect();
        signals.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        signals
    }

    /// Drop the cached signal for an instrument.
    pub fn invalidate(&self, instrument: &str) {
        self.latest.remove(&instrument.to_uppercase());
    }
}
