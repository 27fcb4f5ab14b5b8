use anyhow::Context;
use retrace::{Observation, SignalConfig, SignalStore, TrainingConfig, WeightTable};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Printed run summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    training: retrace::TrainingOutcome,
    signals: Vec<InstrumentOutcome>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentOutcome {
    instrument: String,
    outcome: retrace::SignalOutcome,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retrace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let history_path = args
        .next()
        .context("usage: retrace <history.json> [weights.json]")?;

    let signal_config = SignalConfig::from_env()?;
    let training_config = TrainingConfig::from_env()?;

    let weights: WeightTable = match args.next() {
        Some(path) => read_json(Path::new(&path))?,
        None => WeightTable::default(),
    };

    let mut history: HashMap<String, Vec<Observation>> = read_json(Path::new(&history_path))?;
    for series in history.values_mut() {
        series.sort_by_key(Observation::timestamp);
    }
    info!(
        "Loaded {} instruments ({} observations) from {}",
        history.len(),
        history.values().map(Vec::len).sum::<usize>(),
        history_path
    );

    let store = SignalStore::new(signal_config, training_config, weights);
    let training = store.train(history.clone()).await?;
    let signals = store
        .generate_many(history)
        .await
        .into_iter()
        .map(|(instrument, outcome)| InstrumentOutcome { instrument, outcome })
        .collect();

    let report = Report { training, signals };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
