//! stock-intel: score, pattern-check and compare tickers from a captured data fixture.
//!
//! Usage:
//!   cargo run -p stock-intel -- --fixture data.json
//!   cargo run -p stock-intel -- --fixture data.json --tickers AAPL MSFT
//!   cargo run -p stock-intel -- --fixture data.json --compare --tickers AAPL MSFT NVDA
//!   cargo run -p stock-intel -- --fixture data.json --properties

mod sink;
mod source;

use analysis_core::EngineConfig;
use analysis_orchestrator::{AnalysisOrchestrator, StockComparator};
use sink::JsonLinesSink;
use source::JsonFixtureSource;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "Usage: stock-intel --fixture <path> [--tickers T1 T2 ...] [--compare] [--properties]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_intel=info,analysis_orchestrator=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let compare = args.iter().any(|a| a == "--compare");
    let properties = args.iter().any(|a| a == "--properties");

    let Some(fixture) = args
        .iter()
        .position(|a| a == "--fixture")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
    else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    let config = EngineConfig::from_env()?;
    let source = Arc::new(JsonFixtureSource::load(&fixture)?);

    let tickers: Vec<String> = match args.iter().position(|a| a == "--tickers") {
        Some(idx) => args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .map(|s| s.to_uppercase())
            .collect(),
        None => source.tickers(),
    };

    if tickers.is_empty() {
        eprintln!("No tickers to analyze\n{}", USAGE);
        std::process::exit(1);
    }

    tracing::info!(
        fixture = %fixture.display(),
        tickers = tickers.len(),
        mode = ?config.pattern_scoring_mode,
        "stock-intel starting"
    );

    if compare {
        let comparator = StockComparator::new(source, &config);
        let comparison = comparator.compare(&tickers).await?;
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    let orchestrator = AnalysisOrchestrator::new(source, &config);
    let sink = JsonLinesSink::stdout();
    let mut failed = 0usize;

    for ticker in &tickers {
        let result = if properties {
            orchestrator.analyze_and_publish(ticker, &sink).await.map(|_| ())
        } else {
            orchestrator
                .analyze(ticker)
                .await
                .and_then(|record| {
                    serde_json::to_string_pretty(&record)
                        .map_err(|e| analysis_core::AnalysisError::Sink(e.to_string()))
                })
                .map(|json| println!("{}", json))
        };

        if let Err(e) = result {
            failed += 1;
            tracing::error!(ticker = %ticker, error = %e, "Analysis failed");
        }
    }

    tracing::info!(analyzed = tickers.len() - failed, failed, "stock-intel done");
    Ok(())
}
