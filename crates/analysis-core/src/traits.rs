use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{AnalysisError, Bar, CollectedData, MacroSnapshot};

/// Source of collected per-ticker data (market, fundamental and macro providers).
#[async_trait]
pub trait TickerDataSource: Send + Sync {
    /// Technical and fundamental data for one ticker, with the shared macro snapshot attached.
    async fn collect(&self, ticker: &str) -> Result<CollectedData, AnalysisError>;

    /// Macro indicators shared by every ticker.
    async fn macro_snapshot(&self) -> Result<MacroSnapshot, AnalysisError>;

    /// Most recent `days` daily bars, oldest first. Sources without history
    /// return an empty series.
    async fn price_history(&self, _ticker: &str, _days: usize) -> Result<Vec<Bar>, AnalysisError> {
        Ok(Vec::new())
    }
}

/// Destination for finished analysis records, keyed by ticker.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn upsert(&self, ticker: &str, properties: &Map<String, Value>) -> Result<(), AnalysisError>;
}
