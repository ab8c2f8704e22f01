use analysis_core::{AnalysisError, AnalysisSink};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::sync::Mutex;

/// Writes each upserted record as one JSON line.
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait]
impl<W: Write + Send> AnalysisSink for JsonLinesSink<W> {
    async fn upsert(&self, ticker: &str, properties: &Map<String, Value>) -> Result<(), AnalysisError> {
        let line = json!({ "ticker": ticker, "properties": properties });
        let mut out = self
            .out
            .lock()
            .map_err(|_| AnalysisError::Sink("Writer lock poisoned".to_string()))?;
        writeln!(out, "{}", line).map_err(|e| AnalysisError::Sink(e.to_string()))?;
        out.flush().map_err(|e| AnalysisError::Sink(e.to_string()))
    }
}
