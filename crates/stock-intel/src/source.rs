//! Fixture-backed data source.
//!
//! A fixture is one JSON document holding raw provider payloads:
//!
//! ```json
//! {
//!   "macro": { "fed_funds_rate": "4.33", "unemployment": 4.1 },
//!   "tickers": {
//!     "AAPL": {
//!       "technical": { "current_price": "187.4", "rsi": "None" },
//!       "fundamental": { "market_cap": 2.9e12, "pe_ratio": "29.1" },
//!       "bars": [{ "timestamp": "2024-05-01T20:00:00Z", "close": 169.3, "volume": 5.0e7 }]
//!     }
//!   }
//! }
//! ```
//!
//! Every numeric field goes through the coercion gate, so fixtures can be
//! captured straight from provider responses.

use analysis_core::{
    coerce_field, AnalysisError, Bar, CollectedData, FundamentalSnapshot, MacroSnapshot, TechnicalSnapshot,
    TickerDataSource,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

struct FixtureTicker {
    technical: TechnicalSnapshot,
    fundamental: FundamentalSnapshot,
    bars: Vec<Bar>,
}

pub struct JsonFixtureSource {
    macro_data: MacroSnapshot,
    tickers: BTreeMap<String, FixtureTicker>,
}

impl JsonFixtureSource {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let raw: Value = serde_json::from_str(&text)
            .with_context(|| format!("Fixture {} is not valid JSON", path.display()))?;
        Ok(Self::from_value(&raw)?)
    }

    pub fn from_value(raw: &Value) -> Result<Self, AnalysisError> {
        let root = raw
            .as_object()
            .ok_or_else(|| AnalysisError::InvalidData("Fixture root must be an object".to_string()))?;

        let macro_data = root
            .get("macro")
            .and_then(Value::as_object)
            .map(MacroSnapshot::from_raw)
            .unwrap_or_default();

        let entries = root
            .get("tickers")
            .and_then(Value::as_object)
            .ok_or_else(|| AnalysisError::InvalidData("Fixture has no tickers object".to_string()))?;

        let empty = Map::new();
        let mut tickers = BTreeMap::new();
        for (ticker, entry) in entries {
            let section = |key: &str| entry.get(key).and_then(Value::as_object).unwrap_or(&empty);
            let bars = entry
                .get("bars")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(parse_bar).collect())
                .unwrap_or_default();

            tickers.insert(
                ticker.to_uppercase(),
                FixtureTicker {
                    technical: TechnicalSnapshot::from_raw(section("technical")),
                    fundamental: FundamentalSnapshot::from_raw(section("fundamental")),
                    bars,
                },
            );
        }

        tracing::debug!(tickers = tickers.len(), "Loaded fixture");
        Ok(Self { macro_data, tickers })
    }

    pub fn tickers(&self) -> Vec<String> {
        self.tickers.keys().cloned().collect()
    }
}

/// A bar needs a parseable timestamp and close; other fields fall back to the close or zero volume.
fn parse_bar(raw: &Value) -> Option<Bar> {
    let map = raw.as_object()?;
    let timestamp = map
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
        .with_timezone(&Utc);
    let close = coerce_field(map, "close")?;

    Some(Bar {
        timestamp,
        open: coerce_field(map, "open").unwrap_or(close),
        high: coerce_field(map, "high").unwrap_or(close),
        low: coerce_field(map, "low").unwrap_or(close),
        close,
        volume: coerce_field(map, "volume").unwrap_or(0.0),
    })
}

#[async_trait]
impl TickerDataSource for JsonFixtureSource {
    async fn collect(&self, ticker: &str) -> Result<CollectedData, AnalysisError> {
        let entry = self
            .tickers
            .get(&ticker.to_uppercase())
            .ok_or_else(|| AnalysisError::DataSource(format!("{} not in fixture", ticker)))?;

        Ok(CollectedData::new(
            ticker.to_uppercase(),
            entry.technical.clone(),
            entry.fundamental.clone(),
            self.macro_data.clone(),
        ))
    }

    async fn macro_snapshot(&self) -> Result<MacroSnapshot, AnalysisError> {
        Ok(self.macro_data.clone())
    }

    async fn price_history(&self, ticker: &str, days: usize) -> Result<Vec<Bar>, AnalysisError> {
        let Some(entry) = self.tickers.get(&ticker.to_uppercase()) else {
            return Ok(Vec::new());
        };
        let mut bars = entry.bars.clone();
        bars.sort_by_key(|b| b.timestamp);
        let start = bars.len().saturating_sub(days);
        Ok(bars.split_off(start))
    }
}
