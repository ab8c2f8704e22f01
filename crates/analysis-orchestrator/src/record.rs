use analysis_core::{
    round2, round_to, BacktestResult, DataQuality, FundamentalSnapshot, PatternResult, ScoreSet, TechnicalSnapshot,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Everything one analysis run produced for a ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub ticker: String,
    pub company_name: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    pub technical: TechnicalSnapshot,
    pub fundamental: FundamentalSnapshot,
    pub scores: ScoreSet,
    pub pattern: PatternResult,
    pub backtest: Option<BacktestResult>,
    pub quality: DataQuality,
}

impl AnalysisRecord {
    /// Flat, display-named property map handed to the document store.
    ///
    /// Absent metrics are omitted rather than written as zero.
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        let tech = &self.technical;
        let fund = &self.fundamental;

        props.insert("Ticker".into(), json!(self.ticker));
        if let Some(name) = &self.company_name {
            props.insert("Company Name".into(), json!(name));
        }
        props.insert("Analysis Date".into(), json!(self.analyzed_at.to_rfc3339()));

        if let Some(price) = tech.current_price {
            props.insert("Current Price".into(), json!(price));
        }

        props.insert("Composite Score".into(), json!(self.scores.composite));
        props.insert("Technical Score".into(), json!(self.scores.technical));
        props.insert("Fundamental Score".into(), json!(self.scores.fundamental));
        props.insert("Macro Score".into(), json!(self.scores.macro_score));
        props.insert("Risk Score".into(), json!(self.scores.risk));
        props.insert("Sentiment Score".into(), json!(self.scores.sentiment));
        props.insert("Recommendation".into(), json!(self.scores.recommendation.label()));

        props.insert("Confidence".into(), json!(self.quality.confidence));
        props.insert("Data Quality Grade".into(), json!(self.quality.grade));
        props.insert("Data Completeness".into(), json!(self.quality.completeness));

        let mut number = |key: &str, value: Option<f64>, decimals: i32| {
            if let Some(v) = value {
                props.insert(key.to_string(), json!(round_to(v, decimals)));
            }
        };

        number("50 Day MA", tech.ma_50, 2);
        number("200 Day MA", tech.ma_200, 2);
        number("RSI", tech.rsi, 1);
        number("MACD", tech.macd, 2);
        number("MACD Signal", tech.macd_signal, 2);
        number("Avg Volume (20D)", tech.avg_volume_20d, 1);
        number("Volatility (30D)", tech.volatility_30d, 4);
        number("Price Change (1D)", tech.price_change_1d, 4);
        number("Price Change (5D)", tech.price_change_5d, 4);
        number("Price Change (1M)", tech.price_change_1m, 4);
        number("Volume Change", volume_change(tech), 4);

        number("Market Cap", fund.market_cap, 2);
        number("P/E Ratio", fund.pe_ratio, 2);
        number("EPS", fund.eps, 2);
        number("Revenue (TTM)", fund.revenue_ttm, 0);
        number("Debt to Equity", fund.debt_to_equity, 2);
        number("Beta", fund.beta, 2);
        number("52 Week High", fund.week_52_high, 2);
        number("52 Week Low", fund.week_52_low, 2);

        if let Some(volume) = tech.volume {
            props.insert("Volume".into(), json!(volume.trunc() as i64));
        }

        props.insert("Pattern Score".into(), json!(round2(self.pattern.score)));
        props.insert("Pattern Signal".into(), json!(self.pattern.signal.decorated()));
        props.insert("Detected Patterns".into(), json!(self.pattern.detected.join(", ")));

        if let Some(bt) = &self.backtest {
            props.insert("Pattern Accuracy".into(), json!(bt.accuracy));
            if let Some(days) = bt.days_to_breakout {
                props.insert("Days to Breakout".into(), json!(days));
            }
            props.insert("Expected Move (%)".into(), json!(bt.expected_move));
            props.insert("Actual Move (%)".into(), json!(bt.actual_move));
            props.insert("Prediction Correct".into(), json!(bt.prediction_correct));
        }

        props
    }
}

/// Fractional change of current volume against the 20-day average.
fn volume_change(tech: &TechnicalSnapshot) -> Option<f64> {
    match (tech.volume, tech.avg_volume_20d) {
        (Some(volume), Some(avg)) if avg > 0.0 => Some((volume - avg) / avg),
        _ => None,
    }
}
