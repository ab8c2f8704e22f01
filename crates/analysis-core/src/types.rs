use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::coerce::{coerce_field, coerce_series, text_field};

/// Neutral score every bounded 1-5 score falls back to.
pub const NEUTRAL_SCORE: f64 = 3.0;
pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

/// Sentinel pattern name reported when nothing triggered.
pub const NO_PATTERN: &str = "Mixed/Range";

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to an arbitrary number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Clamp into the bounded [1.0, 5.0] score range.
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(MIN_SCORE, MAX_SCORE)
}

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Point-in-time technical indicators for one ticker.
///
/// Every indicator is optional: `None` means the upstream source had no data,
/// which is never the same thing as `Some(0.0)`. Price changes are ratios
/// (0.05 = +5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub current_price: Option<f64>,
    pub prev_close: Option<f64>,
    pub price_change_1d: Option<f64>,
    pub price_change_5d: Option<f64>,
    pub price_change_1m: Option<f64>,
    pub volume: Option<f64>,
    pub avg_volume_20d: Option<f64>,
    /// Population std dev of daily returns over the last 30 sessions.
    pub volatility_30d: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub prev_ma_50: Option<f64>,
    pub prev_ma_200: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_previous: Option<f64>,
    /// Daily closes, oldest first.
    #[serde(default)]
    pub daily_closes: Vec<f64>,
}

impl TechnicalSnapshot {
    /// Build from a raw provider map. Every numeric field is coerced once.
    pub fn from_raw(map: &Map<String, Value>) -> Self {
        let closes = map.get("daily_closes").or_else(|| map.get("daily_closes_full"));
        Self {
            current_price: coerce_field(map, "current_price"),
            prev_close: coerce_field(map, "prev_close"),
            price_change_1d: coerce_field(map, "price_change_1d"),
            price_change_5d: coerce_field(map, "price_change_5d"),
            price_change_1m: coerce_field(map, "price_change_1m"),
            volume: coerce_field(map, "volume"),
            avg_volume_20d: coerce_field(map, "avg_volume_20d"),
            volatility_30d: coerce_field(map, "volatility_30d"),
            ma_50: coerce_field(map, "ma_50"),
            ma_200: coerce_field(map, "ma_200"),
            prev_ma_50: coerce_field(map, "prev_ma_50"),
            prev_ma_200: coerce_field(map, "prev_ma_200"),
            rsi: coerce_field(map, "rsi"),
            macd: coerce_field(map, "macd"),
            macd_signal: coerce_field(map, "macd_signal"),
            macd_previous: coerce_field(map, "macd_previous"),
            daily_closes: coerce_series(closes),
        }
    }
}

/// Company fundamentals for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub company_name: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub beta: Option<f64>,
    #[serde(rename = "52_week_high")]
    pub week_52_high: Option<f64>,
    #[serde(rename = "52_week_low")]
    pub week_52_low: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub eps: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

impl FundamentalSnapshot {
    /// Build from a raw provider map.
    ///
    /// `eps` and `debt_to_equity` are taken as given when present, otherwise
    /// derived from `net_income`/`shares_outstanding` and
    /// `total_debt`/`total_equity` if the raw map carries them.
    pub fn from_raw(map: &Map<String, Value>) -> Self {
        let eps = coerce_field(map, "eps").or_else(|| {
            Self::derive_eps(
                coerce_field(map, "net_income"),
                coerce_field(map, "shares_outstanding"),
            )
        });
        let debt_to_equity = coerce_field(map, "debt_to_equity").or_else(|| {
            Self::derive_debt_to_equity(
                coerce_field(map, "total_debt"),
                coerce_field(map, "total_equity"),
            )
        });

        Self {
            company_name: text_field(map, "company_name"),
            market_cap: coerce_field(map, "market_cap"),
            pe_ratio: coerce_field(map, "pe_ratio"),
            beta: coerce_field(map, "beta"),
            week_52_high: coerce_field(map, "52_week_high"),
            week_52_low: coerce_field(map, "52_week_low"),
            revenue_ttm: coerce_field(map, "revenue_ttm"),
            eps,
            debt_to_equity,
        }
    }

    /// Most recent annual net income / shares outstanding.
    pub fn derive_eps(net_income: Option<f64>, shares_outstanding: Option<f64>) -> Option<f64> {
        match (net_income, shares_outstanding) {
            (Some(ni), Some(shares)) if shares > 0.0 => Some(ni / shares),
            _ => None,
        }
    }

    /// Total debt / total shareholder equity, defined only for positive equity.
    pub fn derive_debt_to_equity(total_debt: Option<f64>, total_equity: Option<f64>) -> Option<f64> {
        match (total_debt, total_equity) {
            (Some(debt), Some(equity)) if equity > 0.0 => Some(debt / equity),
            _ => None,
        }
    }
}

/// Economy-wide indicators shared by every ticker in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSnapshot {
    pub fed_funds_rate: Option<f64>,
    pub unemployment: Option<f64>,
    pub consumer_sentiment: Option<f64>,
    pub gdp_growth: Option<f64>,
    /// CPI level
    pub inflation: Option<f64>,
}

impl MacroSnapshot {
    pub fn from_raw(map: &Map<String, Value>) -> Self {
        Self {
            fed_funds_rate: coerce_field(map, "fed_funds_rate"),
            unemployment: coerce_field(map, "unemployment"),
            consumer_sentiment: coerce_field(map, "consumer_sentiment"),
            gdp_growth: coerce_field(map, "gdp_growth"),
            inflation: coerce_field(map, "inflation"),
        }
    }
}

/// Everything collected for one ticker in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedData {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub technical: TechnicalSnapshot,
    pub fundamental: FundamentalSnapshot,
    #[serde(rename = "macro")]
    pub macro_data: MacroSnapshot,
}

impl CollectedData {
    pub fn new(
        ticker: impl Into<String>,
        technical: TechnicalSnapshot,
        fundamental: FundamentalSnapshot,
        macro_data: MacroSnapshot,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            timestamp: Utc::now(),
            technical,
            fundamental,
            macro_data,
        }
    }
}

/// Qualitative pattern signal, ordered from most bearish to most bullish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PatternSignal {
    #[serde(rename = "Extremely Bearish")]
    ExtremelyBearish,
    #[serde(rename = "Bearish")]
    Bearish,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Bullish")]
    Bullish,
    #[serde(rename = "Extremely Bullish")]
    ExtremelyBullish,
}

impl PatternSignal {
    /// Closed upper bounds, first match wins.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s <= 2.0 => PatternSignal::ExtremelyBearish,
            s if s <= 2.5 => PatternSignal::Bearish,
            s if s <= 3.5 => PatternSignal::Neutral,
            s if s <= 4.0 => PatternSignal::Bullish,
            _ => PatternSignal::ExtremelyBullish,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternSignal::ExtremelyBearish => "Extremely Bearish",
            PatternSignal::Bearish => "Bearish",
            PatternSignal::Neutral => "Neutral",
            PatternSignal::Bullish => "Bullish",
            PatternSignal::ExtremelyBullish => "Extremely Bullish",
        }
    }

    /// Label with the marker the document store's select options use.
    pub fn decorated(&self) -> String {
        let marker = match self {
            PatternSignal::ExtremelyBearish => "🚨",
            PatternSignal::Bearish => "📉",
            PatternSignal::Neutral => "✋",
            PatternSignal::Bullish => "📈",
            PatternSignal::ExtremelyBullish => "🚀",
        };
        format!("{} {}", marker, self.label())
    }
}

impl fmt::Display for PatternSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of pattern detection. Recomputed on every analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub score: f64,
    pub signal: PatternSignal,
    pub detected: Vec<String>,
}

impl PatternResult {
    pub fn neutral() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            signal: PatternSignal::Neutral,
            detected: vec![NO_PATTERN.to_string()],
        }
    }

    pub fn has_pattern(&self, name: &str) -> bool {
        self.detected.iter().any(|d| d == name)
    }
}

/// Seven-step recommendation derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Sell")]
    StrongSell,
    #[serde(rename = "Sell")]
    Sell,
    #[serde(rename = "Moderate Sell")]
    ModerateSell,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Moderate Buy")]
    ModerateBuy,
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl Recommendation {
    /// Closed lower bounds, descending.
    pub fn from_composite(composite: f64) -> Self {
        match composite {
            s if s >= 4.0 => Recommendation::StrongBuy,
            s if s >= 3.5 => Recommendation::Buy,
            s if s >= 3.0 => Recommendation::ModerateBuy,
            s if s >= 2.5 => Recommendation::Hold,
            s if s >= 2.0 => Recommendation::ModerateSell,
            s if s >= 1.5 => Recommendation::Sell,
            _ => Recommendation::StrongSell,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::ModerateBuy => "Moderate Buy",
            Recommendation::Hold => "Hold",
            Recommendation::ModerateSell => "Moderate Sell",
            Recommendation::Sell => "Sell",
            Recommendation::StrongSell => "Strong Sell",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category scores plus the weighted composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub technical: f64,
    pub fundamental: f64,
    #[serde(rename = "macro")]
    pub macro_score: f64,
    pub risk: f64,
    /// Reported alongside the others but never part of the composite.
    pub sentiment: f64,
    pub composite: f64,
    pub recommendation: Recommendation,
}

/// Direction a pattern implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
            Direction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

/// Outcome of validating one pattern against the bars that followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// 0-100
    pub accuracy: f64,
    /// Signed percentage
    pub expected_move: f64,
    /// Signed percentage
    pub actual_move: f64,
    /// `None` when no breakout was observed in the window.
    pub days_to_breakout: Option<u32>,
    pub prediction_correct: bool,
    pub confidence: Confidence,
    pub direction: Direction,
}

impl BacktestResult {
    /// Result for a window without enough bars to judge.
    pub fn no_data() -> Self {
        Self {
            accuracy: 0.0,
            expected_move: 0.0,
            actual_move: 0.0,
            days_to_breakout: None,
            prediction_correct: false,
            confidence: Confidence::Low,
            direction: Direction::Unknown,
        }
    }
}
