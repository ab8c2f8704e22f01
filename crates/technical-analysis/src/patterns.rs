use analysis_core::{PatternConfig, TechnicalSnapshot};
use serde::{Deserialize, Serialize};

use crate::indicators::prior_trailing_mean;

/// Named technical patterns, in reporting order within each rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    GoldenCross,
    DeathCross,
    StrongUptrend,
    StrongDowntrend,
    RsiOversold,
    RsiOverbought,
    MacdBullishCrossover,
    MacdBearishCrossover,
    BullishVolumeSurge,
    BearishVolumeDump,
}

impl PatternKind {
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::GoldenCross => "Golden Cross",
            PatternKind::DeathCross => "Death Cross",
            PatternKind::StrongUptrend => "Strong Uptrend",
            PatternKind::StrongDowntrend => "Strong Downtrend",
            PatternKind::RsiOversold => "RSI Oversold",
            PatternKind::RsiOverbought => "RSI Overbought",
            PatternKind::MacdBullishCrossover => "MACD Bullish Crossover",
            PatternKind::MacdBearishCrossover => "MACD Bearish Crossover",
            PatternKind::BullishVolumeSurge => "Bullish Volume Surge",
            PatternKind::BearishVolumeDump => "Bearish Volume Dump",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            PatternKind::GoldenCross
                | PatternKind::StrongUptrend
                | PatternKind::RsiOversold
                | PatternKind::MacdBullishCrossover
                | PatternKind::BullishVolumeSurge
        )
    }

    /// Significance weight in the tanh scoring mode.
    pub fn weight(&self, config: &PatternConfig) -> f64 {
        match self {
            PatternKind::GoldenCross | PatternKind::DeathCross => config.cross_weight,
            PatternKind::StrongUptrend | PatternKind::StrongDowntrend => config.trend_weight,
            PatternKind::RsiOversold | PatternKind::RsiOverbought => config.rsi_weight,
            PatternKind::MacdBullishCrossover | PatternKind::MacdBearishCrossover => config.macd_weight,
            PatternKind::BullishVolumeSurge | PatternKind::BearishVolumeDump => config.volume_weight,
        }
    }

    /// Unsigned step in the additive scoring mode.
    pub fn increment(&self, config: &PatternConfig) -> f64 {
        match self {
            PatternKind::GoldenCross | PatternKind::DeathCross => config.cross_increment,
            PatternKind::StrongUptrend | PatternKind::StrongDowntrend => config.trend_increment,
            PatternKind::RsiOversold | PatternKind::RsiOverbought => config.rsi_increment,
            PatternKind::MacdBullishCrossover | PatternKind::MacdBearishCrossover => config.macd_increment,
            PatternKind::BullishVolumeSurge | PatternKind::BearishVolumeDump => config.volume_increment,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// MA50/MA200 before and after the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAveragePair {
    pub prior_fast: f64,
    pub prior_slow: f64,
    pub fast: f64,
    pub slow: f64,
}

/// Prior MA50 and MA200, taken from the snapshot or derived from closes.
///
/// Returns owned values; the snapshot itself is left untouched.
pub fn derive_prior_mas(tech: &TechnicalSnapshot) -> (Option<f64>, Option<f64>) {
    let prior_50 = tech
        .prev_ma_50
        .or_else(|| prior_trailing_mean(&tech.daily_closes, 50));
    let prior_200 = tech
        .prev_ma_200
        .or_else(|| prior_trailing_mean(&tech.daily_closes, 200));
    (prior_50, prior_200)
}

/// Golden/Death Cross from a before/after pair of moving averages.
pub fn detect_cross(pair: MovingAveragePair) -> Option<PatternKind> {
    let was_above = pair.prior_fast > pair.prior_slow;
    let is_above = pair.fast > pair.slow;

    match (was_above, is_above) {
        (false, true) => Some(PatternKind::GoldenCross),
        (true, false) => Some(PatternKind::DeathCross),
        _ => None,
    }
}

fn cross_pattern(tech: &TechnicalSnapshot) -> Option<PatternKind> {
    let (prior_fast, prior_slow) = derive_prior_mas(tech);
    let pair = MovingAveragePair {
        prior_fast: prior_fast?,
        prior_slow: prior_slow?,
        fast: tech.ma_50?,
        slow: tech.ma_200?,
    };
    detect_cross(pair)
}

fn trend_pattern(tech: &TechnicalSnapshot) -> Option<PatternKind> {
    let (price, ma_50, ma_200) = (tech.current_price?, tech.ma_50?, tech.ma_200?);

    if price > ma_50 && ma_50 > ma_200 {
        Some(PatternKind::StrongUptrend)
    } else if price < ma_50 && ma_50 < ma_200 {
        Some(PatternKind::StrongDowntrend)
    } else {
        None
    }
}

fn rsi_pattern(tech: &TechnicalSnapshot, config: &PatternConfig) -> Option<PatternKind> {
    let rsi = tech.rsi?;

    if rsi < config.rsi_oversold {
        Some(PatternKind::RsiOversold)
    } else if rsi > config.rsi_overbought {
        Some(PatternKind::RsiOverbought)
    } else {
        None
    }
}

fn macd_pattern(tech: &TechnicalSnapshot) -> Option<PatternKind> {
    let (line, signal) = (tech.macd?, tech.macd_signal?);

    match tech.macd_previous {
        // Full history: only a fresh crossing counts
        Some(previous) => {
            let was_above = previous > signal;
            let is_above = line > signal;
            match (was_above, is_above) {
                (false, true) => Some(PatternKind::MacdBullishCrossover),
                (true, false) => Some(PatternKind::MacdBearishCrossover),
                _ => None,
            }
        }
        None => {
            if line > signal {
                Some(PatternKind::MacdBullishCrossover)
            } else if line < signal {
                Some(PatternKind::MacdBearishCrossover)
            } else {
                None
            }
        }
    }
}

fn volume_pattern(tech: &TechnicalSnapshot, config: &PatternConfig) -> Option<PatternKind> {
    let (volume, avg) = (tech.volume?, tech.avg_volume_20d?);
    if avg <= 0.0 {
        return None;
    }

    let ratio = volume / avg;
    if ratio >= config.volume_surge_ratio {
        Some(PatternKind::BullishVolumeSurge)
    } else if ratio <= config.volume_dump_ratio {
        Some(PatternKind::BearishVolumeDump)
    } else {
        None
    }
}

/// Run every detection rule. Rules are independent and may co-trigger;
/// results come back as cross, trend, RSI, MACD, volume.
pub fn detect_patterns(tech: &TechnicalSnapshot, config: &PatternConfig) -> Vec<PatternKind> {
    [
        cross_pattern(tech),
        trend_pattern(tech),
        rsi_pattern(tech, config),
        macd_pattern(tech),
        volume_pattern(tech, config),
    ]
    .into_iter()
    .flatten()
    .collect()
}
