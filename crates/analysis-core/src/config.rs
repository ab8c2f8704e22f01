//! Scoring thresholds and engine configuration.
//!
//! `ScoringConfig` is plain data: every band the scorer, pattern detector and
//! backtester compare against lives here. `EngineConfig` wraps it with the
//! runtime knobs read from the environment once at process start.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Category weights for the composite score. Sentiment has no weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub technical: f64,
    pub fundamental: f64,
    pub macro_weight: f64,
    pub risk: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            technical: 0.30,
            fundamental: 0.35,
            macro_weight: 0.20,
            risk: 0.15,
        }
    }
}

/// Per-pattern weights and increments used by the two pattern scoring modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    // Weighted (tanh) mode significance weights
    pub cross_weight: f64,         // Golden / Death Cross
    pub trend_weight: f64,         // Strong Uptrend / Downtrend
    pub volume_weight: f64,        // Volume Surge / Dump
    pub macd_weight: f64,          // MACD crossover
    pub rsi_weight: f64,           // RSI extreme

    /// Compression applied to the net weight before tanh.
    pub tanh_scale: f64,
    /// Half-width of the output range around the neutral score.
    pub tanh_spread: f64,

    // Additive mode increments
    pub cross_increment: f64,
    pub trend_increment: f64,
    pub rsi_increment: f64,
    pub macd_increment: f64,
    pub volume_increment: f64,

    // Detection thresholds
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub volume_surge_ratio: f64,
    pub volume_dump_ratio: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            cross_weight: 2.5,
            trend_weight: 1.8,
            volume_weight: 1.5,
            macd_weight: 1.3,
            rsi_weight: 1.0,
            tanh_scale: 0.5,
            tanh_spread: 2.0,
            cross_increment: 1.5,
            trend_increment: 0.5,
            rsi_increment: 0.5,
            macd_increment: 0.3,
            volume_increment: 0.4,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            volume_surge_ratio: 1.8,
            volume_dump_ratio: 0.6,
        }
    }
}

/// Pattern backtest window and magnitude table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Forward bars required and scanned.
    pub lookback_days: usize,
    pub bullish_min_score: f64,    // score >= this is bullish
    pub bearish_max_score: f64,    // score <= this is bearish

    pub extreme_bull_score: f64,   // >= 4.5
    pub strong_bull_score: f64,    // >= 4.0
    pub extreme_bear_score: f64,   // <= 2.0
    pub strong_bear_score: f64,    // <= 2.5
    pub extreme_move: f64,         // 10%
    pub strong_move: f64,          // 7%
    pub moderate_move: f64,        // 5%
    pub neutral_move: f64,         // 2%

    /// Multiplier when a high-conviction pattern is present.
    pub high_conviction_multiplier: f64,
    /// Fraction of the expected move that counts as a breakout.
    pub breakout_fraction: f64,
    /// A neutral call holds while the price stays within this band.
    pub neutral_band: f64,
    /// Move at which neutral stability credit reaches zero.
    pub neutral_stability_limit: f64,

    pub high_confidence_accuracy: f64,
    pub medium_confidence_accuracy: f64,
    pub high_confidence_window: f64,
    pub medium_confidence_window: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            bullish_min_score: 3.5,
            bearish_max_score: 2.5,
            extreme_bull_score: 4.5,
            strong_bull_score: 4.0,
            extreme_bear_score: 2.0,
            strong_bear_score: 2.5,
            extreme_move: 0.10,
            strong_move: 0.07,
            moderate_move: 0.05,
            neutral_move: 0.02,
            high_conviction_multiplier: 1.3,
            breakout_fraction: 0.5,
            neutral_band: 0.03,
            neutral_stability_limit: 0.05,
            high_confidence_accuracy: 80.0,
            medium_confidence_accuracy: 60.0,
            high_confidence_window: 0.3,
            medium_confidence_window: 0.5,
        }
    }
}

/// Centralized scoring thresholds.
///
/// Market cap tiers follow common size classifications, P/E bands the long-run
/// S&P 500 range, RSI bands Wilder's conventions, and the macro bands typical
/// Fed policy and labor market ranges. Ratios are fractions (0.10 = 10%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    // Market cap (USD)
    pub market_cap_mega: f64,
    pub market_cap_large: f64,
    pub market_cap_mid: f64,
    pub market_cap_risk_safe: f64,

    // P/E
    pub pe_optimal_min: f64,
    pub pe_optimal_max: f64,
    pub pe_acceptable_min: f64,
    pub pe_acceptable_max: f64,

    // Technical RSI bands
    pub rsi_neutral_min: f64,
    pub rsi_neutral_max: f64,
    pub rsi_moderate_low_min: f64,
    pub rsi_moderate_high_max: f64,

    // Sentiment RSI bands (tighter)
    pub rsi_sentiment_neutral_min: f64,
    pub rsi_sentiment_neutral_max: f64,
    pub rsi_sentiment_moderate_low_min: f64,
    pub rsi_sentiment_moderate_high_max: f64,

    /// MACD within this fraction of its signal line counts as converging.
    pub macd_signal_convergence: f64,

    // Volume ratios vs 20-day average
    pub volume_spike_ratio: f64,
    pub volume_positive_ratio: f64,

    // Price change
    pub price_change_strong: f64,
    pub price_change_positive: f64,
    pub price_change_strong_sentiment: f64,

    // Balance sheet and earnings
    pub debt_to_equity_ideal: f64,
    pub debt_to_equity_acceptable: f64,
    pub revenue_significant: f64,
    pub eps_strong: f64,
    pub eps_positive: f64,

    // Macro
    pub fed_funds_low: f64,
    pub fed_funds_moderate: f64,
    pub fed_funds_high: f64,
    pub unemployment_healthy: f64,
    pub unemployment_acceptable: f64,
    pub consumer_sentiment_strong: f64,
    pub consumer_sentiment_moderate: f64,

    // Risk
    pub volatility_low: f64,
    pub volatility_moderate: f64,
    pub volatility_high: f64,
    pub beta_low: f64,
    pub beta_moderate: f64,

    pub composite: CompositeWeights,
    pub pattern: PatternConfig,
    pub backtest: BacktestConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            market_cap_mega: 200e9,
            market_cap_large: 10e9,
            market_cap_mid: 2e9,
            market_cap_risk_safe: 100e9,

            pe_optimal_min: 10.0,
            pe_optimal_max: 25.0,
            pe_acceptable_min: 5.0,
            pe_acceptable_max: 35.0,

            rsi_neutral_min: 40.0,
            rsi_neutral_max: 60.0,
            rsi_moderate_low_min: 30.0,
            rsi_moderate_high_max: 70.0,

            rsi_sentiment_neutral_min: 45.0,
            rsi_sentiment_neutral_max: 55.0,
            rsi_sentiment_moderate_low_min: 35.0,
            rsi_sentiment_moderate_high_max: 65.0,

            macd_signal_convergence: 0.9,

            volume_spike_ratio: 1.2,
            volume_positive_ratio: 1.0,

            price_change_strong: 0.10,
            price_change_positive: 0.0,
            price_change_strong_sentiment: 0.05,

            debt_to_equity_ideal: 0.5,
            debt_to_equity_acceptable: 1.0,
            revenue_significant: 10e9,
            eps_strong: 5.0,
            eps_positive: 0.0,

            fed_funds_low: 2.0,
            fed_funds_moderate: 4.0,
            fed_funds_high: 6.0,
            unemployment_healthy: 4.5,
            unemployment_acceptable: 6.0,
            consumer_sentiment_strong: 80.0,
            consumer_sentiment_moderate: 60.0,

            volatility_low: 0.02,
            volatility_moderate: 0.05,
            volatility_high: 0.10,
            beta_low: 0.8,
            beta_moderate: 1.2,

            composite: CompositeWeights::default(),
            pattern: PatternConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

/// Which pattern scoring scheme the detector uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternScoringMode {
    /// Fixed increments around 3.0
    Additive,
    /// Bullish/bearish weights compressed through tanh
    #[default]
    Weighted,
}

impl FromStr for PatternScoringMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "additive" | "baseline" => Ok(PatternScoringMode::Additive),
            "weighted" | "tanh" => Ok(PatternScoringMode::Weighted),
            other => bail!("Unknown pattern scoring mode: {}", other),
        }
    }
}

/// Runtime configuration, constructed once and passed into each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub pattern_scoring_mode: PatternScoringMode,
    /// Minimum scored tickers a comparison needs.
    pub min_comparison_tickers: usize,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pattern_scoring_mode: PatternScoringMode::default(),
            min_comparison_tickers: 2,
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read overrides from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(mode) = env::var("PATTERN_SCORING_MODE") {
            config.pattern_scoring_mode = mode.parse().context("PATTERN_SCORING_MODE")?;
        }

        config.min_comparison_tickers = env::var("MIN_COMPARISON_TICKERS")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .context("MIN_COMPARISON_TICKERS must be an integer")?;

        config.scoring.backtest.lookback_days = env::var("BACKTEST_LOOKBACK_DAYS")
            .unwrap_or_else(|_| config.scoring.backtest.lookback_days.to_string())
            .parse()
            .context("BACKTEST_LOOKBACK_DAYS must be an integer")?;

        config.scoring.pattern.tanh_scale = env::var("PATTERN_TANH_SCALE")
            .unwrap_or_else(|_| config.scoring.pattern.tanh_scale.to_string())
            .parse()
            .context("PATTERN_TANH_SCALE must be a number")?;

        config.scoring.backtest.breakout_fraction = env::var("BREAKOUT_THRESHOLD_FRACTION")
            .unwrap_or_else(|_| config.scoring.backtest.breakout_fraction.to_string())
            .parse()
            .context("BREAKOUT_THRESHOLD_FRACTION must be a number")?;

        config.validate()?;
        tracing::debug!(
            mode = ?config.pattern_scoring_mode,
            lookback = config.scoring.backtest.lookback_days,
            "Engine configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_comparison_tickers < 2 {
            bail!("MIN_COMPARISON_TICKERS must be at least 2");
        }
        if self.scoring.backtest.lookback_days == 0 {
            bail!("BACKTEST_LOOKBACK_DAYS must be positive");
        }
        if self.scoring.pattern.tanh_scale <= 0.0 {
            bail!("PATTERN_TANH_SCALE must be positive");
        }
        let fraction = self.scoring.backtest.breakout_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            bail!("BREAKOUT_THRESHOLD_FRACTION must be in (0, 1]");
        }
        Ok(())
    }
}
