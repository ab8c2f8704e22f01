use analysis_core::{
    round2, round_to, Bar, BacktestConfig, BacktestResult, Confidence, Direction, PatternSignal,
};
use serde::{Deserialize, Serialize};
use technical_analysis::PatternKind;

/// Patterns that widen the expected move.
const HIGH_CONVICTION: [PatternKind; 4] = [
    PatternKind::GoldenCross,
    PatternKind::DeathCross,
    PatternKind::BullishVolumeSurge,
    PatternKind::BearishVolumeDump,
];

/// Direction and signed fractional move implied by a pattern score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedMove {
    pub direction: Direction,
    pub magnitude: f64,
}

/// Validates a pattern call against the bars that followed it.
///
/// `bars[0]` is the bar the pattern was detected on; every later bar is one
/// forward session. Stateless apart from configuration.
#[derive(Debug, Clone)]
pub struct PatternBacktester {
    config: BacktestConfig,
}

impl PatternBacktester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    pub fn direction(&self, pattern_score: f64) -> Direction {
        if pattern_score >= self.config.bullish_min_score {
            Direction::Bullish
        } else if pattern_score <= self.config.bearish_max_score {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    pub fn expected_move(&self, pattern_score: f64, detected: &[String]) -> ExpectedMove {
        let c = &self.config;
        let direction = self.direction(pattern_score);

        let base = match direction {
            Direction::Bullish if pattern_score >= c.extreme_bull_score => c.extreme_move,
            Direction::Bullish if pattern_score >= c.strong_bull_score => c.strong_move,
            Direction::Bullish => c.moderate_move,
            Direction::Bearish if pattern_score <= c.extreme_bear_score => -c.extreme_move,
            Direction::Bearish if pattern_score <= c.strong_bear_score => -c.strong_move,
            Direction::Bearish => -c.moderate_move,
            Direction::Neutral | Direction::Unknown => c.neutral_move,
        };

        let high_conviction = detected
            .iter()
            .any(|name| HIGH_CONVICTION.iter().any(|p| p.name() == name));
        let magnitude = if high_conviction {
            base * c.high_conviction_multiplier
        } else {
            base
        };

        ExpectedMove { direction, magnitude }
    }

    pub fn backtest(
        &self,
        bars: &[Bar],
        pattern_score: f64,
        pattern_signal: PatternSignal,
        detected: &[String],
    ) -> BacktestResult {
        let lookback = self.config.lookback_days;
        let Some((first, forward)) = bars.split_first() else {
            tracing::info!("No bars to backtest pattern");
            return BacktestResult::no_data();
        };
        if forward.len() < lookback {
            tracing::info!(
                forward = forward.len(),
                required = lookback,
                "Insufficient forward bars to backtest pattern"
            );
            return BacktestResult::no_data();
        }

        let reference = first.close;
        if reference <= 0.0 {
            tracing::warn!(reference, "Reference close is not positive, skipping backtest");
            return BacktestResult::no_data();
        }

        let expected = self.expected_move(pattern_score, detected);
        let (breakout_day, actual) = self.find_breakout(forward, reference, expected);
        let correct = self.is_correct(expected.direction, actual);
        let accuracy = self.accuracy(correct, actual, expected);
        let confidence = self.confidence(accuracy, breakout_day);

        tracing::info!(
            signal = %pattern_signal,
            direction = %expected.direction,
            expected = expected.magnitude,
            actual,
            accuracy,
            correct,
            "Pattern backtest complete"
        );

        BacktestResult {
            accuracy: round_to(accuracy, 1),
            expected_move: round2(expected.magnitude * 100.0),
            actual_move: round2(actual * 100.0),
            days_to_breakout: breakout_day,
            prediction_correct: correct,
            confidence,
            direction: expected.direction,
        }
    }

    /// First forward bar that confirms the call, and the move at that bar.
    /// Without a confirmation the move of the last scanned bar is returned.
    fn find_breakout(&self, forward: &[Bar], reference: f64, expected: ExpectedMove) -> (Option<u32>, f64) {
        let threshold = expected.magnitude.abs() * self.config.breakout_fraction;
        let window = &forward[..forward.len().min(self.config.lookback_days)];

        let mut last_move = 0.0;
        for (i, bar) in window.iter().enumerate() {
            let change = (bar.close - reference) / reference;
            last_move = change;

            let confirmed = match expected.direction {
                Direction::Bullish => change >= threshold,
                Direction::Bearish => change <= -threshold,
                Direction::Neutral | Direction::Unknown => change.abs() <= self.config.neutral_band,
            };
            if confirmed {
                return (Some(i as u32 + 1), change);
            }
        }

        (None, last_move)
    }

    fn is_correct(&self, direction: Direction, actual: f64) -> bool {
        match direction {
            Direction::Bullish => actual > 0.0,
            Direction::Bearish => actual < 0.0,
            Direction::Neutral | Direction::Unknown => actual.abs() <= self.config.neutral_band,
        }
    }

    /// 0-25 when wrong, 50-100 when right.
    fn accuracy(&self, correct: bool, actual: f64, expected: ExpectedMove) -> f64 {
        let relative_error = if expected.magnitude != 0.0 {
            (actual - expected.magnitude).abs() / expected.magnitude.abs()
        } else {
            1.0
        };

        if !correct {
            return (25.0 - relative_error * 25.0).max(0.0);
        }

        let closeness = match expected.direction {
            Direction::Neutral | Direction::Unknown => {
                1.0 - (actual.abs() / self.config.neutral_stability_limit).min(1.0)
            }
            _ => 1.0 - relative_error.min(1.0),
        };
        (50.0 + closeness * 50.0).clamp(0.0, 100.0)
    }

    fn confidence(&self, accuracy: f64, breakout_day: Option<u32>) -> Confidence {
        let c = &self.config;
        let window = c.lookback_days as f64;
        let within = |fraction: f64| breakout_day.is_some_and(|day| day as f64 <= window * fraction);

        if accuracy >= c.high_confidence_accuracy && within(c.high_confidence_window) {
            Confidence::High
        } else if accuracy >= c.medium_confidence_accuracy || within(c.medium_confidence_window) {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}
