use analysis_core::{clamp_score, round2, PatternConfig, PatternScoringMode, NEUTRAL_SCORE};

use crate::patterns::PatternKind;

/// Turns a set of detected patterns into a bounded 1-5 score.
pub trait PatternScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score in [1.0, 5.0], rounded to two decimals. An empty slice is 3.0.
    fn score(&self, patterns: &[PatternKind]) -> f64;
}

/// Fixed signed increments around the neutral score.
#[derive(Debug, Clone)]
pub struct AdditiveScoring {
    config: PatternConfig,
}

impl AdditiveScoring {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }
}

impl PatternScoringStrategy for AdditiveScoring {
    fn name(&self) -> &'static str {
        "additive"
    }

    fn score(&self, patterns: &[PatternKind]) -> f64 {
        let total = patterns.iter().fold(NEUTRAL_SCORE, |acc, p| {
            let step = p.increment(&self.config);
            if p.is_bullish() {
                acc + step
            } else {
                acc - step
            }
        });
        round2(clamp_score(total))
    }
}

/// Net bullish minus bearish weight, compressed with tanh.
///
/// `score = 3 + tanh(net * tanh_scale) * tanh_spread`. Small nets move the
/// score almost linearly, large ones saturate towards the bounds.
#[derive(Debug, Clone)]
pub struct WeightedTanhScoring {
    config: PatternConfig,
}

impl WeightedTanhScoring {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Bullish and bearish weight totals.
    pub fn weights(&self, patterns: &[PatternKind]) -> (f64, f64) {
        patterns.iter().fold((0.0, 0.0), |(bull, bear), p| {
            let w = p.weight(&self.config);
            if p.is_bullish() {
                (bull + w, bear)
            } else {
                (bull, bear + w)
            }
        })
    }
}

impl PatternScoringStrategy for WeightedTanhScoring {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn score(&self, patterns: &[PatternKind]) -> f64 {
        let (bull, bear) = self.weights(patterns);
        let net = bull - bear;
        let scaled = (net * self.config.tanh_scale).tanh();
        round2(clamp_score(NEUTRAL_SCORE + scaled * self.config.tanh_spread))
    }
}

pub fn strategy_for(mode: PatternScoringMode, config: &PatternConfig) -> Box<dyn PatternScoringStrategy> {
    match mode {
        PatternScoringMode::Additive => Box::new(AdditiveScoring::new(config.clone())),
        PatternScoringMode::Weighted => Box::new(WeightedTanhScoring::new(config.clone())),
    }
}
