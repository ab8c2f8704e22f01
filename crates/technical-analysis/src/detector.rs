use analysis_core::{
    PatternConfig, PatternResult, PatternScoringMode, PatternSignal, ScoringConfig, TechnicalSnapshot, NO_PATTERN,
};
use serde_json::Value;

use crate::patterns::{detect_patterns, PatternKind};
use crate::strategy::{strategy_for, PatternScoringStrategy};

/// Detects named technical patterns and scores them with a pluggable strategy.
///
/// Holds only immutable configuration, so one detector can be shared across
/// threads and calls are repeatable.
pub struct PatternDetector {
    config: PatternConfig,
    strategy: Box<dyn PatternScoringStrategy>,
}

impl PatternDetector {
    pub fn new(mode: PatternScoringMode, config: &ScoringConfig) -> Self {
        Self {
            config: config.pattern.clone(),
            strategy: strategy_for(mode, &config.pattern),
        }
    }

    pub fn with_strategy(config: PatternConfig, strategy: Box<dyn PatternScoringStrategy>) -> Self {
        Self { config, strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Detected pattern kinds without scoring.
    pub fn patterns(&self, tech: &TechnicalSnapshot) -> Vec<PatternKind> {
        detect_patterns(tech, &self.config)
    }

    pub fn detect(&self, tech: &TechnicalSnapshot) -> PatternResult {
        let patterns = self.patterns(tech);
        let score = self.strategy.score(&patterns);
        let signal = PatternSignal::from_score(score);

        let detected = if patterns.is_empty() {
            vec![NO_PATTERN.to_string()]
        } else {
            patterns.iter().map(|p| p.name().to_string()).collect()
        };

        tracing::debug!(
            strategy = self.strategy.name(),
            score,
            signal = %signal,
            patterns = detected.len(),
            "Pattern detection complete"
        );

        PatternResult { score, signal, detected }
    }

    /// Detect from a raw technical payload. Anything but a JSON object is neutral.
    pub fn detect_raw(&self, raw: &Value) -> PatternResult {
        match raw.as_object() {
            Some(map) => self.detect(&TechnicalSnapshot::from_raw(map)),
            None => {
                tracing::debug!("Technical payload is not an object, returning neutral pattern");
                PatternResult::neutral()
            }
        }
    }
}
