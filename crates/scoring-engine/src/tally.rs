use analysis_core::{clamp_score, round2, NEUTRAL_SCORE};
use serde::{Deserialize, Serialize};

/// Earned versus possible points for one scoring category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointTally {
    pub earned: f64,
    pub max: f64,
}

impl PointTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one available metric worth `weight` points, of which `earned`
    /// were awarded.
    pub fn add(&mut self, weight: f64, earned: f64) {
        self.max += weight;
        self.earned += earned.min(weight);
    }

    pub fn has_data(&self) -> bool {
        self.max > 0.0
    }

    /// `1 + earned/max * 4`, or exactly 3.0 when nothing contributed.
    pub fn score(&self) -> f64 {
        if !self.has_data() {
            return NEUTRAL_SCORE;
        }
        round2(clamp_score(1.0 + (self.earned / self.max) * 4.0))
    }
}
