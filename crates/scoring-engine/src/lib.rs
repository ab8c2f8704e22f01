//! Category scoring for one ticker.
//!
//! Every category uses the same point tally: each available metric adds its
//! weight to the possible total and a tiered share of it to the earned total.
//! Missing metrics add nothing, so a category with no inputs lands on 3.0.

pub mod tally;

pub use tally::PointTally;

use analysis_core::{
    round2, FundamentalSnapshot, MacroSnapshot, Recommendation, ScoreSet, ScoringConfig, TechnicalSnapshot,
};

pub struct StockScorer {
    config: ScoringConfig,
}

impl StockScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(
        &self,
        tech: &TechnicalSnapshot,
        fund: &FundamentalSnapshot,
        macro_data: &MacroSnapshot,
    ) -> ScoreSet {
        let technical = self.technical_tally(tech);
        let fundamental = self.fundamental_tally(fund);
        let macro_tally = self.macro_tally(macro_data);
        let risk = self.risk_tally(tech, fund);
        let sentiment = self.sentiment_tally(tech);

        let (t, f, m, r) = (technical.score(), fundamental.score(), macro_tally.score(), risk.score());
        let w = &self.config.composite;
        let composite = round2(t * w.technical + f * w.fundamental + m * w.macro_weight + r * w.risk);

        let has_evidence = [technical, fundamental, macro_tally, risk].iter().any(|c| c.has_data());
        let recommendation = if has_evidence {
            Recommendation::from_composite(composite)
        } else {
            Recommendation::Hold
        };

        tracing::debug!(
            technical = t,
            fundamental = f,
            macro_score = m,
            risk = r,
            composite,
            recommendation = %recommendation,
            "Scored snapshot"
        );

        ScoreSet {
            technical: t,
            fundamental: f,
            macro_score: m,
            risk: r,
            sentiment: sentiment.score(),
            composite,
            recommendation,
        }
    }

    /// Trend 3, RSI 2, MACD 2, volume 1, 1M change 2.
    pub fn technical_tally(&self, tech: &TechnicalSnapshot) -> PointTally {
        let c = &self.config;
        let mut tally = PointTally::new();

        if let (Some(price), Some(ma_50), Some(ma_200)) = (tech.current_price, tech.ma_50, tech.ma_200) {
            let points = if price > ma_50 && ma_50 > ma_200 {
                3.0
            } else if price > ma_50 {
                2.0
            } else if price > ma_200 {
                1.0
            } else {
                0.0
            };
            tally.add(3.0, points);
        }

        if let Some(rsi) = tech.rsi {
            let points = if (c.rsi_neutral_min..=c.rsi_neutral_max).contains(&rsi) {
                2.0
            } else if (c.rsi_moderate_low_min..c.rsi_neutral_min).contains(&rsi)
                || (rsi > c.rsi_neutral_max && rsi <= c.rsi_moderate_high_max)
            {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let (Some(macd), Some(signal)) = (tech.macd, tech.macd_signal) {
            let points = if macd > signal {
                2.0
            } else if macd > signal * c.macd_signal_convergence {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let Some(spike) = volume_exceeds(tech, c.volume_spike_ratio) {
            tally.add(1.0, if spike { 1.0 } else { 0.0 });
        }

        if let Some(change) = tech.price_change_1m {
            let points = if change > c.price_change_strong {
                2.0
            } else if change > c.price_change_positive {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        tally
    }

    /// Market cap 3, P/E 2, D/E 2, revenue 1, EPS 2.
    pub fn fundamental_tally(&self, fund: &FundamentalSnapshot) -> PointTally {
        let c = &self.config;
        let mut tally = PointTally::new();

        if let Some(cap) = fund.market_cap {
            let points = if cap > c.market_cap_mega {
                3.0
            } else if cap > c.market_cap_large {
                2.0
            } else if cap > c.market_cap_mid {
                1.0
            } else {
                0.0
            };
            tally.add(3.0, points);
        }

        if let Some(pe) = fund.pe_ratio {
            let points = if (c.pe_optimal_min..=c.pe_optimal_max).contains(&pe) {
                2.0
            } else if (c.pe_acceptable_min..c.pe_optimal_min).contains(&pe)
                || (pe > c.pe_optimal_max && pe <= c.pe_acceptable_max)
            {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let Some(de) = fund.debt_to_equity {
            let points = if de < c.debt_to_equity_ideal {
                2.0
            } else if de < c.debt_to_equity_acceptable {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let Some(revenue) = fund.revenue_ttm {
            tally.add(1.0, if revenue > c.revenue_significant { 1.0 } else { 0.0 });
        }

        if let Some(eps) = fund.eps {
            let points = if eps > c.eps_strong {
                2.0
            } else if eps > c.eps_positive {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        tally
    }

    /// Fed funds 3, unemployment 2, consumer sentiment 2.
    pub fn macro_tally(&self, macro_data: &MacroSnapshot) -> PointTally {
        let c = &self.config;
        let mut tally = PointTally::new();

        if let Some(rate) = macro_data.fed_funds_rate {
            let points = if rate < c.fed_funds_low {
                3.0
            } else if rate < c.fed_funds_moderate {
                2.0
            } else if rate < c.fed_funds_high {
                1.0
            } else {
                0.0
            };
            tally.add(3.0, points);
        }

        if let Some(unemployment) = macro_data.unemployment {
            let points = if unemployment < c.unemployment_healthy {
                2.0
            } else if unemployment < c.unemployment_acceptable {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let Some(sentiment) = macro_data.consumer_sentiment {
            let points = if sentiment > c.consumer_sentiment_strong {
                2.0
            } else if sentiment > c.consumer_sentiment_moderate {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        tally
    }

    /// Volatility 3, market cap 2, beta 2. Higher score means lower risk.
    pub fn risk_tally(&self, tech: &TechnicalSnapshot, fund: &FundamentalSnapshot) -> PointTally {
        let c = &self.config;
        let mut tally = PointTally::new();

        if let Some(vol) = tech.volatility_30d {
            let points = if vol < c.volatility_low {
                3.0
            } else if vol < c.volatility_moderate {
                2.0
            } else if vol < c.volatility_high {
                1.0
            } else {
                0.0
            };
            tally.add(3.0, points);
        }

        if let Some(cap) = fund.market_cap {
            let points = if cap > c.market_cap_risk_safe {
                2.0
            } else if cap > c.market_cap_large {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let Some(beta) = fund.beta {
            let points = if beta < c.beta_low {
                2.0
            } else if beta < c.beta_moderate {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        tally
    }

    /// RSI 2, volume 1, 1M change 2. Reported but never weighted.
    pub fn sentiment_tally(&self, tech: &TechnicalSnapshot) -> PointTally {
        let c = &self.config;
        let mut tally = PointTally::new();

        if let Some(rsi) = tech.rsi {
            let points = if (c.rsi_sentiment_neutral_min..=c.rsi_sentiment_neutral_max).contains(&rsi) {
                2.0
            } else if (c.rsi_sentiment_moderate_low_min..c.rsi_sentiment_neutral_min).contains(&rsi)
                || (rsi > c.rsi_sentiment_neutral_max && rsi <= c.rsi_sentiment_moderate_high_max)
            {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        if let Some(above) = volume_exceeds(tech, c.volume_positive_ratio) {
            tally.add(1.0, if above { 1.0 } else { 0.0 });
        }

        if let Some(change) = tech.price_change_1m {
            let points = if change > c.price_change_strong_sentiment {
                2.0
            } else if change > c.price_change_positive {
                1.0
            } else {
                0.0
            };
            tally.add(2.0, points);
        }

        tally
    }
}

/// Current volume over the 20-day average, when the average is usable.
/// Whether volume is above `multiple` times its 20-day average. A zero
/// average is still data: any positive volume beats it.
fn volume_exceeds(tech: &TechnicalSnapshot, multiple: f64) -> Option<bool> {
    match (tech.volume, tech.avg_volume_20d) {
        (Some(volume), Some(avg)) => Some(volume > avg * multiple),
        _ => None,
    }
}
