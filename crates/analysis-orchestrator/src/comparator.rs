use analysis_core::{
    AnalysisError, CollectedData, EngineConfig, MacroSnapshot, PatternResult, ScoreSet, TickerDataSource,
};
use futures_util::future::join_all;
use rayon::prelude::*;
use scoring_engine::StockScorer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use technical_analysis::{enrich_from_bars, PatternDetector};

use crate::HISTORY_DAYS;

/// Headline numbers shown side by side in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    /// Absent 1M change counts as flat.
    pub price_change_1m: f64,
    pub volatility: Option<f64>,
    pub beta: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub rsi: Option<f64>,
    pub composite: f64,
    pub technical: f64,
    pub fundamental: f64,
    pub risk: f64,
}

impl KeyMetrics {
    pub fn extract(data: &CollectedData, scores: &ScoreSet) -> Self {
        let tech = &data.technical;
        let fund = &data.fundamental;
        Self {
            price: tech.current_price,
            market_cap: fund.market_cap,
            pe_ratio: fund.pe_ratio,
            price_change_1m: tech.price_change_1m.unwrap_or(0.0),
            volatility: tech.volatility_30d,
            beta: fund.beta,
            debt_to_equity: fund.debt_to_equity,
            rsi: tech.rsi,
            composite: scores.composite,
            technical: scores.technical,
            fundamental: scores.fundamental,
            risk: scores.risk,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerAnalysis {
    pub data: CollectedData,
    pub scores: ScoreSet,
    pub pattern: PatternResult,
    pub metrics: KeyMetrics,
}

/// Descending `(ticker, value)` lists, one per dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub overall: Vec<(String, f64)>,
    /// 100 / P/E, only for tickers with a positive P/E.
    pub value: Vec<(String, f64)>,
    pub momentum: Vec<(String, f64)>,
    pub safety: Vec<(String, f64)>,
    pub fundamentals: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecommendation {
    pub buy_now: String,
    pub best_value: Option<String>,
    pub best_momentum: String,
    pub safest: String,
    pub best_fundamentals: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub tickers: Vec<String>,
    pub analyses: Vec<TickerAnalysis>,
    pub rankings: Rankings,
    pub recommendation: ComparisonRecommendation,
    pub skipped: Vec<SkippedTicker>,
}

impl Comparison {
    pub fn analysis(&self, ticker: &str) -> Option<&TickerAnalysis> {
        self.analyses.iter().find(|a| a.data.ticker == ticker)
    }
}

/// Ranks several tickers against each other and picks one to buy.
pub struct StockComparator {
    source: Arc<dyn TickerDataSource>,
    detector: PatternDetector,
    scorer: StockScorer,
    min_tickers: usize,
}

impl StockComparator {
    pub fn new(source: Arc<dyn TickerDataSource>, config: &EngineConfig) -> Self {
        Self {
            source,
            detector: PatternDetector::new(config.pattern_scoring_mode, &config.scoring),
            scorer: StockScorer::new(config.scoring.clone()),
            min_tickers: config.min_comparison_tickers,
        }
    }

    /// Collect every ticker concurrently, then score and rank the ones that
    /// succeeded. Failed tickers are reported in `skipped`.
    ///
    /// The macro snapshot is fetched once and shared by every ticker.
    pub async fn compare(&self, tickers: &[String]) -> Result<Comparison, AnalysisError> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = tickers.iter().filter(|t| seen.insert(t.as_str())).collect();

        tracing::info!(count = unique.len(), "Comparing tickers");

        let shared_macro = match self.source.macro_snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Shared macro snapshot unavailable, keeping per-ticker macro data");
                None
            }
        };

        let results = join_all(unique.iter().map(|ticker| self.collect_one(ticker, shared_macro.as_ref()))).await;

        let mut collected = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (ticker, result) in unique.iter().zip(results) {
            match result {
                Ok(data) => collected.push(data),
                Err(e) => {
                    tracing::warn!(ticker = %ticker, error = %e, "Skipping ticker in comparison");
                    skipped.push(SkippedTicker {
                        ticker: ticker.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut comparison = self.compare_collected(collected)?;
        comparison.skipped = skipped;
        Ok(comparison)
    }

    async fn collect_one(
        &self,
        ticker: &str,
        shared_macro: Option<&MacroSnapshot>,
    ) -> Result<CollectedData, AnalysisError> {
        let mut data = self.source.collect(ticker).await?;
        if let Some(snapshot) = shared_macro {
            data.macro_data = snapshot.clone();
        }
        match self.source.price_history(ticker, HISTORY_DAYS).await {
            Ok(bars) => enrich_from_bars(&mut data.technical, &bars),
            Err(e) => tracing::warn!(ticker, error = %e, "Price history unavailable, using provider metrics"),
        }
        Ok(data)
    }

    /// Score an already collected batch in parallel and rank it.
    pub fn compare_collected(&self, batch: Vec<CollectedData>) -> Result<Comparison, AnalysisError> {
        let analyses: Vec<TickerAnalysis> = batch
            .into_par_iter()
            .map(|data| {
                let pattern = self.detector.detect(&data.technical);
                let scores = self.scorer.score(&data.technical, &data.fundamental, &data.macro_data);
                let metrics = KeyMetrics::extract(&data, &scores);
                TickerAnalysis { data, scores, pattern, metrics }
            })
            .collect();

        if analyses.len() < self.min_tickers {
            return Err(AnalysisError::InsufficientTickers {
                required: self.min_tickers,
                available: analyses.len(),
            });
        }

        let rankings = rank(&analyses);
        let recommendation = recommend(&analyses, &rankings)?;

        tracing::info!(
            buy_now = %recommendation.buy_now,
            scored = analyses.len(),
            "Comparison complete"
        );

        Ok(Comparison {
            tickers: analyses.iter().map(|a| a.data.ticker.clone()).collect(),
            analyses,
            rankings,
            recommendation,
            skipped: Vec::new(),
        })
    }
}

/// Stable descending sort; ties keep input order.
fn sorted_desc(mut entries: Vec<(String, f64)>) -> Vec<(String, f64)> {
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries
}

fn ranked_by(analyses: &[TickerAnalysis], key: impl Fn(&TickerAnalysis) -> f64) -> Vec<(String, f64)> {
    sorted_desc(analyses.iter().map(|a| (a.data.ticker.clone(), key(a))).collect())
}

pub fn rank(analyses: &[TickerAnalysis]) -> Rankings {
    let value = analyses
        .iter()
        .filter_map(|a| match a.metrics.pe_ratio {
            Some(pe) if pe > 0.0 => Some((a.data.ticker.clone(), 100.0 / pe)),
            _ => None,
        })
        .collect();

    Rankings {
        overall: ranked_by(analyses, |a| a.scores.composite),
        value: sorted_desc(value),
        momentum: ranked_by(analyses, |a| a.metrics.price_change_1m),
        safety: ranked_by(analyses, |a| a.scores.risk),
        fundamentals: ranked_by(analyses, |a| a.scores.fundamental),
    }
}

fn leader(ranking: &[(String, f64)]) -> Option<String> {
    ranking.first().map(|(ticker, _)| ticker.clone())
}

fn recommend(analyses: &[TickerAnalysis], rankings: &Rankings) -> Result<ComparisonRecommendation, AnalysisError> {
    let missing = || AnalysisError::InsufficientData("Empty ranking".to_string());

    let buy_now = leader(&rankings.overall).ok_or_else(missing)?;
    let best_value = leader(&rankings.value);
    let best_momentum = leader(&rankings.momentum).ok_or_else(missing)?;
    let safest = leader(&rankings.safety).ok_or_else(missing)?;
    let best_fundamentals = leader(&rankings.fundamentals).ok_or_else(missing)?;

    let top = analyses
        .iter()
        .find(|a| a.data.ticker == buy_now)
        .ok_or_else(missing)?;

    let mut parts = vec![format!(
        "{} ranks #1 overall with composite score {:.2} ({}).",
        buy_now, top.scores.composite, top.scores.recommendation
    )];
    if best_value.as_deref() == Some(buy_now.as_str()) {
        parts.push("Also the best value (lowest P/E ratio).".to_string());
    }
    if best_momentum == buy_now {
        parts.push(format!(
            "Strongest momentum ({:+.1}% this month).",
            top.metrics.price_change_1m * 100.0
        ));
    }
    if safest == buy_now {
        parts.push(format!("Also the safest option (risk score {:.2}).", top.scores.risk));
    }
    if best_fundamentals == buy_now {
        parts.push(format!(
            "Also the strongest fundamentals (fundamental score {:.2}).",
            top.scores.fundamental
        ));
    }
    parts.push(format!("Pattern signal: {}.", top.pattern.signal));

    Ok(ComparisonRecommendation {
        buy_now,
        best_value,
        best_momentum,
        safest,
        best_fundamentals,
        rationale: parts.join(" "),
    })
}
