use analysis_core::{
    AnalysisError, AnalysisSink, Bar, BacktestResult, CollectedData, DataQuality, EngineConfig, TechnicalSnapshot,
    TickerDataSource,
};
use scoring_engine::StockScorer;
use std::sync::Arc;
use technical_analysis::{enrich_from_bars, PatternDetector};
use validation::PatternBacktester;

pub mod comparator;
pub mod record;

pub use comparator::{
    rank, Comparison, ComparisonRecommendation, KeyMetrics, Rankings, SkippedTicker, StockComparator, TickerAnalysis,
};
pub use record::AnalysisRecord;

/// Daily bars requested per ticker: enough for the 200-day average plus the
/// backtest window.
pub const HISTORY_DAYS: usize = 260;

/// Single-ticker pipeline: collect, derive, detect, score, backtest.
pub struct AnalysisOrchestrator {
    source: Arc<dyn TickerDataSource>,
    detector: PatternDetector,
    scorer: StockScorer,
    backtester: PatternBacktester,
    lookback_days: usize,
}

impl AnalysisOrchestrator {
    pub fn new(source: Arc<dyn TickerDataSource>, config: &EngineConfig) -> Self {
        Self {
            source,
            detector: PatternDetector::new(config.pattern_scoring_mode, &config.scoring),
            scorer: StockScorer::new(config.scoring.clone()),
            backtester: PatternBacktester::new(config.scoring.backtest.clone()),
            lookback_days: config.scoring.backtest.lookback_days,
        }
    }

    pub async fn analyze(&self, ticker: &str) -> Result<AnalysisRecord, AnalysisError> {
        tracing::info!("Starting analysis for {}", ticker);

        let data = self.source.collect(ticker).await?;
        let history = match self.source.price_history(ticker, HISTORY_DAYS).await {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!("Price history for {} unavailable: {}", ticker, e);
                Vec::new()
            }
        };

        Ok(self.evaluate(data, &history))
    }

    /// Run the pure part of the pipeline on data that is already collected.
    pub fn evaluate(&self, mut data: CollectedData, history: &[Bar]) -> AnalysisRecord {
        enrich_from_bars(&mut data.technical, history);

        let pattern = self.detector.detect(&data.technical);
        let scores = self.scorer.score(&data.technical, &data.fundamental, &data.macro_data);
        let quality = DataQuality::assess(&data.technical, &data.fundamental);
        let backtest = self.backtest_history(history);

        tracing::info!(
            ticker = %data.ticker,
            composite = scores.composite,
            recommendation = %scores.recommendation,
            pattern = %pattern.signal,
            grade = %quality.grade,
            "Analysis complete"
        );

        AnalysisRecord {
            ticker: data.ticker,
            company_name: data.fundamental.company_name.clone(),
            analyzed_at: data.timestamp,
            technical: data.technical,
            fundamental: data.fundamental,
            scores,
            pattern,
            backtest,
            quality,
        }
    }

    /// Re-detect the pattern as it stood `lookback_days` sessions ago and
    /// check it against what happened since.
    pub fn backtest_history(&self, history: &[Bar]) -> Option<BacktestResult> {
        if history.len() <= self.lookback_days {
            return None;
        }

        let detection = history.len() - self.lookback_days - 1;
        let mut past = TechnicalSnapshot::default();
        enrich_from_bars(&mut past, &history[..=detection]);
        let pattern = self.detector.detect(&past);

        Some(self.backtester.backtest(&history[detection..], pattern.score, pattern.signal, &pattern.detected))
    }

    pub async fn analyze_and_publish(
        &self,
        ticker: &str,
        sink: &dyn AnalysisSink,
    ) -> Result<AnalysisRecord, AnalysisError> {
        let record = self.analyze(ticker).await?;
        sink.upsert(ticker, &record.to_properties()).await?;
        tracing::info!("Published analysis for {}", ticker);
        Ok(record)
    }
}

#[cfg(test)]
mod orchestrator_tests;
