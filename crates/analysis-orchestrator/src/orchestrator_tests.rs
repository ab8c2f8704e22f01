#[cfg(test)]
mod tests {
    use crate::*;
    use analysis_core::{
        AnalysisError, AnalysisSink, Bar, CollectedData, Direction, EngineConfig, FundamentalSnapshot,
        MacroSnapshot, PatternResult, Recommendation, ScoreSet, TechnicalSnapshot, TickerDataSource,
    };
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct InMemorySource {
        data: HashMap<String, CollectedData>,
        history: HashMap<String, Vec<Bar>>,
        macro_down: bool,
    }

    impl InMemorySource {
        fn with(mut self, data: CollectedData) -> Self {
            self.data.insert(data.ticker.clone(), data);
            self
        }

        fn with_history(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
            self.history.insert(ticker.to_string(), bars);
            self
        }

        fn without_macro(mut self) -> Self {
            self.macro_down = true;
            self
        }
    }

    #[async_trait]
    impl TickerDataSource for InMemorySource {
        async fn collect(&self, ticker: &str) -> Result<CollectedData, AnalysisError> {
            self.data
                .get(ticker)
                .cloned()
                .ok_or_else(|| AnalysisError::DataSource(format!("no data for {}", ticker)))
        }

        async fn macro_snapshot(&self) -> Result<MacroSnapshot, AnalysisError> {
            if self.macro_down {
                return Err(AnalysisError::DataSource("macro feed down".into()));
            }
            Ok(shared_macro())
        }

        async fn price_history(&self, ticker: &str, days: usize) -> Result<Vec<Bar>, AnalysisError> {
            let bars = self.history.get(ticker).cloned().unwrap_or_default();
            let start = bars.len().saturating_sub(days);
            Ok(bars[start..].to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        upserts: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    #[async_trait]
    impl AnalysisSink for RecordingSink {
        async fn upsert(&self, ticker: &str, properties: &Map<String, Value>) -> Result<(), AnalysisError> {
            self.upserts
                .lock()
                .unwrap()
                .push((ticker.to_string(), properties.clone()));
            Ok(())
        }
    }

    fn shared_macro() -> MacroSnapshot {
        MacroSnapshot {
            fed_funds_rate: Some(4.33),
            unemployment: Some(4.1),
            consumer_sentiment: Some(64.0),
            ..Default::default()
        }
    }

    fn best() -> CollectedData {
        CollectedData::new(
            "BEST",
            TechnicalSnapshot {
                current_price: Some(150.0),
                ma_50: Some(140.0),
                ma_200: Some(130.0),
                rsi: Some(50.0),
                macd: Some(1.2),
                macd_signal: Some(1.0),
                volume: Some(2_000_000.0),
                avg_volume_20d: Some(1_000_000.0),
                volatility_30d: Some(0.015),
                price_change_1m: Some(0.12),
                ..Default::default()
            },
            FundamentalSnapshot {
                company_name: Some("Best Corp".into()),
                market_cap: Some(250e9),
                pe_ratio: Some(18.0),
                debt_to_equity: Some(0.3),
                revenue_ttm: Some(15e9),
                eps: Some(6.0),
                beta: Some(0.7),
                ..Default::default()
            },
            shared_macro(),
        )
    }

    fn mid() -> CollectedData {
        CollectedData::new(
            "MID",
            TechnicalSnapshot {
                current_price: Some(100.0),
                ma_50: Some(105.0),
                ma_200: Some(95.0),
                rsi: Some(65.0),
                volatility_30d: Some(0.04),
                price_change_1m: Some(0.02),
                ..Default::default()
            },
            FundamentalSnapshot {
                market_cap: Some(50e9),
                pe_ratio: Some(30.0),
                debt_to_equity: Some(0.8),
                eps: Some(2.0),
                beta: Some(1.1),
                ..Default::default()
            },
            shared_macro(),
        )
    }

    fn worst() -> CollectedData {
        CollectedData::new(
            "WORST",
            TechnicalSnapshot {
                current_price: Some(50.0),
                ma_50: Some(60.0),
                ma_200: Some(70.0),
                rsi: Some(80.0),
                volatility_30d: Some(0.15),
                price_change_1m: Some(-0.10),
                ..Default::default()
            },
            FundamentalSnapshot {
                market_cap: Some(1e9),
                pe_ratio: Some(-5.0),
                debt_to_equity: Some(3.0),
                beta: Some(2.0),
                ..Default::default()
            },
            shared_macro(),
        )
    }

    /// Geometric 0.2% daily growth, oldest first.
    fn rising_history(count: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 * 1.002_f64.powi(i as i32);
                Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000_000.0,
                }
            })
            .collect()
    }

    fn analysis_with(ticker: &str, composite: f64) -> TickerAnalysis {
        let data = CollectedData::new(
            ticker,
            TechnicalSnapshot::default(),
            FundamentalSnapshot::default(),
            MacroSnapshot::default(),
        );
        let scores = ScoreSet {
            technical: 3.0,
            fundamental: 3.0,
            macro_score: 3.0,
            risk: 3.0,
            sentiment: 3.0,
            composite,
            recommendation: Recommendation::from_composite(composite),
        };
        let metrics = KeyMetrics::extract(&data, &scores);
        TickerAnalysis {
            data,
            scores,
            pattern: PatternResult::neutral(),
            metrics,
        }
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_overall_ranking_orders_by_composite() {
        let analyses = vec![
            analysis_with("mid", 3.2),
            analysis_with("best", 4.1),
            analysis_with("worst", 2.8),
        ];
        let rankings = rank(&analyses);

        assert_eq!(
            rankings.overall,
            vec![
                ("best".to_string(), 4.1),
                ("mid".to_string(), 3.2),
                ("worst".to_string(), 2.8),
            ]
        );
        // Absent 1M changes rank as flat, ties keep input order
        assert_eq!(rankings.momentum[0].0, "mid");
        assert!(rankings.value.is_empty());
    }

    #[tokio::test]
    async fn test_compare_picks_dominant_ticker() {
        let source = InMemorySource::default().with(best()).with(mid()).with(worst());
        let comparator = StockComparator::new(Arc::new(source), &EngineConfig::default());

        let comparison = comparator
            .compare(&tickers(&["MID", "WORST", "BEST"]))
            .await
            .unwrap();

        let overall: Vec<&str> = comparison.rankings.overall.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(overall, vec!["BEST", "MID", "WORST"]);
        assert_eq!(comparison.recommendation.buy_now, "BEST");
        assert_eq!(comparison.recommendation.best_value.as_deref(), Some("BEST"));
        assert_eq!(comparison.recommendation.safest, "BEST");
        // Negative P/E is left out of the value ranking
        assert_eq!(comparison.rankings.value.len(), 2);
        assert_relative_eq!(comparison.rankings.value[0].1, 100.0 / 18.0);

        let rationale = &comparison.recommendation.rationale;
        assert!(rationale.starts_with("BEST ranks #1 overall with composite score"));
        assert!(rationale.contains("Also the best value (lowest P/E ratio)."));
        assert!(rationale.contains("Strongest momentum (+12.0% this month)."));
        assert!(rationale.contains("Also the strongest fundamentals"));
        assert!(rationale.ends_with("Pattern signal: Extremely Bullish."));

        assert!(comparison.skipped.is_empty());
        assert_eq!(comparison.tickers, tickers(&["MID", "WORST", "BEST"]));
        assert_relative_eq!(comparison.analysis("BEST").unwrap().metrics.price_change_1m, 0.12);
    }

    #[tokio::test]
    async fn test_compare_skips_failures_and_duplicates() {
        let source = InMemorySource::default().with(best()).with(mid());
        let comparator = StockComparator::new(Arc::new(source), &EngineConfig::default());

        let comparison = comparator
            .compare(&tickers(&["BEST", "MISSING", "MID", "BEST"]))
            .await
            .unwrap();

        assert_eq!(comparison.analyses.len(), 2);
        assert_eq!(comparison.skipped.len(), 1);
        assert_eq!(comparison.skipped[0].ticker, "MISSING");
        assert!(comparison.skipped[0].reason.contains("no data for MISSING"));
    }

    fn without_ticker_macro(mut data: CollectedData) -> CollectedData {
        data.macro_data = MacroSnapshot::default();
        data
    }

    #[tokio::test]
    async fn test_compare_attaches_one_shared_macro_snapshot() {
        let source = InMemorySource::default()
            .with(without_ticker_macro(best()))
            .with(without_ticker_macro(mid()));
        let comparator = StockComparator::new(Arc::new(source), &EngineConfig::default());

        let comparison = comparator.compare(&tickers(&["BEST", "MID"])).await.unwrap();

        for analysis in &comparison.analyses {
            assert_eq!(analysis.data.macro_data, shared_macro());
        }
        assert_eq!(
            comparison.analysis("BEST").unwrap().scores.macro_score,
            comparison.analysis("MID").unwrap().scores.macro_score
        );
    }

    #[tokio::test]
    async fn test_compare_keeps_ticker_macro_when_shared_fetch_fails() {
        let source = InMemorySource::default()
            .with(best())
            .with(without_ticker_macro(mid()))
            .without_macro();
        let comparator = StockComparator::new(Arc::new(source), &EngineConfig::default());

        let comparison = comparator.compare(&tickers(&["BEST", "MID"])).await.unwrap();

        assert_eq!(comparison.analysis("BEST").unwrap().data.macro_data, shared_macro());
        assert_eq!(comparison.analysis("MID").unwrap().data.macro_data, MacroSnapshot::default());
        assert_relative_eq!(comparison.analysis("MID").unwrap().scores.macro_score, 3.0);
    }

    #[tokio::test]
    async fn test_compare_needs_two_scored_tickers() {
        let source = InMemorySource::default().with(best());
        let comparator = StockComparator::new(Arc::new(source), &EngineConfig::default());

        let err = comparator.compare(&tickers(&["BEST", "GONE"])).await.unwrap_err();
        match err {
            AnalysisError::InsufficientTickers { required, available } => {
                assert_eq!(required, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compare_collected_without_source_calls() {
        let comparator = StockComparator::new(Arc::new(InMemorySource::default()), &EngineConfig::default());
        let comparison = comparator.compare_collected(vec![worst(), best()]).unwrap();

        assert_eq!(comparison.recommendation.buy_now, "BEST");
        assert_eq!(comparison.recommendation.best_momentum, "BEST");
        assert_eq!(comparison.analysis("WORST").unwrap().pattern.signal, analysis_core::PatternSignal::ExtremelyBearish);
    }

    #[tokio::test]
    async fn test_analyze_and_publish_writes_properties() {
        let source = InMemorySource::default().with(best());
        let orchestrator = AnalysisOrchestrator::new(Arc::new(source), &EngineConfig::default());
        let sink = RecordingSink::default();

        let record = orchestrator.analyze_and_publish("BEST", &sink).await.unwrap();
        assert_eq!(record.company_name.as_deref(), Some("Best Corp"));
        assert!(record.backtest.is_none());
        assert!(record.pattern.has_pattern("Strong Uptrend"));

        let upserts = sink.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        let (ticker, props) = &upserts[0];
        assert_eq!(ticker, "BEST");
        assert_eq!(props["Ticker"], json!("BEST"));
        assert_eq!(props["Composite Score"], json!(record.scores.composite));
        assert_eq!(props["Pattern Signal"], json!("🚀 Extremely Bullish"));
        assert!(!props.contains_key("Pattern Accuracy"));
    }

    #[tokio::test]
    async fn test_analyze_unknown_ticker_is_source_error() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(InMemorySource::default()), &EngineConfig::default());
        let err = orchestrator.analyze("NOPE").await.unwrap_err();
        assert!(matches!(err, AnalysisError::DataSource(_)));
    }

    #[tokio::test]
    async fn test_history_fills_metrics_and_backtests_past_pattern() {
        let bare = CollectedData::new(
            "GROW",
            TechnicalSnapshot::default(),
            FundamentalSnapshot::default(),
            shared_macro(),
        );
        let source = InMemorySource::default()
            .with(bare)
            .with_history("GROW", rising_history(HISTORY_DAYS));
        let orchestrator = AnalysisOrchestrator::new(Arc::new(source), &EngineConfig::default());

        let record = orchestrator.analyze("GROW").await.unwrap();

        assert!(record.technical.ma_200.is_some());
        assert!(record.technical.volatility_30d.is_some());
        assert!(record.pattern.has_pattern("Strong Uptrend"));

        // Uptrend outweighs the overbought RSI: 3.76, bullish with a 5% target
        let backtest = record.backtest.unwrap();
        assert_eq!(backtest.direction, Direction::Bullish);
        assert_relative_eq!(backtest.expected_move, 5.0);
        assert!(backtest.prediction_correct);
        assert_eq!(backtest.days_to_breakout, Some(13));
    }

    #[test]
    fn test_short_history_skips_backtest() {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(InMemorySource::default()), &EngineConfig::default());
        assert!(orchestrator.backtest_history(&rising_history(30)).is_none());
        assert!(orchestrator.backtest_history(&rising_history(31)).is_some());
    }
}
