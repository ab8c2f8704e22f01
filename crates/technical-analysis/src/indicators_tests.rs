#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::{Bar, TechnicalSnapshot};
    use approx::assert_relative_eq;
    use chrono::{Duration, Utc};

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    // Daily bars on a straight line from `start` rising `step` per day
    fn linear_bars(count: usize, start: f64, step: f64, volume: f64) -> Vec<Bar> {
        let origin = Utc::now() - Duration::days(count as i64);
        (0..count)
            .map(|i| {
                let close = start + step * i as f64;
                Bar {
                    timestamp: origin + Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume,
                }
            })
            .collect()
    }

    #[test]
    fn test_trailing_and_prior_means() {
        let data: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert_relative_eq!(trailing_mean(&data, 4).unwrap(), 8.5);
        // 6, 7, 8, 9
        assert_relative_eq!(prior_trailing_mean(&data, 4).unwrap(), 7.5);
        assert!(prior_trailing_mean(&data, 10).is_none());
        assert!(trailing_mean(&data, 11).is_none());
    }

    #[test]
    fn test_ema_seeded_with_first_mean() {
        let data = vec![22.0, 24.0, 23.0, 25.0, 26.0];
        let result = ema(&data, 3);

        assert_eq!(result.len(), 3);
        assert_relative_eq!(result[0], 23.0);
        // (25 - 23) * 0.5 + 23
        assert_relative_eq!(result[1], 24.0);
        assert_relative_eq!(result[2], 25.0);
    }

    #[test]
    fn test_ema_increases_with_uptrend() {
        let data: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let result = ema(&data, 3);
        for i in 1..result.len() {
            assert!(result[i] > result[i - 1]);
        }
    }

    #[test]
    fn test_rsi_range() {
        let result = rsi(&sample_prices(), 14);
        assert!(!result.is_empty());
        for &value in &result {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let data: Vec<f64> = (0..20).map(|v| 100.0 + v as f64).collect();
        let result = rsi(&data, 14);
        assert_relative_eq!(*result.last().unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(rsi(&[1.0, 2.0, 3.0], 14).is_empty());
    }

    #[test]
    fn test_macd_uptrend_is_positive() {
        let data: Vec<f64> = (0..60).map(|v| 100.0 + v as f64 * 0.5).collect();
        let result = macd(&data, 12, 26, 9);
        let (line, signal, previous) = result.latest();

        assert_eq!(result.macd_line.len(), 60 - 26 + 1);
        assert_eq!(result.signal_line.len(), result.macd_line.len() - 9 + 1);
        assert!(line.unwrap() > 0.0);
        assert!(signal.is_some());
        assert!(previous.is_some());
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        let data = sample_prices();
        assert!(macd(&data, 26, 12, 9).macd_line.is_empty());
        assert!(macd(&data, 12, 26, 9).macd_line.is_empty());
    }

    #[test]
    fn test_volatility_flat_series_is_zero() {
        let closes = vec![50.0; 40];
        assert_relative_eq!(volatility(&closes).unwrap(), 0.0);
        assert!(volatility(&closes[..29]).is_none());
    }

    #[test]
    fn test_volatility_alternating_returns() {
        // Returns alternate +10% / -9.0909% around a fixed pair of prices
        let closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 110.0 }).collect();
        let vol = volatility(&closes).unwrap();
        assert!(vol > 0.09 && vol < 0.1);
    }

    #[test]
    fn test_price_change_windows() {
        let closes: Vec<f64> = (0..21).map(|v| 100.0 + v as f64).collect();
        assert_relative_eq!(price_change(&closes, 20).unwrap(), 0.2);
        assert_relative_eq!(price_change(&closes, 5).unwrap(), 5.0 / 115.0);
        assert!(price_change(&closes, 21).is_none());
        assert!(price_change(&[0.0, 1.0], 1).is_none());
    }

    #[test]
    fn test_daily_returns_skip_zero_base() {
        let returns = daily_returns(&[0.0, 10.0, 11.0], 10);
        assert_eq!(returns.len(), 1);
        assert_relative_eq!(returns[0], 0.1);
    }

    #[test]
    fn test_enrich_fills_only_missing_fields() {
        let bars = linear_bars(220, 100.0, 0.5, 1_000_000.0);
        let mut tech = TechnicalSnapshot {
            rsi: Some(42.0),
            ..Default::default()
        };

        enrich_from_bars(&mut tech, &bars);

        assert_relative_eq!(tech.current_price.unwrap(), 100.0 + 0.5 * 219.0);
        assert_relative_eq!(tech.avg_volume_20d.unwrap(), 1_000_000.0);
        assert_eq!(tech.rsi, Some(42.0));
        assert!(tech.ma_50.unwrap() > tech.ma_200.unwrap());
        assert!(tech.macd.is_some() && tech.macd_signal.is_some() && tech.macd_previous.is_some());
        assert!(tech.volatility_30d.is_some());
        assert!(tech.price_change_1m.unwrap() > 0.0);
        assert_eq!(tech.daily_closes.len(), 220);
    }

    #[test]
    fn test_enrich_with_short_history_leaves_long_windows_empty() {
        let bars = linear_bars(10, 20.0, 1.0, 500.0);
        let mut tech = TechnicalSnapshot::default();

        enrich_from_bars(&mut tech, &bars);

        assert_eq!(tech.current_price, Some(29.0));
        assert_eq!(tech.prev_close, Some(28.0));
        assert!(tech.avg_volume_20d.is_none());
        assert!(tech.ma_50.is_none());
        assert!(tech.volatility_30d.is_none());
        assert!(tech.price_change_5d.is_some());
        assert!(tech.macd.is_none());
    }

    #[test]
    fn test_enrich_no_bars_is_noop() {
        let mut tech = TechnicalSnapshot::default();
        enrich_from_bars(&mut tech, &[]);
        assert_eq!(tech, TechnicalSnapshot::default());
    }
}
