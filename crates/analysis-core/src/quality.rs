//! Data completeness grading for a collected snapshot pair.

use serde::{Deserialize, Serialize};

use crate::types::{round2, FundamentalSnapshot, TechnicalSnapshot};

/// Number of technical plus fundamental fields tracked for completeness.
pub const TRACKED_FIELDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub available_fields: usize,
    pub total_fields: usize,
    /// 0.0 to 1.0, rounded to 2 decimals
    pub completeness: f64,
    pub grade: String,
    pub confidence: String,
}

impl DataQuality {
    /// Presence is `is_some()`: a reported zero counts as available.
    pub fn assess(tech: &TechnicalSnapshot, fund: &FundamentalSnapshot) -> Self {
        let fields = [
            tech.current_price,
            tech.ma_50,
            tech.ma_200,
            tech.rsi,
            tech.macd,
            tech.macd_signal,
            tech.volume,
            tech.avg_volume_20d,
            tech.volatility_30d,
            tech.price_change_1d,
            tech.price_change_5d,
            tech.price_change_1m,
            fund.market_cap,
            fund.pe_ratio,
            fund.eps,
            fund.revenue_ttm,
            fund.debt_to_equity,
            fund.beta,
            fund.week_52_high,
            fund.week_52_low,
        ];
        let available_fields = fields.iter().filter(|f| f.is_some()).count();
        let completeness = available_fields as f64 / TRACKED_FIELDS as f64;

        let grade = match completeness {
            c if c >= 0.90 => "A - Excellent",
            c if c >= 0.75 => "B - Good",
            c if c >= 0.60 => "C - Fair",
            _ => "D - Poor",
        };
        let confidence = match completeness {
            c if c >= 0.85 => "High",
            c if c >= 0.70 => "Medium-High",
            c if c >= 0.55 => "Medium",
            _ => "Low",
        };

        Self {
            available_fields,
            total_fields: TRACKED_FIELDS,
            completeness: round2(completeness),
            grade: grade.to_string(),
            confidence: confidence.to_string(),
        }
    }
}
