use analysis_core::{Bar, TechnicalSnapshot};
use statrs::statistics::Statistics;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const VOLUME_AVG_WINDOW: usize = 20;
pub const VOLATILITY_WINDOW: usize = 30;
/// Sessions in the 1-month price change.
pub const MONTH_SESSIONS: usize = 20;
pub const WEEK_SESSIONS: usize = 5;

/// Mean of the last `period` values, if there are that many.
pub fn trailing_mean(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    Some(data[data.len() - period..].iter().sum::<f64>() / period as f64)
}

/// Mean of the `period` values that end one bar before the last.
///
/// This is the moving average as it stood at the previous close.
pub fn prior_trailing_mean(data: &[f64], period: usize) -> Option<f64> {
    if data.len() < period + 1 {
        return None;
    }
    trailing_mean(&data[..data.len() - 1], period)
}

/// Exponential Moving Average seeded with the SMA of the first `period` values.
///
/// Output index `i` corresponds to input index `i + period - 1`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(data.len() - period + 1);
    result.push(seed);
    for &value in &data[period..] {
        let prev = result[result.len() - 1];
        result.push((value - prev) * multiplier + prev);
    }
    result
}

/// Relative Strength Index (Wilder smoothing)
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = data
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let to_rsi = |avg_gain: f64, avg_loss: f64| {
        if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        }
    };

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(gains.len() - period + 1);
    values.push(to_rsi(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        values.push(to_rsi(avg_gain, avg_loss));
    }

    values
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
}

impl MacdResult {
    /// Latest MACD line, latest signal line, and the MACD line one bar earlier.
    pub fn latest(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        let n = self.macd_line.len();
        let previous = if n >= 2 { Some(self.macd_line[n - 2]) } else { None };
        (self.macd_line.last().copied(), self.signal_line.last().copied(), previous)
    }
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0 || signal_period == 0 || slow_period <= fast_period {
        return MacdResult { macd_line: vec![], signal_line: vec![] };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    if ema_slow.is_empty() {
        return MacdResult { macd_line: vec![], signal_line: vec![] };
    }

    // Both series end on the last bar; the fast one starts earlier.
    let offset = slow_period - fast_period;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow)| ema_fast[i + offset] - slow)
        .collect();
    let signal_line = ema(&macd_line, signal_period);

    MacdResult { macd_line, signal_line }
}

/// Daily simple returns over the last `window` closes, skipping zero bases.
pub fn daily_returns(closes: &[f64], window: usize) -> Vec<f64> {
    let start = closes.len().saturating_sub(window);
    closes[start..]
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Population standard deviation of daily returns over the last 30 closes.
pub fn volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() < VOLATILITY_WINDOW {
        return None;
    }
    let returns = daily_returns(closes, VOLATILITY_WINDOW);
    if returns.is_empty() {
        return None;
    }
    Some(returns.iter().population_std_dev())
}

/// Fractional change from `sessions` bars ago to the last close.
pub fn price_change(closes: &[f64], sessions: usize) -> Option<f64> {
    if closes.len() < sessions + 1 {
        return None;
    }
    let base = closes[closes.len() - 1 - sessions];
    let last = closes[closes.len() - 1];
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base)
}

/// Fill every absent technical field that can be derived from daily bars.
///
/// Provider-supplied values always win; only `None` fields are written.
pub fn enrich_from_bars(tech: &mut TechnicalSnapshot, bars: &[Bar]) {
    if bars.is_empty() {
        return;
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    fn fill(slot: &mut Option<f64>, value: Option<f64>) {
        if slot.is_none() {
            *slot = value;
        }
    }

    fill(&mut tech.current_price, closes.last().copied());
    if closes.len() >= 2 {
        fill(&mut tech.prev_close, Some(closes[closes.len() - 2]));
    }
    fill(&mut tech.volume, volumes.last().copied());
    fill(&mut tech.avg_volume_20d, trailing_mean(&volumes, VOLUME_AVG_WINDOW));
    fill(&mut tech.volatility_30d, volatility(&closes));
    fill(&mut tech.price_change_1d, price_change(&closes, 1));
    fill(&mut tech.price_change_5d, price_change(&closes, WEEK_SESSIONS));
    fill(&mut tech.price_change_1m, price_change(&closes, MONTH_SESSIONS));
    fill(&mut tech.ma_50, trailing_mean(&closes, 50));
    fill(&mut tech.ma_200, trailing_mean(&closes, 200));
    fill(&mut tech.rsi, rsi(&closes, RSI_PERIOD).last().copied());

    let (line, signal, previous) = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).latest();
    if tech.macd.is_none() && tech.macd_signal.is_none() && signal.is_some() {
        tech.macd = line;
        tech.macd_signal = signal;
        fill(&mut tech.macd_previous, previous);
    }

    if tech.daily_closes.is_empty() {
        tech.daily_closes = closes;
    }
}
