use crate::data::Bar;
use crate::indicators::moving_average::{ema, sma};
use serde::{Deserialize, Serialize};

/// Stochastic Momentum Index parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmiParams {
    /// Window for the high/low extremes (`a`, "%K length")
    pub k_length: usize,
    /// EMA period applied to range and relative distance (`b`)
    pub d_length: usize,
    /// EMA period of the signal line (`c`)
    pub signal_length: usize,
    /// SMA period smoothing the raw SMI
    pub smooth_period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for SmiParams {
    fn default() -> Self {
        Self {
            k_length: 10,
            d_length: 3,
            signal_length: 10,
            smooth_period: 5,
            overbought: 40.0,
            oversold: -40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmiPoint {
    pub time: i64,
    pub smi: f64,
    pub signal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmiResult {
    pub points: Vec<SmiPoint>,
    pub overbought: f64,
    pub oversold: f64,
}

impl SmiResult {
    fn empty(params: &SmiParams) -> Self {
        Self {
            points: Vec::new(),
            overbought: params.overbought,
            oversold: params.oversold,
        }
    }
}

/// Raw SMI from smoothed relative distance and smoothed range.
///
/// A zero range means price has not moved across the window; the point is 0.
pub fn raw_smi(avg_rel: f64, avg_diff: f64) -> f64 {
    if avg_diff != 0.0 {
        avg_rel / (avg_diff / 2.0) * 100.0
    } else {
        0.0
    }
}

/// Compute the SMI line and its EMA signal line.
///
/// The first point belongs to bar `k_length - 1`, the first bar with a full
/// high/low window.
pub fn calculate(bars: &[Bar], params: &SmiParams) -> SmiResult {
    let k = params.k_length.max(1);
    if bars.len() < k {
        return SmiResult::empty(params);
    }

    let windows = bars.len() - k + 1;
    let mut diff = Vec::with_capacity(windows);
    let mut rdiff = Vec::with_capacity(windows);
    let mut times = Vec::with_capacity(windows);

    for window in bars.windows(k) {
        let (hh, ll) = window.iter().fold((f64::NEG_INFINITY, f64::INFINITY), |(hh, ll), b| {
            (hh.max(b.high), ll.min(b.low))
        });
        let current = window[k - 1];

        diff.push(hh - ll);
        rdiff.push(current.close - (hh + ll) / 2.0);
        times.push(current.time);
    }

    let avg_rel = ema(&rdiff, params.d_length);
    let avg_diff = ema(&diff, params.d_length);

    let raw: Vec<f64> = avg_rel
        .iter()
        .zip(&avg_diff)
        .map(|(&rel, &d)| raw_smi(rel, d))
        .collect();

    let smoothed = sma(&raw, params.smooth_period);
    let signal = ema(&smoothed, params.signal_length);

    let points = times
        .into_iter()
        .zip(smoothed.into_iter().zip(signal))
        .map(|(time, (smi, signal))| SmiPoint { time, smi, signal })
        .collect();

    SmiResult {
        points,
        overbought: params.overbought,
        oversold: params.oversold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_bars(n: usize) -> Vec<Bar> {
        (0..n as i64).map(|t| Bar::new(t * 60, 1.0, 1.0, 1.0, 1.0, 0)).collect()
    }

    #[test]
    fn test_insufficient_bars_yields_empty() {
        let result = calculate(&flat_bars(9), &SmiParams::default());
        assert!(result.points.is_empty());
        assert_eq!(result.overbought, 40.0);
        assert_eq!(result.oversold, -40.0);
    }

    #[test]
    fn test_zero_range_is_zero_smi() {
        assert_eq!(raw_smi(3.0, 0.0), 0.0);

        let result = calculate(&flat_bars(40), &SmiParams::default());
        assert_eq!(result.points.len(), 31);
        assert!(result.points.iter().all(|p| p.smi == 0.0 && p.signal == 0.0));
    }

    #[test]
    fn test_points_align_with_bar_times() {
        let bars = flat_bars(15);
        let result = calculate(&bars, &SmiParams::default());
        assert_eq!(result.points.first().map(|p| p.time), Some(bars[9].time));
        assert_eq!(result.points.last().map(|p| p.time), Some(bars[14].time));
    }

    #[test]
    fn test_close_at_window_high_is_strongly_positive() {
        // steady uptrend closing at the high of every bar
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let base = 100.0 + i as f64;
                Bar::new(i * 60, base, base + 1.0, base - 1.0, base + 1.0, 1)
            })
            .collect();

        let result = calculate(&bars, &SmiParams::default());
        let last = result.points.last().unwrap();
        assert!(last.smi > 40.0, "smi = {}", last.smi);
        assert!(last.smi <= 100.0);
    }

    #[test]
    fn test_close_at_window_low_is_strongly_negative() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let base = 200.0 - i as f64;
                Bar::new(i * 60, base, base + 1.0, base - 1.0, base - 1.0, 1)
            })
            .collect();

        let result = calculate(&bars, &SmiParams::default());
        assert!(result.points.last().unwrap().smi < -40.0);
    }
}
