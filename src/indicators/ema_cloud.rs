use crate::data::Bar;
use crate::indicators::moving_average::ema;
use serde::Serialize;

pub const FAST_LENGTH: usize = 50;
pub const SLOW_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmaCloudPoint {
    pub time: i64,
    pub fast: f64,
    pub slow: f64,
    pub up_trend: bool,
    pub down_trend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaCloudResult {
    pub points: Vec<EmaCloudPoint>,
    pub fast_length: usize,
    pub slow_length: usize,
}

/// Fast/slow EMA trend cloud over closes.
///
/// Points start at bar `slow_length - 1`; fewer bars than `slow_length`
/// gives an empty result.
pub fn calculate(bars: &[Bar], fast_length: usize, slow_length: usize) -> EmaCloudResult {
    let mut result = EmaCloudResult {
        points: Vec::new(),
        fast_length,
        slow_length,
    };
    if slow_length == 0 || bars.len() < slow_length {
        return result;
    }

    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let fast = ema(&close, fast_length);
    let slow = ema(&close, slow_length);

    result.points = (slow_length - 1..bars.len())
        .map(|i| EmaCloudPoint {
            time: bars[i].time,
            fast: fast[i],
            slow: slow[i],
            up_trend: fast[i] > slow[i],
            down_trend: fast[i] < slow[i],
        })
        .collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize, step: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 1000.0 + step * i as f64;
                Bar::new(i as i64 * 60, c, c + 0.5, c - 0.5, c, 1)
            })
            .collect()
    }

    #[test]
    fn test_undefined_below_slow_length() {
        let result = calculate(&trending(199, 1.0), FAST_LENGTH, SLOW_LENGTH);
        assert!(result.points.is_empty());
        assert_eq!(result.slow_length, 200);
    }

    #[test]
    fn test_rising_market_is_up_trend() {
        let bars = trending(300, 1.0);
        let result = calculate(&bars, FAST_LENGTH, SLOW_LENGTH);
        assert_eq!(result.points.len(), 101);
        assert_eq!(result.points[0].time, bars[199].time);

        let last = result.points.last().unwrap();
        assert!(last.up_trend);
        assert!(!last.down_trend);
    }

    #[test]
    fn test_falling_market_is_down_trend() {
        let result = calculate(&trending(300, -1.0), FAST_LENGTH, SLOW_LENGTH);
        let last = result.points.last().unwrap();
        assert!(last.down_trend);
        assert!(!last.up_trend);
    }

    #[test]
    fn test_flat_market_has_no_trend() {
        let result = calculate(&trending(250, 0.0), FAST_LENGTH, SLOW_LENGTH);
        assert!(result.points.iter().all(|p| !p.up_trend && !p.down_trend));
    }
}
