use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLCV observation for a fixed interval.
///
/// `time` is the bar open time in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: i64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Identifies one bounded bar sequence, e.g. `(XRP_USDT, 1m)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub instrument: String,
    pub interval: String,
}

impl SeriesKey {
    pub fn new(instrument: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            interval: interval.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.instrument, self.interval)
    }
}
