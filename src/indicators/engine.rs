use crate::data::{Bar, CandleStore, SeriesKey};
use crate::indicators::ema_cloud::{self, EmaCloudPoint, EmaCloudResult};
use crate::indicators::ma_angles::{self, MaAnglePoint, MaAngleSource, MaAnglesResult};
use crate::indicators::smi::{self, SmiParams, SmiPoint, SmiResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Runs the indicator library over candle store snapshots
///
/// Results are recomputed from scratch on every call; nothing is cached.
#[derive(Clone)]
pub struct IndicatorEngine {
    store: Arc<CandleStore>,
    smi_params: SmiParams,
    fast_length: usize,
    slow_length: usize,
    angle_source: MaAngleSource,
}

/// Bars plus the three indicator results computed over exactly those bars.
#[derive(Debug, Clone)]
pub struct IndicatorSnapshot {
    pub bars: Vec<Bar>,
    pub smi: SmiResult,
    pub ema_cloud: EmaCloudResult,
    pub ma_angles: MaAnglesResult,
}

/// Indicator points keyed by bar time.
///
/// Each indicator starts at a different bar offset, so lookups go through
/// the bar time rather than the point index.
#[derive(Debug, Default)]
pub struct AlignedIndicators {
    pub smi: HashMap<i64, SmiPoint>,
    pub ema_cloud: HashMap<i64, EmaCloudPoint>,
    pub ma_angles: HashMap<i64, MaAnglePoint>,
}

impl IndicatorEngine {
    pub fn new(store: Arc<CandleStore>) -> Self {
        Self {
            store,
            smi_params: SmiParams::default(),
            fast_length: ema_cloud::FAST_LENGTH,
            slow_length: ema_cloud::SLOW_LENGTH,
            angle_source: MaAngleSource::default(),
        }
    }

    pub fn with_angle_source(mut self, source: MaAngleSource) -> Self {
        self.angle_source = source;
        self
    }

    pub fn smi(&self, bars: &[Bar]) -> SmiResult {
        smi::calculate(bars, &self.smi_params)
    }

    pub fn ema_cloud(&self, bars: &[Bar]) -> EmaCloudResult {
        ema_cloud::calculate(bars, self.fast_length, self.slow_length)
    }

    pub fn ma_angles(&self, bars: &[Bar]) -> MaAnglesResult {
        ma_angles::calculate(bars, self.angle_source)
    }

    /// Compute all indicators over the given bars.
    pub fn compute(&self, bars: Vec<Bar>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            smi: self.smi(&bars),
            ema_cloud: self.ema_cloud(&bars),
            ma_angles: self.ma_angles(&bars),
            bars,
        }
    }

    /// Compute all indicators over the current history of `key`.
    pub fn snapshot(&self, key: &SeriesKey) -> IndicatorSnapshot {
        self.compute(self.store.read(key))
    }
}

impl IndicatorSnapshot {
    /// True when every indicator produced at least one point.
    pub fn is_complete(&self) -> bool {
        !self.smi.points.is_empty()
            && !self.ema_cloud.points.is_empty()
            && !self.ma_angles.points.is_empty()
    }

    pub fn aligned(&self) -> AlignedIndicators {
        AlignedIndicators {
            smi: self.smi.points.iter().map(|p| (p.time, *p)).collect(),
            ema_cloud: self.ema_cloud.points.iter().map(|p| (p.time, *p)).collect(),
            ma_angles: self.ma_angles.points.iter().map(|p| (p.time, *p)).collect(),
        }
    }
}
