use crate::data::Bar;
use crate::indicators::angle::angle_slope;
use crate::indicators::moving_average::{ema, jma};
use crate::indicators::volatility::atr;
use serde::{Deserialize, Serialize};

/// Angle threshold reported alongside the points.
pub const THRESHOLD: f64 = 2.0;
/// Minimum bars before any point is produced.
pub const MIN_BARS: usize = 280;
/// First bar index that gets a point (smoothing warm-up).
pub const WARMUP: usize = 50;

const ATR_PERIOD: usize = 14;
const EMA_LINE_PERIOD: usize = 10;
const MA27_PERIOD: usize = 27;
const JMA_LENGTH: usize = 7;
const JMA_PHASE: i32 = 50;
const JMA_POWER: i32 = 2;

/// Which smoothing line the angle is measured on.
///
/// The live pipeline measures the angle of an EMA(10) of closes; the Jurik
/// line is kept selectable for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaAngleSource {
    #[default]
    Ema,
    Jma,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaAnglePoint {
    pub time: i64,
    /// Angle of the smoothing line in degrees
    pub slope: f64,
    pub ma27_rising: bool,
    pub ma27_falling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaAnglesResult {
    pub points: Vec<MaAnglePoint>,
    pub threshold: f64,
    pub source: MaAngleSource,
}

pub fn calculate(bars: &[Bar], source: MaAngleSource) -> MaAnglesResult {
    let mut result = MaAnglesResult {
        points: Vec::new(),
        threshold: THRESHOLD,
        source,
    };
    if bars.len() < MIN_BARS {
        return result;
    }

    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let atr = atr(&high, &low, &close, ATR_PERIOD);
    let line = match source {
        MaAngleSource::Ema => ema(&close, EMA_LINE_PERIOD),
        MaAngleSource::Jma => jma(&close, JMA_LENGTH, JMA_PHASE, JMA_POWER),
    };
    let slope = angle_slope(&line, &atr);
    let ma27 = ema(&close, MA27_PERIOD);

    result.points = (WARMUP..bars.len())
        .map(|i| MaAnglePoint {
            time: bars[i].time,
            slope: slope[i],
            ma27_rising: ma27[i] > ma27[i - 1],
            ma27_falling: ma27[i] < ma27[i - 1],
        })
        .collect();
    result
}
