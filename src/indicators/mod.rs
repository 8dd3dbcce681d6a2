//! Indicator library and engine
//!
//! The free functions in `moving_average`, `volatility` and `angle` are pure
//! series transforms. `smi`, `ema_cloud` and `ma_angles` turn a bar slice into
//! time-keyed result points, and `engine` runs all three over a store snapshot.
//!
//! Every function fails closed: too little input yields an empty result.

pub mod moving_average;
pub mod volatility;
pub mod angle;
pub mod smi;
pub mod ema_cloud;
pub mod ma_angles;
pub mod engine;

pub use moving_average::{ema, jma, sma};
pub use volatility::{atr, rma, true_range};
pub use angle::angle_slope;
pub use smi::{SmiParams, SmiPoint, SmiResult};
pub use ema_cloud::{EmaCloudPoint, EmaCloudResult};
pub use ma_angles::{MaAnglePoint, MaAngleSource, MaAnglesResult};
pub use engine::{AlignedIndicators, IndicatorEngine, IndicatorSnapshot};
