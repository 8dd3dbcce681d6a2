pub mod zone;
pub mod dedup;
pub mod alert;
pub mod detector;
pub mod engine;
pub mod health;

pub use zone::{Zone, ZoneRules};
pub use dedup::{CancelKey, NotifiedSignals, SignalKey, Strategy};
pub use alert::{Alert, AlertKind};
pub use detector::{DetectorSettings, SignalDetector};
pub use engine::SignalEngine;
pub use health::{build_report, HealthReporter, InstrumentHealth};
