pub mod data;
pub mod exchange;
pub mod indicators;
pub mod strategy;
pub mod notify;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use data::{Bar, SeriesKey, CandleStore, LiveQuote, QuoteCache};
pub use exchange::{FeedClient, FeedHandle, FeedSettings, GateioRestClient, ConnectionState};
pub use indicators::{IndicatorEngine, IndicatorSnapshot, MaAngleSource, SmiParams};
pub use strategy::{Alert, HealthReporter, SignalDetector, SignalEngine, Zone};
pub use notify::NotificationSink;
pub use report::Reporter;
pub use utils::{Config, Metrics};
