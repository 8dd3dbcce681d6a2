pub mod error;
pub mod gateio;

pub use error::{FeedError, HistoryError};
pub use gateio::{ConnectionState, FeedClient, FeedCommand, FeedHandle, FeedSettings, GateioRestClient};
