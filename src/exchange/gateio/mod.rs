pub mod types;
pub mod websocket;
pub mod rest;

pub use types::*;
pub use websocket::{ConnectionState, FeedClient, FeedCommand, FeedHandle, FeedSettings};
pub use rest::GateioRestClient;
