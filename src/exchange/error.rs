use thiserror::Error;

/// Failures on the streaming connection or in a single inbound frame.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket connection failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("websocket stream error: {0}")]
    Stream(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("websocket connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("malformed frame: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected frame shape: {0}")]
    Shape(String),
}

/// Failures loading bar history over REST.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("history request returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid history url: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed history response: {0}")]
    Decode(#[from] serde_json::Error),
}
