use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Latest ticker values for one instrument, kept as the venue sent them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveQuote {
    pub last_price: String,
    pub last_update: Option<DateTime<Utc>>,
    pub change_percent: String,
}

impl Default for LiveQuote {
    fn default() -> Self {
        Self {
            last_price: "0".to_string(),
            last_update: None,
            change_percent: "0".to_string(),
        }
    }
}

/// Per-instrument live quote cache, written only by ticker frames.
#[derive(Default)]
pub struct QuoteCache {
    quotes: DashMap<String, LiveQuote>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an instrument with the neutral default quote.
    pub fn track(&self, instrument: &str) {
        self.quotes.entry(instrument.to_string()).or_default();
    }

    /// Apply a ticker update. Untracked instruments are ignored.
    pub fn update(&self, instrument: &str, last_price: &str, change_percent: &str) -> bool {
        match self.quotes.get_mut(instrument) {
            Some(mut quote) => {
                quote.last_price = last_price.to_string();
                quote.change_percent = change_percent.to_string();
                quote.last_update = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, instrument: &str) -> Option<LiveQuote> {
        self.quotes.get(instrument).map(|q| q.clone())
    }

    /// Last traded price, "0" when nothing has been received.
    pub fn price(&self, instrument: &str) -> String {
        self.quotes
            .get(instrument)
            .map(|q| q.last_price.clone())
            .unwrap_or_else(|| "0".to_string())
    }
}
