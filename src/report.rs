//! Read-only view for the outer API layer
//!
//! Everything here is a snapshot: quotes and candles are copied out of the
//! shared caches and indicators are recomputed on every call.

use crate::data::{Bar, LiveQuote};
use crate::exchange::FeedHandle;
use crate::indicators::{EmaCloudResult, IndicatorEngine, MaAnglesResult, SmiResult};
use crate::utils::Metrics;
use std::sync::Arc;

#[derive(Clone)]
pub struct Reporter {
    feed: FeedHandle,
    indicators: IndicatorEngine,
    metrics: Arc<Metrics>,
}

impl Reporter {
    pub fn new(feed: FeedHandle, indicators: IndicatorEngine, metrics: Arc<Metrics>) -> Self {
        Self {
            feed,
            indicators,
            metrics,
        }
    }

    /// Live quote; `None` for instruments the feed does not track.
    pub fn quote(&self, instrument: &str) -> Option<LiveQuote> {
        self.feed.quote(instrument)
    }

    /// History of the instrument's active interval, oldest first.
    pub fn candles(&self, instrument: &str) -> Vec<Bar> {
        self.feed.candles(instrument)
    }

    pub fn latest_candle(&self, instrument: &str) -> Option<Bar> {
        self.feed.latest_candle(instrument)
    }

    pub fn smi(&self, instrument: &str) -> SmiResult {
        self.indicators.smi(&self.candles(instrument))
    }

    pub fn ema_cloud(&self, instrument: &str) -> EmaCloudResult {
        self.indicators.ema_cloud(&self.candles(instrument))
    }

    pub fn ma_angles(&self, instrument: &str) -> MaAnglesResult {
        self.indicators.ma_angles(&self.candles(instrument))
    }

    /// Prometheus text exposition of the service counters.
    pub fn metrics_text(&self) -> String {
        self.metrics.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CandleStore, QuoteCache, SeriesKey};
    use crate::exchange::{FeedClient, FeedSettings, GateioRestClient};
    use std::time::Duration;

    fn reporter() -> (Reporter, Arc<CandleStore>, Arc<QuoteCache>) {
        let store = Arc::new(CandleStore::new());
        let quotes = Arc::new(QuoteCache::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let (_client, handle) = FeedClient::new(
            FeedSettings {
                ws_url: "ws://127.0.0.1:1/ws".to_string(),
                default_interval: "1m".to_string(),
                ping_interval: Duration::from_secs(20),
                reconnect_delay: Duration::from_secs(5),
            },
            vec!["XRP_USDT".to_string()],
            Arc::clone(&store),
            Arc::clone(&quotes),
            GateioRestClient::new("http://127.0.0.1:1".to_string(), 2000).unwrap(),
            Arc::clone(&metrics),
        );
        let reporter = Reporter::new(handle, IndicatorEngine::new(Arc::clone(&store)), metrics);
        (reporter, store, quotes)
    }

    #[test]
    fn test_quote_defaults_until_first_ticker() {
        let (reporter, _store, quotes) = reporter();

        let quote = reporter.quote("XRP_USDT").unwrap();
        assert_eq!(quote.last_price, "0");
        assert_eq!(quote.change_percent, "0");
        assert!(quote.last_update.is_none());

        quotes.update("XRP_USDT", "0.61", "1.5");
        assert_eq!(reporter.quote("XRP_USDT").unwrap().last_price, "0.61");
        assert!(reporter.quote("DOGE_USDT").is_none());
    }

    #[test]
    fn test_indicators_over_current_history() {
        let (reporter, store, _quotes) = reporter();
        let bars = (0..300)
            .map(|i| {
                let c = 0.6 + (i as f64 / 11.0).sin() * 0.02;
                Bar::new(i * 60, c, c + 0.001, c - 0.001, c, 10)
            })
            .collect();
        store.bulk_replace(&SeriesKey::new("XRP_USDT", "1m"), bars);

        assert_eq!(reporter.candles("XRP_USDT").len(), 300);
        assert_eq!(reporter.latest_candle("XRP_USDT").unwrap().time, 299 * 60);
        assert_eq!(reporter.smi("XRP_USDT").points.len(), 291);
        assert_eq!(reporter.ema_cloud("XRP_USDT").points.len(), 101);
        assert_eq!(reporter.ma_angles("XRP_USDT").points.len(), 250);
        assert!(reporter.smi("BTC_USDT").points.is_empty());
    }

    #[test]
    fn test_results_serialize() {
        let (reporter, _store, _quotes) = reporter();
        let json = serde_json::to_value(reporter.quote("XRP_USDT")).unwrap();
        assert_eq!(json["last_price"], "0");
        assert!(reporter.metrics_text().contains("smi_signal_frames_received_total 0"));
    }
}
