use crate::data::Bar;
use crate::exchange::error::HistoryError;
use crate::exchange::gateio::types::WireCandle;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const CANDLES_PATH: &str = "futures/usdt/candlesticks";

/// Gate.io futures REST client (public market data only)
#[derive(Clone)]
pub struct GateioRestClient {
    client: Client,
    base_url: String,
    limit: usize,
}

impl GateioRestClient {
    /// Create new REST client
    ///
    /// `base_url` is the API root, e.g. `https://api.gateio.ws/api/v4`.
    pub fn new(base_url: String, limit: usize) -> Result<Self, HistoryError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            base_url,
            limit,
        })
    }

    pub fn candles_url(&self, instrument: &str, interval: &str) -> Result<Url, HistoryError> {
        let root = format!("{}/", self.base_url.trim_end_matches('/'));
        let mut url = Url::parse(&root)?.join(CANDLES_PATH)?;
        url.query_pairs_mut()
            .append_pair("contract", instrument)
            .append_pair("interval", interval)
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }

    /// Fetch up to `limit` most recent bars, sorted ascending by time.
    pub async fn fetch_candles(&self, instrument: &str, interval: &str) -> Result<Vec<Bar>, HistoryError> {
        let url = self.candles_url(instrument, interval)?;
        info!("Fetching candles from: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(HistoryError::Status { status, body });
        }

        let body = response.text().await?;
        let candles: Vec<WireCandle> = serde_json::from_str(&body)?;

        let mut bars: Vec<Bar> = candles.iter().map(WireCandle::to_bar).collect();
        bars.sort_by_key(|b| b.time);
        debug!("Decoded {} candles for {} ({})", bars.len(), instrument, interval);

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_candles_url() {
        let client = GateioRestClient::new("https://api.gateio.ws/api/v4".to_string(), 2000).unwrap();
        let url = client.candles_url("XRP_USDT", "1m").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.gateio.ws/api/v4/futures/usdt/candlesticks?contract=XRP_USDT&interval=1m&limit=2000"
        );
    }

    #[tokio::test]
    async fn test_fetch_candles_sorts_by_time() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/futures/usdt/candlesticks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("contract".into(), "XRP_USDT".into()),
                Matcher::UrlEncoded("interval".into(), "5m".into()),
                Matcher::UrlEncoded("limit".into(), "2000".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"t": 1700000300, "v": 10, "c": "0.52", "h": "0.53", "l": "0.51", "o": "0.515", "sum": "5"},
                    {"t": 1700000000, "v": 12, "c": "0.51", "h": "0.52", "l": "0.50", "o": "0.505", "sum": "6"}
                ]"#,
            )
            .create_async()
            .await;

        let client = GateioRestClient::new(server.url(), 2000).unwrap();
        let bars = client.fetch_candles("XRP_USDT", "5m").await.unwrap();

        mock.assert_async().await;
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].time, 1_700_000_000);
        assert_eq!(bars[1].close, 0.52);
    }

    #[tokio::test]
    async fn test_fetch_candles_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/futures/usdt/candlesticks")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"label":"INVALID_PARAM_VALUE"}"#)
            .create_async()
            .await;

        let client = GateioRestClient::new(server.url(), 2000).unwrap();
        let err = client.fetch_candles("NOPE_USDT", "1m").await.unwrap_err();

        match err {
            HistoryError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("INVALID_PARAM_VALUE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_candles_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/futures/usdt/candlesticks")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = GateioRestClient::new(server.url(), 2000).unwrap();
        let err = client.fetch_candles("XRP_USDT", "1m").await.unwrap_err();
        assert!(matches!(err, HistoryError::Decode(_)));
    }
}
