use crate::notify::{check_status, spawn_delivery, NotificationSink, NotifyError};
use crate::utils::Metrics;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Telegram Bot API notifier (`sendMessage`, Markdown)
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    metrics: Arc<Metrics>,
}

impl TelegramNotifier {
    /// `api_url` is the Bot API root, normally `https://api.telegram.org`.
    pub fn new(api_url: String, bot_token: String, chat_id: String, metrics: Arc<Metrics>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let endpoint = format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), bot_token);
        Ok(Self {
            client,
            endpoint,
            chat_id,
            metrics,
        })
    }

    pub async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        post(&self.client, &self.endpoint, &self.chat_id, text).await
    }
}

async fn post(client: &Client, endpoint: &str, chat_id: &str, text: &str) -> Result<(), NotifyError> {
    let body = json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "Markdown",
    });
    let response = client.post(endpoint).json(&body).send().await?;
    check_status(response).await
}

impl NotificationSink for TelegramNotifier {
    fn send(&self, text: &str) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let chat_id = self.chat_id.clone();
        let text = text.to_string();
        spawn_delivery("Telegram", Arc::clone(&self.metrics), async move {
            post(&client, &endpoint, &chat_id, &text).await
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_deliver_send_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": "-100200",
                "text": "hello",
                "parse_mode": "Markdown"
            })))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let notifier = TelegramNotifier::new(
            server.url(),
            "123:abc".to_string(),
            "-100200".to_string(),
            Arc::new(Metrics::new().unwrap()),
        )
        .unwrap();
        notifier.deliver("hello").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_error_hides_bot_token() {
        // nothing listens on port 1, so the request fails before any response
        let notifier = TelegramNotifier::new(
            "http://127.0.0.1:1".to_string(),
            "SECRET123:tok".to_string(),
            "1".to_string(),
            Arc::new(Metrics::new().unwrap()),
        )
        .unwrap();

        let err = notifier.deliver("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));

        let line = format!("Failed to send Telegram notification: {}", err);
        assert!(!line.contains("SECRET123"), "{}", line);
        assert!(!format!("{:?}", err).contains("SECRET123"));
    }

    #[tokio::test]
    async fn test_failed_send_is_counted_not_raised() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botbad/sendMessage")
            .with_status(401)
            .create_async()
            .await;

        let metrics = Arc::new(Metrics::new().unwrap());
        let notifier = TelegramNotifier::new(server.url(), "bad".to_string(), "1".to_string(), Arc::clone(&metrics)).unwrap();
        notifier.send("alert");

        for _ in 0..50 {
            if metrics.notification_failures.get() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        mock.assert_async().await;
        assert_eq!(metrics.notification_failures.get(), 1);
    }
}
