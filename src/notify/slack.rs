use crate::notify::{check_status, spawn_delivery, NotificationSink, NotifyError};
use crate::utils::Metrics;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Slack incoming-webhook notifier
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    metrics: Arc<Metrics>,
}

impl SlackNotifier {
    pub fn new(webhook_url: String, metrics: Arc<Metrics>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            webhook_url,
            metrics,
        })
    }

    /// Post one message and wait for the webhook response.
    pub async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        post(&self.client, &self.webhook_url, text).await
    }
}

async fn post(client: &Client, url: &str, text: &str) -> Result<(), NotifyError> {
    let response = client.post(url).json(&json!({ "text": text })).send().await?;
    check_status(response).await
}

impl NotificationSink for SlackNotifier {
    fn send(&self, text: &str) {
        let client = self.client.clone();
        let url = self.webhook_url.clone();
        let text = text.to_string();
        spawn_delivery("Slack", Arc::clone(&self.metrics), async move {
            post(&client, &url, &text).await
        });
    }
}
