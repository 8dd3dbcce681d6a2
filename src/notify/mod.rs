//! Outbound alert delivery
//!
//! Every sink is fire-and-forget: `send` returns immediately, delivery runs
//! on a spawned task and failures are only logged and counted.

pub mod slack;
pub mod telegram;

pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;

use crate::utils::config::NotifyConfig;
use crate::utils::Metrics;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Something that can deliver a text alert
pub trait NotificationSink: Send + Sync {
    fn send(&self, text: &str);
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(reqwest::Error),

    #[error("notification rejected with {status}: {body}")]
    Status { status: u16, body: String },
}

// Webhook URLs and bot tokens are secrets; never let them reach the log.
impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Http(e.without_url())
    }
}

/// Delivers to every configured sink in order.
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutNotifier {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }
}

impl NotificationSink for FanoutNotifier {
    fn send(&self, text: &str) {
        for sink in &self.sinks {
            sink.send(text);
        }
    }
}

/// Fallback when no transport is configured; alerts only reach the log.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn send(&self, text: &str) {
        warn!("No notification channel configured. Message: {}", text);
    }
}

/// Build the sink described by the config: Telegram then Slack, or the log
/// fallback if neither is configured.
pub fn from_config(config: &NotifyConfig, metrics: Arc<Metrics>) -> anyhow::Result<Arc<dyn NotificationSink>> {
    let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::new();

    if let (Some(token), Some(chat_id)) = (config.telegram_bot_token(), config.telegram_chat_id()) {
        sinks.push(Arc::new(TelegramNotifier::new(
            config.telegram_api_url.clone(),
            token,
            chat_id,
            Arc::clone(&metrics),
        )?));
    } else {
        warn!("Telegram not configured");
    }

    if let Some(webhook) = config.slack_webhook_url() {
        sinks.push(Arc::new(SlackNotifier::new(webhook, Arc::clone(&metrics))?));
    } else {
        warn!("Slack webhook URL not configured");
    }

    if sinks.is_empty() {
        return Ok(Arc::new(LogNotifier));
    }
    info!("Notifications enabled on {} channel(s)", sinks.len());
    Ok(Arc::new(FanoutNotifier::new(sinks)))
}

/// Run a delivery on the current runtime, logging and counting failures.
pub(crate) fn spawn_delivery<F>(channel: &'static str, metrics: Arc<Metrics>, delivery: F)
where
    F: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        error!("No async runtime to deliver {} notification", channel);
        metrics.notification_failures.inc();
        return;
    };

    runtime.spawn(async move {
        match delivery.await {
            Ok(()) => info!("{} notification sent", channel),
            Err(e) => {
                metrics.notification_failures.inc();
                error!("Failed to send {} notification: {}", channel, e);
            }
        }
    });
}

pub(crate) async fn check_status(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::NotificationSink;
    use std::sync::Mutex;

    /// Collects messages in memory.
    #[derive(Default)]
    pub struct MemorySink {
        messages: Mutex<Vec<String>>,
    }

    impl MemorySink {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl NotificationSink for MemorySink {
        fn send(&self, text: &str) {
            self.messages.lock().unwrap().push(text.to_string());
        }
    }
}
