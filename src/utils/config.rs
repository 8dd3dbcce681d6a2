use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub exchange: ExchangeConfig,
    pub signals: SignalConfig,
    pub health: HealthConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub environment: String,
    /// Futures contracts to stream, e.g. `XRP_USDT`
    pub instruments: Vec<String>,
    pub default_interval: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            instruments: vec!["XRP_USDT".to_string(), "BTC_USDT".to_string()],
            default_interval: "1m".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub name: String,
    pub ws_endpoint: String,
    pub api_endpoint: String,
    pub history_limit: usize,
    pub ping_interval_secs: u64,
    pub reconnect_delay_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: "gateio".to_string(),
            ws_endpoint: "wss://fx-ws.gateio.ws/v4/ws/usdt".to_string(),
            api_endpoint: "https://api.gateio.ws/api/v4".to_string(),
            history_limit: 2000,
            ping_interval_secs: 20,
            reconnect_delay_secs: 5,
        }
    }
}

impl ExchangeConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub enabled: bool,
    /// Instruments the signal engine watches; empty means all streamed ones
    pub instruments: Vec<String>,
    pub check_interval_secs: u64,
    pub min_bars: usize,
    pub recent_bars: usize,
    pub dwell_bars: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub dedup_capacity: usize,
    /// UTC offset used when printing bar times in alerts
    pub alert_utc_offset_hours: i32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            instruments: vec!["XRP_USDT".to_string()],
            check_interval_secs: 10,
            min_bars: 300,
            recent_bars: 5,
            dwell_bars: 4,
            oversold: -40.0,
            overbought: 40.0,
            dedup_capacity: 1000,
            alert_utc_offset_hours: 9,
        }
    }
}

impl SignalConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub report_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            report_interval_secs: 600,
        }
    }
}

impl HealthConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }
}

/// Notification transports. Secrets may also come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub slack_webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: "https://api.telegram.org".to_string(),
        }
    }
}

impl NotifyConfig {
    pub fn slack_webhook_url(&self) -> Option<String> {
        setting("SLACK_WEBHOOK_URL", &self.slack_webhook_url)
            .filter(|url| !url.contains("YOUR/WEBHOOK/URL"))
    }

    pub fn telegram_bot_token(&self) -> Option<String> {
        setting("TELEGRAM_BOT_TOKEN", &self.telegram_bot_token)
    }

    pub fn telegram_chat_id(&self) -> Option<String> {
        setting("TELEGRAM_CHAT_ID", &self.telegram_chat_id)
    }
}

/// Environment variable first, then the file value; blanks count as unset.
fn setting(env_key: &str, file_value: &Option<String>) -> Option<String> {
    std::env::var(env_key)
        .ok()
        .or_else(|| file_value.clone())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load from environment variable or default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_FILE")
            .unwrap_or_else(|_| "config/default.toml".to_string());
        Self::from_file(path)
    }

    /// Instruments the signal engine should watch.
    pub fn signal_instruments(&self) -> Vec<String> {
        if self.signals.instruments.is_empty() {
            self.general.instruments.clone()
        } else {
            self.signals
                .instruments
                .iter()
                .filter(|i| self.general.instruments.contains(i))
                .cloned()
                .collect()
        }
    }
}
