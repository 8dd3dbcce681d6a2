use crate::data::Bar;
use crate::exchange::error::FeedError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHANNEL_TICKERS: &str = "futures.tickers";
pub const CHANNEL_CANDLESTICKS: &str = "futures.candlesticks";
pub const CHANNEL_PING: &str = "futures.ping";

pub const EVENT_SUBSCRIBE: &str = "subscribe";
pub const EVENT_UNSUBSCRIBE: &str = "unsubscribe";
pub const EVENT_UPDATE: &str = "update";

/// Outbound request frame
///
/// Subscriptions carry `event` and `payload`; the keep-alive frame only has
/// `time` and `channel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    pub time: i64,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<String>>,
}

impl OutboundFrame {
    pub fn ping(time: i64) -> Self {
        Self {
            time,
            channel: CHANNEL_PING.to_string(),
            event: None,
            payload: None,
        }
    }

    pub fn ticker(time: i64, event: &str, instrument: &str) -> Self {
        Self {
            time,
            channel: CHANNEL_TICKERS.to_string(),
            event: Some(event.to_string()),
            payload: Some(vec![instrument.to_string()]),
        }
    }

    pub fn candlesticks(time: i64, event: &str, interval: &str, instrument: &str) -> Self {
        Self {
            time,
            channel: CHANNEL_CANDLESTICKS.to_string(),
            event: Some(event.to_string()),
            payload: Some(vec![interval.to_string(), instrument.to_string()]),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain strings and integers only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Inbound frame envelope. `result` is an array for updates and an object
/// for subscription acks.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub result: Value,
}

impl InboundFrame {
    pub fn is_update(&self) -> bool {
        self.event == EVENT_UPDATE
    }

    /// Decode `result` as a list of `T`, accepting a single object too.
    pub fn results<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, FeedError> {
        match &self.result {
            Value::Array(items) => items
                .iter()
                .map(|item| serde_json::from_value(item.clone()).map_err(FeedError::from))
                .collect(),
            Value::Object(_) => Ok(vec![serde_json::from_value(self.result.clone())?]),
            Value::Null => Ok(Vec::new()),
            other => Err(FeedError::Shape(format!("result is {}", other))),
        }
    }
}

/// Ticker update item
#[derive(Debug, Clone, Deserialize)]
pub struct TickerUpdate {
    pub contract: String,
    #[serde(deserialize_with = "string_or_number")]
    pub last: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub change_percentage: String,
}

/// Candle item, shared by websocket updates and the REST history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCandle {
    /// Composite `{interval}_{contract}` name; only present on the stream.
    #[serde(default)]
    pub n: Option<String>,
    #[serde(deserialize_with = "i64_lenient")]
    pub t: i64,
    #[serde(deserialize_with = "f64_lenient")]
    pub o: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub h: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub l: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub c: f64,
    #[serde(default, deserialize_with = "i64_lenient")]
    pub v: i64,
}

impl WireCandle {
    pub fn to_bar(&self) -> Bar {
        Bar::new(self.t, self.o, self.h, self.l, self.c, self.v)
    }

    /// Split the composite name into `(interval, instrument)`,
    /// e.g. `"1m_XRP_USDT"` -> `("1m", "XRP_USDT")`.
    pub fn interval_and_instrument(&self) -> Option<(&str, &str)> {
        split_candle_name(self.n.as_deref()?)
    }
}

pub fn split_candle_name(name: &str) -> Option<(&str, &str)> {
    let (interval, instrument) = name.split_once('_')?;
    if interval.is_empty() || instrument.is_empty() {
        return None;
    }
    Some((interval, instrument))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected string or number, got {}", other))),
    }
}

fn f64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => s.trim().parse::<f64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected price, got {}", other))),
    }
}

fn i64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f as i64))
                .map_err(de::Error::custom)
        }
        Value::Null => Ok(0),
        other => Err(de::Error::custom(format!("expected integer, got {}", other))),
    }
}
