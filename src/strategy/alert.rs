use crate::strategy::dedup::Strategy;
use crate::strategy::zone::Zone;
use chrono::{FixedOffset, Offset, TimeZone, Utc};
use serde::Serialize;

/// What an alert announces
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AlertKind {
    Signal { strategy: &'static str },
    Cancelled,
}

/// One notification produced by the signal detector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub instrument: String,
    pub zone: Zone,
    pub kind: AlertKind,
    /// Bar time the alert refers to (unix seconds)
    pub time: i64,
    pub price: String,
    pub smi: f64,
    /// MA angle slope at the bar; absent on cancellations
    pub slope: Option<f64>,
}

impl Alert {
    pub fn signal(instrument: &str, zone: Zone, strategy: Strategy, time: i64, price: &str, smi: f64, slope: f64) -> Self {
        Self {
            instrument: instrument.to_string(),
            zone,
            kind: AlertKind::Signal { strategy: strategy.tag() },
            time,
            price: price.to_string(),
            smi,
            slope: Some(slope),
        }
    }

    pub fn cancelled(instrument: &str, zone: Zone, time: i64, price: &str, smi: f64) -> Self {
        Self {
            instrument: instrument.to_string(),
            zone,
            kind: AlertKind::Cancelled,
            time,
            price: price.to_string(),
            smi,
            slope: None,
        }
    }

    pub fn direction(&self) -> &'static str {
        self.zone.direction()
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, AlertKind::Cancelled)
    }

    /// Markdown message text with the bar time shown at `offset`.
    pub fn format(&self, offset: FixedOffset) -> String {
        let coin = coin_name(&self.instrument);
        let time = format_bar_time(self.time, offset);
        match self.kind {
            AlertKind::Signal { strategy } => {
                let (icon, reason) = match self.zone {
                    Zone::Oversold => (":chart_with_upwards_trend:", "oversold rebound"),
                    Zone::Overbought => (":chart_with_downwards_trend:", "overbought reversal"),
                };
                format!(
                    "{icon} *[{strategy}] [{coin}] {} signal*\n\
                     > Time: {time}\n\
                     > Price: {} USDT\n\
                     > SMI: {:.1} ({reason})\n\
                     > MA Angles: slope {:.2}",
                    self.direction(),
                    self.price,
                    self.smi,
                    self.slope.unwrap_or_default(),
                )
            }
            AlertKind::Cancelled => format!(
                ":x: *[Cancelled] [{coin}] {} signal withdrawn*\n\
                 > Time: {time}\n\
                 > Price: {} USDT\n\
                 > SMI: {:.1} (condition no longer met)",
                self.direction(),
                self.price,
                self.smi,
            ),
        }
    }
}

/// Instrument name without the quote currency suffix.
pub fn coin_name(instrument: &str) -> &str {
    instrument.strip_suffix("_USDT").unwrap_or(instrument)
}

/// Offset east of UTC; out-of-range hours fall back to UTC.
pub fn utc_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.saturating_mul(3600)).unwrap_or(Utc.fix())
}

/// `MM/dd HH:mm` at the given offset.
pub fn format_bar_time(time: i64, offset: FixedOffset) -> String {
    match Utc.timestamp_opt(time, 0).single() {
        Some(dt) => dt.with_timezone(&offset).format("%m/%d %H:%M").to_string(),
        None => time.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-05 00:30:00 UTC
    const BAR_TIME: i64 = 1_709_598_600;

    #[test]
    fn test_bar_time_in_offset() {
        assert_eq!(format_bar_time(BAR_TIME, utc_offset(9)), "03/05 09:30");
        assert_eq!(format_bar_time(BAR_TIME, utc_offset(0)), "03/05 00:30");
        assert_eq!(format_bar_time(BAR_TIME, utc_offset(-1)), "03/04 23:30");
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        assert_eq!(utc_offset(30).local_minus_utc(), 0);
    }

    #[test]
    fn test_coin_name() {
        assert_eq!(coin_name("XRP_USDT"), "XRP");
        assert_eq!(coin_name("BTC_USD"), "BTC_USD");
    }

    #[test]
    fn test_signal_message() {
        let alert = Alert::signal("XRP_USDT", Zone::Oversold, Strategy::TrendConfirmed, BAR_TIME, "0.6123", -45.26, 1.234);
        let text = alert.format(utc_offset(9));

        assert!(text.starts_with(":chart_with_upwards_trend: *[S2] [XRP] LONG signal*"));
        assert!(text.contains("> Time: 03/05 09:30"));
        assert!(text.contains("> Price: 0.6123 USDT"));
        assert!(text.contains("> SMI: -45.3 (oversold rebound)"));
        assert!(text.contains("> MA Angles: slope 1.23"));
    }

    #[test]
    fn test_cancellation_message() {
        let alert = Alert::cancelled("BTC_USDT", Zone::Overbought, BAR_TIME, "64000.1", 35.0);
        let text = alert.format(utc_offset(9));

        assert!(alert.is_cancellation());
        assert!(text.starts_with(":x: *[Cancelled] [BTC] SHORT signal withdrawn*"));
        assert!(text.contains("> SMI: 35.0 (condition no longer met)"));
        assert!(!text.contains("MA Angles"));
    }
}
