use crate::data::Bar;
use crate::exchange::FeedHandle;
use crate::notify::NotificationSink;
use crate::strategy::alert::{coin_name, utc_offset};
use crate::utils::config::HealthConfig;
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Bars covering one day at one-minute resolution
pub const DAY_BARS: usize = 1440;

/// Per-instrument summary line of a health report
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentHealth {
    pub close: f64,
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
}

impl InstrumentHealth {
    /// Summary over the last `DAY_BARS` bars; `None` for an empty series.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let latest = bars.last()?;
        let window = &bars[bars.len().saturating_sub(DAY_BARS)..];
        let reference = window.first()?.open;
        let change_percent = if reference != 0.0 {
            (latest.close - reference) / reference * 100.0
        } else {
            0.0
        };
        let high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        Some(Self {
            close: latest.close,
            change_percent,
            high,
            low,
        })
    }
}

/// Markdown health report for the given instruments.
pub fn build_report(now: DateTime<Utc>, offset: FixedOffset, series: &[(String, Vec<Bar>)]) -> String {
    let mut report = format!(
        ":white_check_mark: *Health check* ({})\n",
        now.with_timezone(&offset).format("%m/%d %H:%M")
    );

    for (instrument, bars) in series {
        let coin = coin_name(instrument);
        let Some(health) = InstrumentHealth::from_bars(bars) else {
            let _ = writeln!(report, "> *{}*: no data", coin);
            continue;
        };

        let decimals = if coin == "BTC" { 1 } else { 4 };
        let sign = if health.change_percent >= 0.0 { "+" } else { "" };
        let _ = writeln!(
            report,
            "> *{}*: {:.*} USDT ({}{:.2}%)",
            coin, decimals, health.close, sign, health.change_percent
        );
        let _ = writeln!(
            report,
            ">   24h H: {:.*} / L: {:.*}",
            decimals, health.high, decimals, health.low
        );
    }
    report
}

/// Sends the health report on a fixed interval
pub struct HealthReporter {
    feed: FeedHandle,
    sink: Arc<dyn NotificationSink>,
    instruments: Vec<String>,
    interval: Duration,
    offset: FixedOffset,
}

impl HealthReporter {
    pub fn new(
        config: &HealthConfig,
        utc_offset_hours: i32,
        instruments: Vec<String>,
        feed: FeedHandle,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            feed,
            sink,
            instruments,
            interval: config.report_interval(),
            offset: utc_offset(utc_offset_hours),
        }
    }

    pub fn report(&self) -> String {
        let series: Vec<(String, Vec<Bar>)> = self
            .instruments
            .iter()
            .map(|instrument| (instrument.clone(), self.feed.candles(instrument)))
            .collect();
        build_report(Utc::now(), self.offset, &series)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; the first report is one interval in
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sink.send(&self.report());
                    info!("Health check sent");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
