use crate::exchange::FeedHandle;
use crate::indicators::IndicatorEngine;
use crate::notify::NotificationSink;
use crate::strategy::alert::{utc_offset, Alert, AlertKind};
use crate::strategy::detector::{DetectorSettings, SignalDetector};
use crate::utils::config::SignalConfig;
use crate::utils::Metrics;
use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Periodic signal detection over the live candle history
///
/// Owns the detector state exclusively; nothing else reads or mutates it.
pub struct SignalEngine {
    feed: FeedHandle,
    indicators: IndicatorEngine,
    detector: SignalDetector,
    sink: Arc<dyn NotificationSink>,
    metrics: Arc<Metrics>,
    instruments: Vec<String>,
    check_interval: Duration,
    offset: FixedOffset,
}

impl SignalEngine {
    pub fn new(
        config: &SignalConfig,
        instruments: Vec<String>,
        feed: FeedHandle,
        indicators: IndicatorEngine,
        sink: Arc<dyn NotificationSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            feed,
            indicators,
            detector: SignalDetector::new(DetectorSettings::from(config)),
            sink,
            metrics,
            instruments,
            check_interval: config.check_interval(),
            offset: utc_offset(config.alert_utc_offset_hours),
        }
    }

    pub fn detector(&self) -> &SignalDetector {
        &self.detector
    }

    /// Check every watched instrument once. Returns the number of alerts sent.
    ///
    /// A failing instrument is logged and skipped; the others still run.
    pub fn tick(&mut self) -> usize {
        let mut sent = 0;
        for instrument in self.instruments.clone() {
            match self.check_instrument(&instrument) {
                Ok(n) => sent += n,
                Err(e) => error!("Signal detection failed for {}: {:#}", instrument, e),
            }
        }
        sent
    }

    fn check_instrument(&mut self, instrument: &str) -> Result<usize> {
        let key = self
            .feed
            .active_key(instrument)
            .ok_or_else(|| anyhow!("{} is not streamed by the feed", instrument))?;

        let snapshot = self.indicators.snapshot(&key);
        let price = self.feed.price(instrument);
        let alerts = self.detector.process(instrument, &snapshot, &price);

        for alert in &alerts {
            self.notify(alert);
        }
        Ok(alerts.len())
    }

    fn notify(&self, alert: &Alert) {
        match alert.kind {
            AlertKind::Signal { strategy } => {
                self.metrics
                    .signals_fired
                    .with_label_values(&[strategy, alert.direction()])
                    .inc();
            }
            AlertKind::Cancelled => {
                self.metrics
                    .signals_cancelled
                    .with_label_values(&[alert.direction()])
                    .inc();
            }
        }
        self.sink.send(&alert.format(self.offset));
    }

    /// Tick on the configured interval until shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Signal engine watching {:?} every {:?}",
            self.instruments, self.check_interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sent = self.tick();
                    if sent > 0 {
                        debug!("Signal tick sent {} alert(s)", sent);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Signal engine stopped");
    }
}
