use crate::data::Bar;
use crate::indicators::{AlignedIndicators, IndicatorSnapshot};
use crate::strategy::alert::Alert;
use crate::strategy::dedup::{CancelKey, CancelledSignals, NotifiedSignals, SignalKey, Strategy};
use crate::strategy::zone::{Zone, ZoneRules};
use crate::utils::config::SignalConfig;
use std::collections::HashMap;
use tracing::{debug, info};

/// Tuning of the signal detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    pub rules: ZoneRules,
    /// Histories shorter than this are skipped
    pub min_bars: usize,
    /// Number of most recent bars scanned for new signals
    pub recent_bars: usize,
    pub dedup_capacity: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self::from(&SignalConfig::default())
    }
}

impl From<&SignalConfig> for DetectorSettings {
    fn from(config: &SignalConfig) -> Self {
        Self {
            rules: ZoneRules {
                oversold: config.oversold,
                overbought: config.overbought,
                dwell_bars: config.dwell_bars,
            },
            min_bars: config.min_bars,
            recent_bars: config.recent_bars,
            dedup_capacity: config.dedup_capacity,
        }
    }
}

/// Zone-dwell signal state machine
///
/// Tracks at most one active signal per instrument and zone. A new signal
/// can only be recorded once the previous one was cleared, either by the
/// neutral-band reset on the latest bar or by a cancellation.
pub struct SignalDetector {
    settings: DetectorSettings,
    /// (instrument, zone) -> bar time of the active signal
    active: HashMap<(String, Zone), i64>,
    notified: NotifiedSignals,
    cancelled: CancelledSignals,
}

impl SignalDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            notified: NotifiedSignals::new(settings.dedup_capacity),
            settings,
            active: HashMap::new(),
            cancelled: CancelledSignals::default(),
        }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Bar time of the active signal, if any.
    pub fn active_signal(&self, instrument: &str, zone: Zone) -> Option<i64> {
        self.active.get(&(instrument.to_string(), zone)).copied()
    }

    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }

    /// Run one detection pass for `instrument`.
    ///
    /// Order per pass: neutral-band reset from the latest bar, cancellation
    /// of active signals whose bar no longer qualifies, then the scan of the
    /// most recent bars for new signals. Returns the alerts to notify.
    pub fn process(&mut self, instrument: &str, snapshot: &IndicatorSnapshot, price: &str) -> Vec<Alert> {
        let bars = &snapshot.bars;
        if bars.len() < self.settings.min_bars || !snapshot.is_complete() {
            return Vec::new();
        }

        let aligned = snapshot.aligned();
        let smi_at = |j: usize| -> Option<f64> {
            bars.get(j)
                .and_then(|bar| aligned.smi.get(&bar.time))
                .map(|p| p.smi)
        };

        self.reset_on_neutral(instrument, bars, &aligned);

        let mut alerts = Vec::new();
        for zone in Zone::ALL {
            if let Some(alert) = self.check_cancellation(instrument, zone, bars, &aligned, price, &smi_at) {
                alerts.push(alert);
            }
        }

        let start = bars.len().saturating_sub(self.settings.recent_bars).max(1);
        for i in start..bars.len() {
            let cur = &bars[i];
            let prev = &bars[i - 1];
            let (Some(cloud), Some(angle), Some(smi_cur), Some(_)) = (
                aligned.ema_cloud.get(&cur.time),
                aligned.ma_angles.get(&cur.time),
                aligned.smi.get(&cur.time),
                aligned.smi.get(&prev.time),
            ) else {
                continue;
            };

            for zone in Zone::ALL {
                let key = (instrument.to_string(), zone);
                if self.active.contains_key(&key) || !self.settings.rules.scan(zone, i, &smi_at) {
                    continue;
                }

                let (trend_agrees, slope_agrees) = match zone {
                    Zone::Oversold => (cloud.up_trend, angle.slope >= 0.0),
                    Zone::Overbought => (cloud.down_trend, angle.slope < 0.0),
                };
                let strategy = if trend_agrees && slope_agrees {
                    Strategy::TrendConfirmed
                } else if slope_agrees {
                    Strategy::SlopeOnly
                } else {
                    debug!("{} {} zone qualified at {} but slope {:.2} disagrees", instrument, zone, cur.time, angle.slope);
                    continue;
                };

                self.active.insert(key, cur.time);
                let signal = SignalKey {
                    instrument: instrument.to_string(),
                    strategy,
                    zone,
                    time: cur.time,
                };
                let key_text = signal.to_string();
                if self.notified.insert(signal) {
                    info!("[{}] {} signal detected: key={}, smi={:.2}", strategy.tag(), zone.direction(), key_text, smi_cur.smi);
                    alerts.push(Alert::signal(instrument, zone, strategy, cur.time, price, smi_cur.smi, angle.slope));
                }
            }
        }

        if self.notified.enforce_capacity() {
            debug!("Notified signal memory exceeded {} entries; cleared", self.settings.dedup_capacity);
        }
        alerts
    }

    /// Latest SMI back in the neutral band clears the zone immediately.
    fn reset_on_neutral(&mut self, instrument: &str, bars: &[Bar], aligned: &AlignedIndicators) {
        let Some(latest) = bars.last().and_then(|bar| aligned.smi.get(&bar.time)) else {
            return;
        };
        for zone in Zone::ALL {
            if self.settings.rules.has_exited(zone, latest.smi) {
                self.active.remove(&(instrument.to_string(), zone));
                self.cancelled.reset(instrument, zone);
            }
        }
    }

    fn check_cancellation<F>(
        &mut self,
        instrument: &str,
        zone: Zone,
        bars: &[Bar],
        aligned: &AlignedIndicators,
        price: &str,
        smi_at: &F,
    ) -> Option<Alert>
    where
        F: Fn(usize) -> Option<f64>,
    {
        let key = (instrument.to_string(), zone);
        let signal_time = *self.active.get(&key)?;

        // An evicted bar (or the first bar) keeps the record until the neutral reset.
        let idx = bars.iter().position(|b| b.time == signal_time).filter(|&i| i > 0)?;
        if self.settings.rules.scan(zone, idx, smi_at) {
            return None;
        }

        self.active.remove(&key);
        let fresh = self.cancelled.insert(CancelKey {
            instrument: instrument.to_string(),
            zone,
            time: signal_time,
        });
        if !fresh {
            return None;
        }

        info!("{} signal cancelled for {} at {}", zone.direction(), instrument, signal_time);
        let smi = aligned.smi.get(&signal_time).map(|p| p.smi).unwrap_or_default();
        Some(Alert::cancelled(instrument, zone, signal_time, price, smi))
    }
}
