use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Service counters, exported in the Prometheus text format
pub struct Metrics {
    registry: Registry,
    pub frames_received: IntCounter,
    pub frames_dropped: IntCounter,
    pub candles_applied: IntCounter,
    pub candles_stale: IntCounter,
    pub reconnects: IntCounter,
    pub signals_fired: IntCounterVec,
    pub signals_cancelled: IntCounterVec,
    pub notification_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("smi_signal".to_string()), None)?;

        let frames_received = IntCounter::new("frames_received_total", "Websocket text frames received")?;
        let frames_dropped = IntCounter::new("frames_dropped_total", "Frames dropped after a parse failure")?;
        let candles_applied = IntCounter::new("candles_applied_total", "Candle updates merged into the store")?;
        let candles_stale = IntCounter::new(
            "candles_stale_total",
            "Candle updates ignored for an inactive interval or an old bar time",
        )?;
        let reconnects = IntCounter::new("reconnects_total", "Feed reconnect attempts")?;
        let signals_fired = IntCounterVec::new(
            Opts::new("signals_fired_total", "Signals notified, by strategy and direction"),
            &["strategy", "direction"],
        )?;
        let signals_cancelled = IntCounterVec::new(
            Opts::new("signals_cancelled_total", "Signal cancellations notified, by direction"),
            &["direction"],
        )?;
        let notification_failures =
            IntCounter::new("notification_failures_total", "Notification deliveries that failed")?;

        registry.register(Box::new(frames_received.clone()))?;
        registry.register(Box::new(frames_dropped.clone()))?;
        registry.register(Box::new(candles_applied.clone()))?;
        registry.register(Box::new(candles_stale.clone()))?;
        registry.register(Box::new(reconnects.clone()))?;
        registry.register(Box::new(signals_fired.clone()))?;
        registry.register(Box::new(signals_cancelled.clone()))?;
        registry.register(Box::new(notification_failures.clone()))?;

        Ok(Self {
            registry,
            frames_received,
            frames_dropped,
            candles_applied,
            candles_stale,
            reconnects,
            signals_fired,
            signals_cancelled,
            notification_failures,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_prefixed_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.frames_received.inc();
        metrics.signals_fired.with_label_values(&["S2", "LONG"]).inc();

        let text = metrics.render();
        assert!(text.contains("smi_signal_frames_received_total 1"));
        assert!(text.contains("smi_signal_signals_fired_total{direction=\"LONG\",strategy=\"S2\"} 1"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.reconnects.inc();
        assert_eq!(a.reconnects.get(), 1);
        assert_eq!(b.reconnects.get(), 0);
    }
}
