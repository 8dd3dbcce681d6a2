use crate::strategy::zone::Zone;
use std::collections::HashSet;
use std::fmt;

/// Strategy that qualified a signal, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// EMA cloud trend and MA angle both agree with the zone direction
    TrendConfirmed,
    /// Only the MA angle agrees
    SlopeOnly,
}

impl Strategy {
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::TrendConfirmed => "S2",
            Strategy::SlopeOnly => "S3",
        }
    }
}

/// Identity of one notified signal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalKey {
    pub instrument: String,
    pub strategy: Strategy,
    pub zone: Zone,
    pub time: i64,
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.instrument, self.strategy.tag(), self.zone.direction(), self.time)
    }
}

/// Identity of one notified cancellation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CancelKey {
    pub instrument: String,
    pub zone: Zone,
    pub time: i64,
}

impl fmt::Display for CancelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.instrument, self.zone.label(), self.time)
    }
}

/// Memory of signals already sent
///
/// Growth is bounded by wiping the whole set once it passes `capacity`.
/// After a wipe a bar still inside the recent window could notify again.
#[derive(Debug)]
pub struct NotifiedSignals {
    keys: HashSet<SignalKey>,
    capacity: usize,
}

impl NotifiedSignals {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: HashSet::new(),
            capacity,
        }
    }

    /// Record the key; false if it was already notified.
    pub fn insert(&mut self, key: SignalKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Clear everything once the cap is exceeded. Returns true if cleared.
    pub fn enforce_capacity(&mut self) -> bool {
        if self.keys.len() > self.capacity {
            self.keys.clear();
            true
        } else {
            false
        }
    }
}

/// Memory of cancellations already sent
#[derive(Debug, Default)]
pub struct CancelledSignals {
    keys: HashSet<CancelKey>,
}

impl CancelledSignals {
    pub fn insert(&mut self, key: CancelKey) -> bool {
        self.keys.insert(key)
    }

    /// Forget every cancellation of `instrument` in `zone`.
    pub fn reset(&mut self, instrument: &str, zone: Zone) {
        self.keys.retain(|k| !(k.instrument == instrument && k.zone == zone));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: i64) -> SignalKey {
        SignalKey {
            instrument: "XRP_USDT".to_string(),
            strategy: Strategy::TrendConfirmed,
            zone: Zone::Oversold,
            time,
        }
    }

    #[test]
    fn test_same_key_only_once() {
        let mut notified = NotifiedSignals::new(1000);
        assert!(notified.insert(key(60)));
        assert!(!notified.insert(key(60)));
        assert!(notified.insert(key(120)));
        assert_eq!(notified.len(), 2);
    }

    #[test]
    fn test_strategy_is_part_of_identity() {
        let mut notified = NotifiedSignals::new(1000);
        notified.insert(key(60));
        let other = SignalKey {
            strategy: Strategy::SlopeOnly,
            ..key(60)
        };
        assert!(notified.insert(other));
    }

    #[test]
    fn test_capacity_clears_whole_set() {
        let mut notified = NotifiedSignals::new(3);
        for t in 0..3 {
            notified.insert(key(t));
        }
        assert!(!notified.enforce_capacity());

        notified.insert(key(3));
        assert!(notified.enforce_capacity());
        assert!(notified.is_empty());
    }

    #[test]
    fn test_key_text() {
        assert_eq!(key(1_700_000_000).to_string(), "XRP_USDT_S2_LONG_1700000000");
        let cancel = CancelKey {
            instrument: "BTC_USDT".to_string(),
            zone: Zone::Overbought,
            time: 60,
        };
        assert_eq!(cancel.to_string(), "BTC_USDT_OVERBOUGHT_60");
    }

    #[test]
    fn test_cancel_reset_is_scoped() {
        let mut cancelled = CancelledSignals::default();
        for (instrument, zone) in [
            ("XRP_USDT", Zone::Oversold),
            ("XRP_USDT", Zone::Overbought),
            ("BTC_USDT", Zone::Oversold),
        ] {
            cancelled.insert(CancelKey {
                instrument: instrument.to_string(),
                zone,
                time: 60,
            });
        }

        cancelled.reset("XRP_USDT", Zone::Oversold);

        assert_eq!(cancelled.len(), 2);
        assert!(cancelled.insert(CancelKey {
            instrument: "XRP_USDT".to_string(),
            zone: Zone::Oversold,
            time: 60,
        }));
    }
}
