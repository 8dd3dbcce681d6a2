use crate::data::types::{Bar, SeriesKey};
use dashmap::DashMap;
use std::collections::VecDeque;

/// Maximum number of bars retained per series.
pub const MAX_BARS: usize = 2000;

/// What `CandleStore::upsert` did with a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Appended,
    Replaced,
    /// Older than the last stored bar; ignored.
    Stale,
}

/// Keyed rolling history of OHLCV bars
///
/// Shared between the feed client (writer) and the analysis/reporting side
/// (readers). Each series lives behind its own map entry, so writes to a key
/// are serialized and readers only ever receive copies.
///
/// Series invariant: sorted ascending by `time`, no duplicate times, at most
/// `capacity` bars (oldest evicted first).
pub struct CandleStore {
    series: DashMap<SeriesKey, VecDeque<Bar>>,
    capacity: usize,
}

impl CandleStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_BARS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Merge a single bar into the series for `key`.
    ///
    /// Same time as the last bar replaces it (still-open interval), a newer
    /// time appends, an older time is dropped.
    pub fn upsert(&self, key: &SeriesKey, bar: Bar) -> UpsertOutcome {
        let mut series = self.series.entry(key.clone()).or_default();

        let last_time = match series.back() {
            Some(last) => last.time,
            None => {
                series.push_back(bar);
                return UpsertOutcome::Appended;
            }
        };

        if bar.time == last_time {
            if let Some(last) = series.back_mut() {
                *last = bar;
            }
            UpsertOutcome::Replaced
        } else if bar.time > last_time {
            series.push_back(bar);
            while series.len() > self.capacity {
                series.pop_front();
            }
            UpsertOutcome::Appended
        } else {
            UpsertOutcome::Stale
        }
    }

    /// Swap the whole series for `key` (initial history load).
    ///
    /// Bars are sorted by time; duplicates keep the later entry and only the
    /// newest `capacity` bars are retained. Returns the stored length.
    pub fn bulk_replace(&self, key: &SeriesKey, mut bars: Vec<Bar>) -> usize {
        bars.sort_by_key(|b| b.time);

        let mut series: VecDeque<Bar> = VecDeque::with_capacity(bars.len().min(self.capacity));
        for bar in bars {
            match series.back_mut() {
                Some(last) if last.time == bar.time => *last = bar,
                _ => series.push_back(bar),
            }
        }
        while series.len() > self.capacity {
            series.pop_front();
        }

        let len = series.len();
        self.series.insert(key.clone(), series);
        len
    }

    /// Snapshot copy of the series; empty if the key is unknown.
    pub fn read(&self, key: &SeriesKey) -> Vec<Bar> {
        self.series
            .get(key)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, key: &SeriesKey) -> Option<Bar> {
        self.series.get(key).and_then(|s| s.back().copied())
    }

    pub fn len(&self, key: &SeriesKey) -> usize {
        self.series.get(key).map(|s| s.len()).unwrap_or(0)
    }

    pub fn keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<SeriesKey> = self.series.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl Default for CandleStore {
    fn default() -> Self {
        Self::new()
    }
}
