use serde::Serialize;
use std::fmt;

/// SMI extreme region tracked by the signal engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    /// SMI at or below the oversold threshold; rebounds signal LONG
    Oversold,
    /// SMI at or above the overbought threshold; reversals signal SHORT
    Overbought,
}

impl Zone {
    pub const ALL: [Zone; 2] = [Zone::Oversold, Zone::Overbought];

    pub fn label(&self) -> &'static str {
        match self {
            Zone::Oversold => "OVERSOLD",
            Zone::Overbought => "OVERBOUGHT",
        }
    }

    /// Trade direction a signal in this zone points to.
    pub fn direction(&self) -> &'static str {
        match self {
            Zone::Oversold => "LONG",
            Zone::Overbought => "SHORT",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds and minimum dwell for the zone scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneRules {
    pub oversold: f64,
    pub overbought: f64,
    /// Minimum consecutive bars inside the zone, current bar included
    pub dwell_bars: usize,
}

impl Default for ZoneRules {
    fn default() -> Self {
        Self {
            oversold: -40.0,
            overbought: 40.0,
            dwell_bars: 4,
        }
    }
}

impl ZoneRules {
    pub fn contains(&self, zone: Zone, smi: f64) -> bool {
        match zone {
            Zone::Oversold => smi <= self.oversold,
            Zone::Overbought => smi >= self.overbought,
        }
    }

    /// True once the latest SMI has left the zone for the neutral band.
    pub fn has_exited(&self, zone: Zone, smi: f64) -> bool {
        !self.contains(zone, smi)
    }

    /// Zone-dwell predicate at bar `current`.
    ///
    /// `smi_at(j)` yields the SMI of bar `j`, or `None` when no point exists
    /// for it. The current bar must be inside the zone; scanning backward
    /// while bars stay inside must find at least `dwell_bars` bars; and the
    /// current value must have turned away from the dwell extreme (above the
    /// minimum when oversold, below the maximum when overbought).
    pub fn scan<F>(&self, zone: Zone, current: usize, smi_at: F) -> bool
    where
        F: Fn(usize) -> Option<f64>,
    {
        let Some(current_smi) = smi_at(current) else {
            return false;
        };
        if !self.contains(zone, current_smi) {
            return false;
        }

        let mut dwell = 1;
        let mut extreme = current_smi;
        for j in (0..current).rev() {
            match smi_at(j) {
                Some(smi) if self.contains(zone, smi) => {
                    dwell += 1;
                    extreme = match zone {
                        Zone::Oversold => extreme.min(smi),
                        Zone::Overbought => extreme.max(smi),
                    };
                }
                _ => break,
            }
        }

        let turned = match zone {
            Zone::Oversold => current_smi > extreme,
            Zone::Overbought => current_smi < extreme,
        };
        dwell >= self.dwell_bars && turned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_last(zone: Zone, smi: &[f64]) -> bool {
        ZoneRules::default().scan(zone, smi.len() - 1, |j| smi.get(j).copied())
    }

    #[test]
    fn test_oversold_rebound_after_dwell() {
        assert!(scan_last(Zone::Oversold, &[-50.0, -50.0, -50.0, -50.0, -45.0]));
    }

    #[test]
    fn test_oversold_dwell_too_short() {
        assert!(!scan_last(Zone::Oversold, &[-50.0, -50.0, -45.0]));
        assert!(!scan_last(Zone::Oversold, &[-50.0, -50.0, -30.0]));
    }

    #[test]
    fn test_bar_outside_zone_never_fires() {
        // the dwell ended on the previous bar; the exit bar itself is neutral
        assert!(!scan_last(Zone::Oversold, &[-50.0, -50.0, -50.0, -50.0, -30.0]));
    }

    #[test]
    fn test_no_rebound_while_making_new_lows() {
        assert!(!scan_last(Zone::Oversold, &[-45.0, -50.0, -55.0, -60.0, -65.0]));
    }

    #[test]
    fn test_dwell_stops_at_neutral_bar() {
        // only the last three bars are inside the zone
        assert!(!scan_last(Zone::Oversold, &[-60.0, -60.0, -10.0, -60.0, -55.0, -50.0]));
    }

    #[test]
    fn test_dwell_stops_at_missing_point() {
        let smi = [-60.0, -60.0, -60.0, -60.0, -50.0];
        let rules = ZoneRules::default();
        assert!(rules.scan(Zone::Oversold, 4, |j| smi.get(j).copied()));
        assert!(!rules.scan(Zone::Oversold, 4, |j| if j == 2 { None } else { smi.get(j).copied() }));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(scan_last(Zone::Oversold, &[-45.0, -45.0, -45.0, -40.0]));
        assert!(scan_last(Zone::Overbought, &[45.0, 45.0, 45.0, 40.0]));
    }

    #[test]
    fn test_overbought_mirror() {
        assert!(scan_last(Zone::Overbought, &[50.0, 60.0, 70.0, 65.0]));
        assert!(!scan_last(Zone::Overbought, &[50.0, 60.0, 70.0, 75.0]));
        assert!(!scan_last(Zone::Overbought, &[70.0, 70.0, 65.0]));
    }

    #[test]
    fn test_neutral_band_exit() {
        let rules = ZoneRules::default();
        assert!(rules.has_exited(Zone::Oversold, -39.9));
        assert!(!rules.has_exited(Zone::Oversold, -40.0));
        assert!(rules.has_exited(Zone::Overbought, 39.9));
        assert!(!rules.has_exited(Zone::Overbought, 40.0));
    }
}
