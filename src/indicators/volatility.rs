/// True range per bar. The first bar has no previous close, so it is the
/// plain high-low range.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let len = high.len().min(low.len()).min(close.len());
    (0..len)
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                hl
            } else {
                let hc = (high[i] - close[i - 1]).abs();
                let lc = (low[i] - close[i - 1]).abs();
                hl.max(hc).max(lc)
            }
        })
        .collect()
}

/// Wilder's recursive moving average, seeded with the first value.
pub fn rma(series: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1) as f64;
    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;

    for &value in series {
        let next = match prev {
            None => value,
            Some(p) => (p * (period - 1.0) + value) / period,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Average true range with Wilder smoothing.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    rma(&true_range(high, low, close), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_range_uses_previous_close_gap() {
        let high = [10.0, 12.0];
        let low = [9.0, 11.5];
        let close = [9.5, 12.0];
        // gap up: |12 - 9.5| = 2.5 beats 0.5 intrabar range
        assert_eq!(true_range(&high, &low, &close), vec![1.0, 2.5]);
    }

    #[test]
    fn test_flat_bars_have_zero_range() {
        let flat = vec![5.0; 30];
        let tr = true_range(&flat, &flat, &flat);
        assert!(tr.iter().skip(1).all(|&v| v == 0.0));

        let out = atr(&flat, &flat, &flat, 14);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rma_decays_toward_zero_after_spike() {
        let mut tr = vec![0.0; 200];
        tr[0] = 14.0;
        let out = rma(&tr, 14);
        assert_eq!(out[0], 14.0);
        assert_eq!(out[1], 13.0);
        assert!(out[199] < 1e-4);
    }

    #[test]
    fn test_mismatched_lengths_use_shortest() {
        let out = true_range(&[1.0, 2.0, 3.0], &[0.5, 1.5], &[1.0, 2.0, 3.0]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(atr(&[], &[], &[], 14).is_empty());
    }
}
