/// Exponential moving average seeded with the first value.
///
/// `ema[0] = series[0]`, `ema[i] = (series[i] - ema[i-1]) * k + ema[i-1]`
/// with `k = 2 / (period + 1)`.
pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    let Some(&first) = series.first() else {
        return out;
    };

    let multiplier = 2.0 / (period.max(1) as f64 + 1.0);
    let mut prev = first;
    out.push(prev);
    for &value in &series[1..] {
        prev = (value - prev) * multiplier + prev;
        out.push(prev);
    }
    out
}

/// Trailing simple moving average.
///
/// Indices before `period - 1` carry the raw input value, since no full
/// window exists yet.
pub fn sma(series: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    series
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            if i + 1 < period {
                value
            } else {
                series[i + 1 - period..=i].iter().rev().sum::<f64>() / period as f64
            }
        })
        .collect()
}

/// Jurik moving average.
///
/// `phase` is clamped to [-100, 100] and mapped onto a phase ratio in
/// [0.5, 2.5]. All recursive state starts at zero, so the first values lag
/// heavily toward 0.
pub fn jma(series: &[f64], length: usize, phase: i32, power: i32) -> Vec<f64> {
    let phase_ratio = if phase < -100 {
        0.5
    } else if phase > 100 {
        2.5
    } else {
        phase as f64 / 100.0 + 1.5
    };

    let span = 0.45 * (length.max(1) as f64 - 1.0);
    let beta = span / (span + 2.0);
    let alpha = beta.powi(power);

    let mut e0 = 0.0;
    let mut e1 = 0.0;
    let mut e2 = 0.0;
    let mut value = 0.0;

    series
        .iter()
        .map(|&src| {
            e0 = (1.0 - alpha) * src + alpha * e0;
            e1 = (src - e0) * (1.0 - beta) + beta * e1;
            e2 = (e0 + phase_ratio * e1 - value) * (1.0 - alpha).powi(2) + alpha.powi(2) * e2;
            value += e2;
            value
        })
        .collect()
}
