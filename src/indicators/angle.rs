use std::f64::consts::PI;

const RAD_TO_DEG: f64 = 180.0 / PI;

/// Per-bar angle of `line` in degrees, with the price move normalised by
/// `atr` so angles compare across volatility regimes.
///
/// Index 0 and any bar with non-positive ATR yield 0.
pub fn angle_slope(line: &[f64], atr: &[f64]) -> Vec<f64> {
    let len = line.len().min(atr.len());
    let mut out = vec![0.0; len];
    for i in 1..len {
        if atr[i] > 0.0 {
            out[i] = ((line[i] - line[i - 1]) / atr[i]).atan() * RAD_TO_DEG;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_of_one_atr_is_45_degrees() {
        let out = angle_slope(&[1.0, 2.0, 1.0], &[1.0, 1.0, 1.0]);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 45.0).abs() < 1e-9);
        assert!((out[2] + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_atr_gives_flat_angle() {
        let out = angle_slope(&[1.0, 5.0], &[0.0, 0.0]);
        assert_eq!(out, vec![0.0, 0.0]);
    }
}
