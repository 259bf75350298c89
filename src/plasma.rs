// Sine-superposition plasma.
//
// Five terms, each bounded to [-1, 1]:
//   horizontal   sin(u * 1.00 + t * 1.00)
//   vertical     sin(v * 0.80 + t * 0.70)
//   diagonal     sin((u + v) * 0.50 + t * 0.45)
//   ring A       sin(dist(u, v, 3.0, 2.0) * 1.20 - t * 1.30)
//   ring B       sin(dist(u, v, -2.5, 4.0) * 0.90 + t * 0.85)
// with u = x / scale, v = y / scale. Output is (sum + 5) / 10.

const TERMS: f64 = 5.0;

const H_FREQ: f64 = 1.0;
const H_RATE: f64 = 1.0;
const V_FREQ: f64 = 0.8;
const V_RATE: f64 = 0.7;
const D_FREQ: f64 = 0.5;
const D_RATE: f64 = 0.45;
const RING_A: (f64, f64) = (3.0, 2.0);
const RING_A_FREQ: f64 = 1.2;
const RING_A_RATE: f64 = -1.3;
const RING_B: (f64, f64) = (-2.5, 4.0);
const RING_B_FREQ: f64 = 0.9;
const RING_B_RATE: f64 = 0.85;

/// Normalized plasma intensity in [0, 1].
pub fn plasma_value(x: f64, y: f64, t: f64, scale: f64) -> f64 {
    let s = if scale.abs() < 1e-9 { 1.0 } else { scale };
    let u = x / s;
    let v = y / s;

    let ring = |cx: f64, cy: f64| ((u - cx) * (u - cx) + (v - cy) * (v - cy)).sqrt();

    let sum = (u * H_FREQ + t * H_RATE).sin()
        + (v * V_FREQ + t * V_RATE).sin()
        + ((u + v) * D_FREQ + t * D_RATE).sin()
        + (ring(RING_A.0, RING_A.1) * RING_A_FREQ + t * RING_A_RATE).sin()
        + (ring(RING_B.0, RING_B.1) * RING_B_FREQ + t * RING_B_RATE).sin();

    ((sum + TERMS) / (2.0 * TERMS)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = plasma_value(12.0, 7.0, 3.3, 6.0);
        let b = plasma_value(12.0, 7.0, 3.3, 6.0);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn changes_over_time() {
        assert_ne!(plasma_value(4.0, 4.0, 0.0, 5.0), plasma_value(4.0, 4.0, 1.0, 5.0));
    }

    #[test]
    fn zero_scale_does_not_blow_up() {
        let v = plasma_value(1.0, 2.0, 0.5, 0.0);
        assert!(v.is_finite());
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn extreme_inputs_stay_normalized() {
        for &(x, y, t) in &[(1e9, -1e9, 1e7), (0.0, 0.0, 0.0), (-3.5, 1e-12, -400.0)] {
            let v = plasma_value(x, y, t, 20.0);
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
    }
}
