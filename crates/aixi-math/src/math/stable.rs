//! Numerically stable primitives for base-2 log-domain probability math.

use std::f64::consts::{LN_2, PI};

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Stable log2(1 + 2^x).
///
/// For large positive x the result tends to x; for large negative x it tends
/// to zero without underflowing to a negative value.
pub fn log2_one_plus_exp2(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return f64::INFINITY;
    }
    if x > 0.0 {
        x + (-x).exp2().ln_1p() / LN_2
    } else {
        x.exp2().ln_1p() / LN_2
    }
}

/// Stable log2(2^a + 2^b).
pub fn log2_add_exp2(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp2().ln_1p() / LN_2
}

/// Stable log2(sum(2^values)).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log2_sum_exp2(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (*v - max).exp2()).sum();
    max + sum.log2()
}

/// Natural log of the Gamma function (log |Gamma(z)|).
///
/// Uses a Lanczos approximation with reflection for z < 0.5.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() || z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z <= 0.0 && (z - z.round()).abs() < 1e-15 {
        return f64::NAN;
    }
    if z < 0.5 {
        let sin_pi = (PI * z).sin();
        if sin_pi == 0.0 {
            return f64::NAN;
        }
        return PI.ln() - sin_pi.abs().ln() - log_gamma(1.0 - z);
    }

    let z_minus = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, coeff) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += coeff / (z_minus + i as f64);
    }
    let t = z_minus + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (z_minus + 0.5) * t.ln() - t + x.ln()
}

/// Convert a natural logarithm to base 2.
#[inline]
pub fn ln_to_log2(x: f64) -> f64 {
    x / LN_2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log2_add_exp2_equal_terms() {
        // 2^3 + 2^3 = 2^4
        assert!(approx_eq(log2_add_exp2(3.0, 3.0), 4.0, 1e-12));
    }

    #[test]
    fn log2_add_exp2_matches_direct() {
        let a: f64 = -1.25;
        let b: f64 = -3.5;
        let direct = (a.exp2() + b.exp2()).log2();
        assert!(approx_eq(log2_add_exp2(a, b), direct, 1e-12));
    }

    #[test]
    fn log2_add_exp2_dominance() {
        assert!(approx_eq(log2_add_exp2(-2000.0, 0.0), 0.0, 1e-12));
    }

    #[test]
    fn log2_add_exp2_infinity_rules() {
        let out = log2_add_exp2(f64::INFINITY, 1.0);
        assert!(out.is_infinite() && out.is_sign_positive());
        assert!(approx_eq(log2_add_exp2(f64::NEG_INFINITY, 2.0), 2.0, 1e-12));
        assert!(log2_add_exp2(f64::NAN, 0.0).is_nan());
    }

    #[test]
    fn log2_one_plus_exp2_known_values() {
        assert!(approx_eq(log2_one_plus_exp2(0.0), 1.0, 1e-12));
        assert!(approx_eq(log2_one_plus_exp2(1.0), 3f64.log2(), 1e-12));
        assert!(approx_eq(log2_one_plus_exp2(-1.0), 1.5f64.log2(), 1e-12));
    }

    #[test]
    fn log2_one_plus_exp2_extremes() {
        assert!(approx_eq(log2_one_plus_exp2(5000.0), 5000.0, 1e-9));
        let tiny = log2_one_plus_exp2(-5000.0);
        assert!(tiny >= 0.0 && tiny < 1e-12);
    }

    #[test]
    fn log2_sum_exp2_basic() {
        assert!(approx_eq(log2_sum_exp2(&[0.0, 0.0, 1.0]), 2.0, 1e-12));
        let all = log2_sum_exp2(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert!(all.is_infinite() && all.is_sign_negative());
        assert!(log2_sum_exp2(&[]).is_infinite());
        assert!(log2_sum_exp2(&[0.0, f64::NAN]).is_nan());
    }

    #[test]
    fn log_gamma_known_values() {
        assert!(approx_eq(log_gamma(1.0), 0.0, 1e-12));
        assert!(approx_eq(log_gamma(0.5), 0.5 * PI.ln(), 1e-10));
        assert!(approx_eq(log_gamma(5.0), 24.0f64.ln(), 1e-10));
        assert!(log_gamma(-2.0).is_nan());
    }
}
