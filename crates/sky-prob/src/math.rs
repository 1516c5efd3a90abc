//! Small numerically-stable math utilities used across likelihood code.

use std::f64::consts::LN_2;

/// Stable `ln(1 - exp(-x))` for `x > 0`.
///
/// Switches between the `expm1` and `ln_1p` formulations at `x = ln 2`:
/// below it `exp(-x)` is close to 1 and `1 - exp(-x)` cancels, above it
/// `exp(-x)` is small and `ln_1p` is exact. Returns `-inf` at `x = 0` and
/// NaN for negative `x`.
#[inline]
pub fn log1mexp(x: f64) -> f64 {
    if x < LN_2 {
        (-(-x).exp_m1()).ln()
    } else {
        (-(-x).exp()).ln_1p()
    }
}

/// Stable `ln(exp(a) - exp(b))` for `a > b`.
///
/// Factors out the larger exponent: `a + ln(1 - exp(b - a))`. Returns
/// `-inf` at `a == b` and NaN for `a < b`.
#[inline]
pub fn log_sub_exp(a: f64, b: f64) -> f64 {
    a + log1mexp(a - b)
}

/// `C(k, 2) = k(k-1)/2` as a float.
#[inline]
pub fn choose2(k: u32) -> f64 {
    let k = f64::from(k);
    0.5 * k * (k - 1.0)
}
