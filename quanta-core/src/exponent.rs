//! Rational unit exponents

use num_rational::Rational64;
use num_traits::Zero;

/// Exponent of a unit in a unit map (`m^2`, `s^-1`, `Hz^1/2`)
pub type Exponent = Rational64;

/// Integer exponent
pub fn exponent(n: i64) -> Exponent {
    Exponent::from_integer(n)
}

/// Nearest `f64` to the exponent
pub fn exponent_to_f64(e: &Exponent) -> f64 {
    *e.numer() as f64 / *e.denom() as f64
}

/// `base^e`, exact for integer exponents that fit in an `i32`
pub fn pow_exponent(base: f64, e: &Exponent) -> f64 {
    if e.is_zero() {
        return 1.0;
    }
    if e.is_integer() {
        if let Ok(n) = i32::try_from(e.to_integer()) {
            return base.powi(n);
        }
    }
    base.powf(exponent_to_f64(e))
}

/// Rational approximation of a finite float power
pub fn exponent_from_f64(p: f64) -> Option<Exponent> {
    if !p.is_finite() {
        return None;
    }
    if p.fract() == 0.0 && p.abs() <= i64::MAX as f64 {
        return Some(exponent(p as i64));
    }
    Rational64::approximate_float(p)
}
