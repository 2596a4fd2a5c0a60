//! Arithmetic on quantities
//!
//! Addition and subtraction require matching base tallies and treat both
//! operands as differences: the right operand is rescaled into the left
//! operand's units by factors only, never offsets. Adding two absolute
//! temperatures therefore adds their magnitudes.

use std::ops::{Div, Mul, Neg};
use quanta_core::{exponent, exponent_from_f64, exponent_to_f64, Array, Exponent, Numeric, QuantaError, Result};
use crate::dimension::{combine, invert, raise};
use crate::Quantity;

impl<V: Numeric> Quantity<V> {
    fn add_sub(
        &self,
        other: &Quantity<V>,
        op: fn(&V, &V) -> Result<V>,
    ) -> Result<Quantity<V>> {
        self.same_registry(other)?;

        if self.units == other.units {
            let value = op(&self.value, &other.value)?;
            return Ok(Quantity::from_parts(value, self.units.clone(), &self.registry));
        }

        let left = self.base_tally()?;
        let right = other.base_tally()?;
        if left != right {
            return Err(QuantaError::IncompatibleDimensions {
                left: left.to_string(),
                right: right.to_string(),
            });
        }

        let other_scale = self.registry.scale_to_base(&other.units)?;
        let self_scale = self.registry.scale_to_base(&self.units)?;
        let converted = other.value.scale(other_scale).div_scalar(self_scale);

        let value = op(&self.value, &converted)?;
        Ok(Quantity::from_parts(value, self.units.clone(), &self.registry))
    }

    /// Sum in the left operand's units
    pub fn try_add(&self, other: &Quantity<V>) -> Result<Quantity<V>> {
        self.add_sub(other, V::try_add)
    }

    /// Difference in the left operand's units
    pub fn try_sub(&self, other: &Quantity<V>) -> Result<Quantity<V>> {
        self.add_sub(other, V::try_sub)
    }

    /// Product; exponents add per unit name and cancelled units are dropped
    pub fn try_mul(&self, other: &Quantity<V>) -> Result<Quantity<V>> {
        self.same_registry(other)?;
        let units = combine(&self.units, &other.units, 1)?;
        let value = self.value.try_mul(&other.value)?;
        Ok(Quantity::from_parts(value, units, &self.registry))
    }

    /// Quotient; the divisor's exponents are subtracted
    pub fn try_div(&self, other: &Quantity<V>) -> Result<Quantity<V>> {
        self.same_registry(other)?;
        let units = combine(&self.units, &other.units, -1)?;
        let value = self.value.try_div(&other.value)?;
        Ok(Quantity::from_parts(value, units, &self.registry))
    }

    /// Multiply by a plain number; units unchanged
    pub fn scale(&self, k: f64) -> Quantity<V> {
        Quantity::from_parts(self.value.scale(k), self.units.clone(), &self.registry)
    }

    /// Divide by a plain number; units unchanged
    pub fn div_scalar(&self, k: f64) -> Quantity<V> {
        Quantity::from_parts(self.value.div_scalar(k), self.units.clone(), &self.registry)
    }

    /// `k / self`: every exponent is negated
    pub fn recip(&self, k: f64) -> Quantity<V> {
        let units = invert(&self.units);
        Quantity::from_parts(self.value.recip_scaled(k), units, &self.registry)
    }

    /// Raise to a rational power; every exponent is multiplied by `power`.
    ///
    /// Fails with `InvalidOperand` if a resulting exponent does not fit a
    /// 64-bit rational.
    pub fn pow(&self, power: Exponent) -> Result<Quantity<V>> {
        let units = raise(&self.units, power)?;
        let value = if power.is_integer() {
            match i32::try_from(power.to_integer()) {
                Ok(n) => self.value.powi(n),
                Err(_) => self.value.powf(exponent_to_f64(&power)),
            }
        } else {
            self.value.powf(exponent_to_f64(&power))
        };
        Ok(Quantity::from_parts(value, units, &self.registry))
    }

    /// Integer power
    pub fn powi(&self, n: i32) -> Result<Quantity<V>> {
        self.pow(exponent(i64::from(n)))
    }

    /// Raise to a real power.
    ///
    /// The power must be finite and representable as a rational exponent.
    /// The magnitude is raised to `power` itself, not to its rational
    /// approximation.
    pub fn powf(&self, power: f64) -> Result<Quantity<V>> {
        if !power.is_finite() {
            return Err(QuantaError::invalid_operand(
                "pow",
                format!("exponent {} is not a finite number", power),
            ));
        }
        let rational = exponent_from_f64(power).ok_or_else(|| {
            QuantaError::invalid_operand(
                "pow",
                format!("exponent {} has no rational approximation", power),
            )
        })?;
        let units = raise(&self.units, rational)?;
        let value = self.value.powf(power);
        Ok(Quantity::from_parts(value, units, &self.registry))
    }

    /// Square root; exponents are halved
    pub fn sqrt(&self) -> Result<Quantity<V>> {
        self.pow(Exponent::new(1, 2))
    }
}

impl<V: Numeric> Mul<f64> for Quantity<V> {
    type Output = Quantity<V>;

    fn mul(self, k: f64) -> Quantity<V> {
        self.scale(k)
    }
}

impl<V: Numeric> Mul<f64> for &Quantity<V> {
    type Output = Quantity<V>;

    fn mul(self, k: f64) -> Quantity<V> {
        self.scale(k)
    }
}

impl<V: Numeric> Mul<Quantity<V>> for f64 {
    type Output = Quantity<V>;

    fn mul(self, q: Quantity<V>) -> Quantity<V> {
        q.scale(self)
    }
}

impl<V: Numeric> Mul<&Quantity<V>> for f64 {
    type Output = Quantity<V>;

    fn mul(self, q: &Quantity<V>) -> Quantity<V> {
        q.scale(self)
    }
}

/// `[1, 2, 3] * m`: array magnitudes from a scalar unit quantity
impl Mul<Quantity<f64>> for Array {
    type Output = Quantity<Array>;

    fn mul(self, q: Quantity<f64>) -> Quantity<Array> {
        let value = self.scale(q.value);
        Quantity::from_parts(value, q.units, &q.registry)
    }
}

impl<V: Numeric> Div<f64> for Quantity<V> {
    type Output = Quantity<V>;

    fn div(self, k: f64) -> Quantity<V> {
        self.div_scalar(k)
    }
}

impl<V: Numeric> Div<f64> for &Quantity<V> {
    type Output = Quantity<V>;

    fn div(self, k: f64) -> Quantity<V> {
        self.div_scalar(k)
    }
}

impl<V: Numeric> Div<Quantity<V>> for f64 {
    type Output = Quantity<V>;

    fn div(self, q: Quantity<V>) -> Quantity<V> {
        q.recip(self)
    }
}

impl<V: Numeric> Div<&Quantity<V>> for f64 {
    type Output = Quantity<V>;

    fn div(self, q: &Quantity<V>) -> Quantity<V> {
        q.recip(self)
    }
}

impl<V: Numeric> Neg for Quantity<V> {
    type Output = Quantity<V>;

    fn neg(self) -> Quantity<V> {
        self.scale(-1.0)
    }
}

impl<V: Numeric> Neg for &Quantity<V> {
    type Output = Quantity<V>;

    fn neg(self) -> Quantity<V> {
        self.scale(-1.0)
    }
}
