//! Numeric payloads carried by quantities
//!
//! A quantity's magnitude is anything implementing [`Numeric`]: a plain
//! `f64` or an element-wise [`Array`]. The conversion and arithmetic code
//! is written once against this trait.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::{QuantaError, Result};

/// Capability required from a quantity's magnitude.
///
/// Binary operations are fallible because element-wise containers can
/// disagree in length; scalar operations never fail.
pub trait Numeric: Clone + fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static {
    /// Number of elements (1 for scalars)
    fn len(&self) -> usize;

    fn try_add(&self, rhs: &Self) -> Result<Self>;
    fn try_sub(&self, rhs: &Self) -> Result<Self>;
    fn try_mul(&self, rhs: &Self) -> Result<Self>;
    fn try_div(&self, rhs: &Self) -> Result<Self>;

    /// `self * k`
    fn scale(&self, k: f64) -> Self;

    /// `self / k`
    fn div_scalar(&self, k: f64) -> Self;

    /// `self + k`
    fn shift(&self, k: f64) -> Self;

    /// `k / self`
    fn recip_scaled(&self, k: f64) -> Self;

    fn powf(&self, p: f64) -> Self;

    fn powi(&self, n: i32) -> Self;

    /// Equality within a relative tolerance
    fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool;
}

fn close(a: f64, b: f64, rel_tol: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= rel_tol * a.abs().max(b.abs()) || diff <= f64::EPSILON
}

impl Numeric for f64 {
    fn len(&self) -> usize {
        1
    }

    fn try_add(&self, rhs: &Self) -> Result<Self> {
        Ok(self + rhs)
    }

    fn try_sub(&self, rhs: &Self) -> Result<Self> {
        Ok(self - rhs)
    }

    fn try_mul(&self, rhs: &Self) -> Result<Self> {
        Ok(self * rhs)
    }

    fn try_div(&self, rhs: &Self) -> Result<Self> {
        Ok(self / rhs)
    }

    fn scale(&self, k: f64) -> Self {
        self * k
    }

    fn div_scalar(&self, k: f64) -> Self {
        self / k
    }

    fn shift(&self, k: f64) -> Self {
        self + k
    }

    fn recip_scaled(&self, k: f64) -> Self {
        k / self
    }

    fn powf(&self, p: f64) -> Self {
        f64::powf(*self, p)
    }

    fn powi(&self, n: i32) -> Self {
        f64::powi(*self, n)
    }

    fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool {
        close(*self, *other, rel_tol)
    }
}

/// Homogeneous sequence of magnitudes, combined element-wise.
///
/// A single-element array broadcasts against an array of any length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Array(Vec<f64>);

impl Array {
    /// Wrap the magnitudes
    pub fn new(values: Vec<f64>) -> Self {
        Array(values)
    }

    /// Magnitudes in order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Unwrap into the underlying vector
    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }

    /// True for a zero-length array
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Array(self.0.iter().map(|&x| f(x)).collect())
    }

    fn zip_with(&self, rhs: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        match (self.0.len(), rhs.0.len()) {
            (a, b) if a == b => Ok(Array(
                self.0.iter().zip(&rhs.0).map(|(&x, &y)| f(x, y)).collect(),
            )),
            (_, 1) => {
                let y = rhs.0[0];
                Ok(self.map(|x| f(x, y)))
            }
            (1, _) => {
                let x = self.0[0];
                Ok(rhs.map(|y| f(x, y)))
            }
            (a, b) => Err(QuantaError::ShapeMismatch { left: a, right: b }),
        }
    }
}

impl From<Vec<f64>> for Array {
    fn from(values: Vec<f64>) -> Self {
        Array(values)
    }
}

impl From<&[f64]> for Array {
    fn from(values: &[f64]) -> Self {
        Array(values.to_vec())
    }
}

impl From<f64> for Array {
    fn from(value: f64) -> Self {
        Array(vec![value])
    }
}

impl FromIterator<f64> for Array {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Array(iter.into_iter().collect())
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, "]")
    }
}

impl Numeric for Array {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn try_add(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |x, y| x + y)
    }

    fn try_sub(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |x, y| x - y)
    }

    fn try_mul(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |x, y| x * y)
    }

    fn try_div(&self, rhs: &Self) -> Result<Self> {
        self.zip_with(rhs, |x, y| x / y)
    }

    fn scale(&self, k: f64) -> Self {
        self.map(|x| x * k)
    }

    fn div_scalar(&self, k: f64) -> Self {
        self.map(|x| x / k)
    }

    fn shift(&self, k: f64) -> Self {
        self.map(|x| x + k)
    }

    fn recip_scaled(&self, k: f64) -> Self {
        self.map(|x| k / x)
    }

    fn powf(&self, p: f64) -> Self {
        self.map(|x| x.powf(p))
    }

    fn powi(&self, n: i32) -> Self {
        self.map(|x| x.powi(n))
    }

    fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(&a, &b)| close(a, b, rel_tol))
    }
}
