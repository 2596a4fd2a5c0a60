//! Quanta Core - Fundamental types
//!
//! This crate provides the core types used throughout Quanta:
//! - `Numeric`: capability of a quantity's magnitude (`f64`, `Array`)
//! - `Exponent`: rational unit exponents
//! - `QuantaError`: error taxonomy with machine-readable codes

mod numeric;
mod exponent;
mod error;

pub use numeric::{Numeric, Array};
pub use exponent::{Exponent, exponent, exponent_to_f64, exponent_from_f64, pow_exponent};
pub use error::{QuantaError, ErrorReport, Result, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Numeric, Array, Exponent, QuantaError, Result};
    pub use crate::error::codes;
}
