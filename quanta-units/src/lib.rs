//! Quanta Units - Unit registry and unit-aware quantities
//!
//! A [`UnitRegistry`] holds unit definitions resolved against their base
//! unit (`value_in_base = value * factor + offset`). A [`Quantity`] pairs a
//! magnitude with a unit exponent map and converts between units:
//!
//! - affine: a bare unit to a unit with the same base, offsets applied
//!   (`degC -> degF`)
//! - dimensional: compound units with a single base (`m^2 -> cm^2`) or
//!   matching base tallies (`km/hr -> m/s`), factors only
//!
//! ```ignore
//! let reg = Arc::new(UnitRegistry::with_defaults());
//! let speed = reg.parse("10 km/hr")?;
//! let ms = speed.to_expr("m/s")?;
//! ```

mod dimension;
mod registry;
mod prefix;
mod quantity;
mod convert;
mod ops;
mod parse;
mod catalog;
pub mod constants;

pub use dimension::{format_units, single, unit_map, BaseTally, UnitMap};
pub use registry::{RegistryBuilder, UnitDef, UnitRegistry, UnitSpec};
pub use prefix::{find_prefix, split_prefix, Prefix, PREFIXES};
pub use quantity::{Quantity, QuantityRecord, UnitSpecifier};
pub use catalog::default_specs;
pub use quanta_core::{Array, Exponent, Numeric, QuantaError, Result};
