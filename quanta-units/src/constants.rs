//! Physical constants (CODATA 2018 exact values where defined)
//!
//! Each constant is built against a caller-supplied registry and needs the
//! units it is expressed in; the default catalog has all of them.

use std::sync::Arc;
use quanta_core::Result;
use crate::{unit_map, Quantity, UnitRegistry};

/// A named constant: value and unit exponents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    pub name: &'static str,
    pub symbol: &'static str,
    pub value: f64,
    pub units: &'static [(&'static str, i64)],
}

impl Constant {
    /// The constant as a quantity in `registry`
    pub fn quantity(&self, registry: &Arc<UnitRegistry>) -> Result<Quantity> {
        registry.quantity(self.value, unit_map(self.units))
    }
}

pub const SPEED_OF_LIGHT: Constant = Constant {
    name: "speed_of_light",
    symbol: "c",
    value: 299_792_458.0,
    units: &[("m", 1), ("s", -1)],
};

pub const STANDARD_GRAVITY: Constant = Constant {
    name: "standard_gravity",
    symbol: "g0",
    value: 9.80665,
    units: &[("m", 1), ("s", -2)],
};

pub const GRAVITATIONAL_CONSTANT: Constant = Constant {
    name: "gravitational_constant",
    symbol: "G",
    value: 6.67430e-11,
    units: &[("m", 3), ("kg", -1), ("s", -2)],
};

pub const PLANCK: Constant = Constant {
    name: "planck",
    symbol: "h",
    value: 6.62607015e-34,
    units: &[("J", 1), ("s", 1)],
};

pub const AVOGADRO: Constant = Constant {
    name: "avogadro",
    symbol: "NA",
    value: 6.02214076e23,
    units: &[("mol", -1)],
};

pub const BOLTZMANN: Constant = Constant {
    name: "boltzmann",
    symbol: "k",
    value: 1.380649e-23,
    units: &[("J", 1), ("K", -1)],
};

pub const ELEMENTARY_CHARGE: Constant = Constant {
    name: "elementary_charge",
    symbol: "e",
    value: 1.602176634e-19,
    units: &[("C", 1)],
};

/// Every constant, for lookup by name or symbol
pub static CONSTANTS: &[Constant] = &[
    SPEED_OF_LIGHT,
    STANDARD_GRAVITY,
    GRAVITATIONAL_CONSTANT,
    PLANCK,
    AVOGADRO,
    BOLTZMANN,
    ELEMENTARY_CHARGE,
];

/// Look up a constant by name or symbol
pub fn find_constant(name: &str) -> Option<&'static Constant> {
    CONSTANTS.iter().find(|c| c.name == name || c.symbol == name)
}

/// c, in m/s
pub fn speed_of_light(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    SPEED_OF_LIGHT.quantity(registry)
}

/// g0, in m/s^2
pub fn standard_gravity(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    STANDARD_GRAVITY.quantity(registry)
}

/// G, in m^3/(kg s^2)
pub fn gravitational_constant(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    GRAVITATIONAL_CONSTANT.quantity(registry)
}

/// h, in J s
pub fn planck(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    PLANCK.quantity(registry)
}

/// NA, in 1/mol
pub fn avogadro(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    AVOGADRO.quantity(registry)
}

/// k, in J/K
pub fn boltzmann(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    BOLTZMANN.quantity(registry)
}

/// e, in C
pub fn elementary_charge(registry: &Arc<UnitRegistry>) -> Result<Quantity> {
    ELEMENTARY_CHARGE.quantity(registry)
}
