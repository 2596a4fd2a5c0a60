//! Quantity type - a value with an associated unit exponent map

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use num_traits::One;
use quanta_core::{Array, Numeric, QuantaError, Result};
use crate::dimension::{self, format_units, BaseTally, UnitMap};
use crate::UnitRegistry;

/// Unit argument of [`Quantity::new`]: a single name or an exponent map
#[derive(Debug, Clone, PartialEq)]
pub enum UnitSpecifier {
    Name(String),
    Map(UnitMap),
}

impl From<&str> for UnitSpecifier {
    fn from(name: &str) -> Self {
        UnitSpecifier::Name(name.to_string())
    }
}

impl From<String> for UnitSpecifier {
    fn from(name: String) -> Self {
        UnitSpecifier::Name(name)
    }
}

impl From<UnitMap> for UnitSpecifier {
    fn from(map: UnitMap) -> Self {
        UnitSpecifier::Map(map)
    }
}

impl From<&UnitMap> for UnitSpecifier {
    fn from(map: &UnitMap) -> Self {
        UnitSpecifier::Map(map.clone())
    }
}

impl UnitSpecifier {
    fn into_map(self) -> UnitMap {
        match self {
            UnitSpecifier::Name(name) => dimension::single(&name),
            UnitSpecifier::Map(map) => dimension::normalize(map),
        }
    }
}

/// A physical quantity: a magnitude and a unit exponent map, interpreted
/// by a shared registry.
///
/// Quantities are immutable; every conversion and operator returns a new one.
#[derive(Clone)]
pub struct Quantity<V = f64> {
    pub(crate) value: V,
    pub(crate) units: UnitMap,
    pub(crate) registry: Arc<UnitRegistry>,
}

impl<V: Numeric> Quantity<V> {
    /// Create a new quantity; every unit name must be registered
    pub fn new(
        value: V,
        unit: impl Into<UnitSpecifier>,
        registry: &Arc<UnitRegistry>,
    ) -> Result<Self> {
        let units = unit.into().into_map();
        registry.validate(&units)?;
        Ok(Quantity {
            value,
            units,
            registry: Arc::clone(registry),
        })
    }

    /// Build from parts already known to be registered
    pub(crate) fn from_parts(value: V, units: UnitMap, registry: &Arc<UnitRegistry>) -> Self {
        Quantity {
            value,
            units,
            registry: Arc::clone(registry),
        }
    }

    /// Magnitude in this quantity's units
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    /// Unit exponents, keyed by unit name
    pub fn units(&self) -> &UnitMap {
        &self.units
    }

    /// Registry the units are resolved against
    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    /// No units at all (a pure number)
    pub fn is_dimensionless(&self) -> bool {
        self.units.is_empty()
    }

    /// Exactly one unit with exponent exactly 1
    pub fn is_single_unit(&self) -> bool {
        self.single_unit().is_some()
    }

    pub(crate) fn single_unit(&self) -> Option<&str> {
        match self.units.iter().next() {
            Some((name, exp)) if self.units.len() == 1 && exp.is_one() => Some(name.as_str()),
            _ => None,
        }
    }

    /// Dimensional signature: exponents summed per base unit
    pub fn base_tally(&self) -> Result<BaseTally> {
        self.registry.base_tally(&self.units)
    }

    /// Check if two quantities can be added or subtracted
    pub fn is_compatible(&self, other: &Quantity<V>) -> bool {
        match (self.base_tally(), other.base_tally()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Same payload in another magnitude type
    pub fn with_value<W: Numeric>(&self, value: W) -> Quantity<W> {
        Quantity::from_parts(value, self.units.clone(), &self.registry)
    }

    /// Equal unit maps and values equal within `rel_tol`
    pub fn approx_eq(&self, other: &Quantity<V>, rel_tol: f64) -> bool {
        self.units == other.units && self.value.approx_eq(&other.value, rel_tol)
    }

    pub(crate) fn same_registry(&self, other: &Quantity<V>) -> Result<()> {
        if Arc::ptr_eq(&self.registry, &other.registry) {
            Ok(())
        } else {
            Err(QuantaError::RegistryMismatch)
        }
    }

    /// Serializable snapshot of value and units
    pub fn record(&self) -> QuantityRecord<V>
    where
        V: Serialize,
    {
        QuantityRecord {
            value: self.value.clone(),
            units: self
                .units
                .iter()
                .map(|(name, exp)| (name.clone(), exp.to_string()))
                .collect(),
            display: format_units(&self.units),
        }
    }
}

impl Quantity<f64> {
    /// Lift a scalar quantity to a single-element array, for broadcasting
    /// against array quantities
    pub fn into_array(self) -> Quantity<Array> {
        Quantity {
            value: Array::from(self.value),
            units: self.units,
            registry: self.registry,
        }
    }
}

/// Serializable view of a quantity (exponents rendered as `"2"`, `"-1/2"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityRecord<V> {
    pub value: V,
    pub units: BTreeMap<String, String>,
    pub display: String,
}

impl<V: Numeric> PartialEq for Quantity<V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
            && self.units == other.units
            && self.value == other.value
    }
}

impl<V: Numeric> fmt::Display for Quantity<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.units.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, format_units(&self.units))
        }
    }
}

impl<V: Numeric> fmt::Debug for Quantity<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({:?}, {{", self.value)?;
        for (i, (name, exp)) in self.units.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, exp)?;
        }
        write!(f, "}})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_map;
    use quanta_core::Exponent;

    fn registry() -> Arc<UnitRegistry> {
        let reg = UnitRegistry::new();
        reg.define_base("m").unwrap();
        reg.define_scaled("km", "m", 1000.0).unwrap();
        reg.define_base("s").unwrap();
        reg.define_base("kg").unwrap();
        Arc::new(reg)
    }

    #[test]
    fn test_quantity_creation() {
        let reg = registry();
        let q = Quantity::new(5.0, "m", &reg).unwrap();
        assert_eq!(*q.value(), 5.0);
        assert_eq!(q.units(), &unit_map(&[("m", 1)]));
        assert!(q.is_single_unit());
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let reg = registry();
        let err = Quantity::new(5.0, "furlong", &reg).unwrap_err();
        assert_eq!(err, QuantaError::undefined_unit("furlong"));

        let err = Quantity::new(5.0, unit_map(&[("m", 1), ("fortnight", -1)]), &reg).unwrap_err();
        assert_eq!(err, QuantaError::undefined_unit("fortnight"));
    }

    #[test]
    fn test_zero_exponents_normalized() {
        let reg = registry();
        let mut map = unit_map(&[("m", 1)]);
        map.insert("s".to_string(), Exponent::from_integer(0));
        let q = Quantity::new(1.0, map, &reg).unwrap();
        assert_eq!(q.units(), &unit_map(&[("m", 1)]));
    }

    #[test]
    fn test_dimensionless() {
        let reg = registry();
        let q = Quantity::new(42.0, UnitMap::new(), &reg).unwrap();
        assert!(q.is_dimensionless());
        assert!(!q.is_single_unit());
        assert_eq!(format!("{}", q), "42");
    }

    #[test]
    fn test_base_tally() {
        let reg = registry();
        let q = Quantity::new(1.0, unit_map(&[("km", 1), ("m", 1), ("s", -1)]), &reg).unwrap();
        assert_eq!(q.base_tally().unwrap().to_string(), "m^2 s^-1");
        assert!(!q.is_single_unit());
    }

    #[test]
    fn test_compatible() {
        let reg = registry();
        let a = Quantity::new(1.0, "km", &reg).unwrap();
        let b = Quantity::new(1.0, "m", &reg).unwrap();
        let c = Quantity::new(1.0, "kg", &reg).unwrap();
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&c));
    }

    #[test]
    fn test_display() {
        let reg = registry();
        let q = Quantity::new(2.5, unit_map(&[("kg", 1), ("m", 1), ("s", -2)]), &reg).unwrap();
        assert_eq!(format!("{}", q), "2.5 kg m/s^2");

        let q = Quantity::new(3.0, unit_map(&[("kg", -1), ("s", -1)]), &reg).unwrap();
        assert_eq!(format!("{}", q), "3 1/(kg s)");
    }

    #[test]
    fn test_debug() {
        let reg = registry();
        let q = Quantity::new(10.0, unit_map(&[("m", 1), ("s", -1)]), &reg).unwrap();
        assert_eq!(format!("{:?}", q), "Quantity(10.0, {m: 1, s: -1})");
    }

    #[test]
    fn test_record() {
        let reg = registry();
        let q = Quantity::new(10.0, unit_map(&[("m", 1), ("s", -1)]), &reg).unwrap();
        let json = serde_json::to_string(&q.record()).unwrap();
        assert_eq!(json, r#"{"value":10.0,"units":{"m":"1","s":"-1"},"display":"m/s"}"#);
    }

    #[test]
    fn test_equality_requires_same_registry() {
        let a = Quantity::new(1.0, "m", &registry()).unwrap();
        let b = Quantity::new(1.0, "m", &registry()).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_into_array() {
        let reg = registry();
        let q = Quantity::new(2.0, "m", &reg).unwrap().into_array();
        assert_eq!(q.value(), &Array::new(vec![2.0]));
    }
}
