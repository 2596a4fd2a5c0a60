//! Conversion of quantities between units
//!
//! Two algorithms:
//! - affine: a bare single unit (exponent 1) to a unit with the same base.
//!   The only path that applies offsets, so `degC -> degF` is exact.
//! - dimensional: everything else. Factors only; offsets are discarded
//!   because a unit inside a product or power denotes a difference.

use num_traits::One;
use quanta_core::{pow_exponent, Numeric, QuantaError, Result};
use crate::dimension::{self, format_units, BaseTally, UnitMap};
use crate::{Quantity, UnitDef};

impl<V: Numeric> Quantity<V> {
    /// Convert to a single target unit.
    ///
    /// The result's exponent is the summed exponent of the source's single
    /// base, so `m^2 -> cm` yields `cm^2`. A prefixed target (`kilometer`)
    /// is registered only if the conversion succeeds.
    pub fn to(&self, target: &str) -> Result<Quantity<V>> {
        let (target_def, prefixed) = self.registry.lookup(target)?;
        let converted = self.convert_to(target, target_def)?;
        if let Some(unit) = prefixed {
            self.registry.register_prefixed(std::slice::from_ref(&unit))?;
        }
        Ok(converted)
    }

    fn convert_to(&self, target: &str, target_def: UnitDef) -> Result<Quantity<V>> {
        if let Some(source) = self.single_unit() {
            let source_def = self.registry.get(source)?;
            if source_def.base == target_def.base {
                let value = target_def.from_base(&source_def.to_base(&self.value));
                return Ok(Quantity::from_parts(value, dimension::single(target), &self.registry));
            }
        }

        let tally = self.base_tally()?;
        let (base, total) = match tally.single_base() {
            Some(single) => single,
            None if tally.is_dimensionless() => {
                return Err(QuantaError::IncompatibleDimensions {
                    left: tally.to_string(),
                    right: target_def.base,
                });
            }
            None => {
                return Err(QuantaError::UnsupportedCompoundConversion {
                    units: format_units(&self.units),
                    target: target.to_string(),
                });
            }
        };

        if base != target_def.base {
            let mut expected = BaseTally::new();
            expected.add(&target_def.base, total)?;
            return Err(QuantaError::IncompatibleDimensions {
                left: tally.to_string(),
                right: expected.to_string(),
            });
        }

        let base_value = self.value.scale(self.registry.scale_to_base(&self.units)?);
        let value = base_value.div_scalar(pow_exponent(target_def.factor, &total));

        let mut units = UnitMap::new();
        units.insert(target.to_string(), total);
        Ok(Quantity::from_parts(value, units, &self.registry))
    }

    /// Convert to a compound target by factors only.
    ///
    /// Source and target must have identical base tallies. Prefixed target
    /// names are registered only if the conversion succeeds.
    pub fn to_units(&self, target: &UnitMap) -> Result<Quantity<V>> {
        let target = dimension::normalize(target.clone());
        let (target_tally, target_scale, prefixed) = self.registry.measure(&target)?;

        let source_tally = self.base_tally()?;
        if source_tally != target_tally {
            return Err(QuantaError::IncompatibleDimensions {
                left: source_tally.to_string(),
                right: target_tally.to_string(),
            });
        }

        let source_scale = self.registry.scale_to_base(&self.units)?;
        let value = self.value.scale(source_scale).div_scalar(target_scale);
        self.registry.register_prefixed(&prefixed)?;
        Ok(Quantity::from_parts(value, target, &self.registry))
    }

    /// Convert to a unit expression such as `"m/s"` or `"W/m^2"`.
    ///
    /// A bare name goes through [`Quantity::to`], so affine units keep
    /// their offsets.
    pub fn to_expr(&self, expr: &str) -> Result<Quantity<V>> {
        let (target, _) = self.registry.parse_unit_expr(expr)?;
        match target.iter().next() {
            Some((name, exp)) if target.len() == 1 && exp.is_one() => self.to(name),
            _ => self.to_units(&target),
        }
    }

    /// Express in base units. A bare single unit converts affinely,
    /// anything else by factors only.
    pub fn to_base(&self) -> Result<Quantity<V>> {
        if let Some(source) = self.single_unit() {
            let def = self.registry.get(source)?;
            let value = def.to_base(&self.value);
            return Ok(Quantity::from_parts(value, dimension::single(&def.base), &self.registry));
        }

        let tally = self.base_tally()?;
        let value = self.value.scale(self.registry.scale_to_base(&self.units)?);
        Ok(Quantity::from_parts(value, tally.to_unit_map(), &self.registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use approx::assert_relative_eq;
    use quanta_core::{exponent, Array};
    use crate::{unit_map, UnitRegistry};

    fn registry() -> Arc<UnitRegistry> {
        let reg = UnitRegistry::new();
        reg.define_base("m").unwrap();
        reg.define_scaled("cm", "m", 0.01).unwrap();
        reg.define_scaled("km", "m", 1000.0).unwrap();
        reg.define_base("s").unwrap();
        reg.define_scaled("min", "s", 60.0).unwrap();
        reg.define_scaled("hr", "min", 60.0).unwrap();
        reg.define_base("kg").unwrap();
        reg.define_base("K").unwrap();
        reg.define_affine("degC", "K", 1.0, 273.15).unwrap();
        reg.define_affine("degF", "K", 5.0 / 9.0, 255.37222222222222).unwrap();
        reg.define_scaled("degR", "K", 5.0 / 9.0).unwrap();
        Arc::new(reg)
    }

    #[test]
    fn test_convert_length() {
        let reg = registry();
        let q = reg.quantity(5000.0, "m").unwrap();
        let km = q.to("km").unwrap();
        assert_relative_eq!(*km.value(), 5.0);
        assert_eq!(km.units(), &unit_map(&[("km", 1)]));
    }

    #[test]
    fn test_convert_temperature() {
        let reg = registry();
        let zero_c = reg.quantity(0.0, "degC").unwrap();
        assert_relative_eq!(*zero_c.to("degF").unwrap().value(), 32.0, max_relative = 1e-12);
        assert_relative_eq!(*zero_c.to("K").unwrap().value(), 273.15, max_relative = 1e-12);

        let boiling = reg.quantity(100.0, "degC").unwrap();
        assert_relative_eq!(*boiling.to("degF").unwrap().value(), 212.0, max_relative = 1e-12);

        let body = reg.quantity(98.6, "degF").unwrap();
        assert_relative_eq!(*body.to("degC").unwrap().value(), 37.0, max_relative = 1e-12);
    }

    #[test]
    fn test_rankine_has_no_offset() {
        let reg = registry();
        let q = reg.quantity(491.67, "degR").unwrap();
        assert_relative_eq!(*q.to("degC").unwrap().value(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let reg = registry();
        for (from, to) in [("km", "cm"), ("hr", "s"), ("degF", "degC"), ("degC", "K")] {
            let q = reg.quantity(-12.5, from).unwrap();
            let back = q.to(to).unwrap().to(from).unwrap();
            assert_relative_eq!(*back.value(), -12.5, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_idempotent() {
        let reg = registry();
        let q = reg.quantity(3.7, "km").unwrap();
        let same = q.to("km").unwrap();
        assert!(same.approx_eq(&q, 1e-12));

        let speed = reg.quantity(10.0, unit_map(&[("km", 1), ("hr", -1)])).unwrap();
        let same = speed.to_units(speed.units()).unwrap();
        assert!(same.approx_eq(&speed, 1e-12));
    }

    #[test]
    fn test_area_keeps_summed_exponent() {
        let reg = registry();
        let area = reg.quantity(2.0, unit_map(&[("m", 2)])).unwrap();
        let cm2 = area.to("cm").unwrap();
        assert_relative_eq!(*cm2.value(), 20000.0, max_relative = 1e-12);
        assert_eq!(cm2.units(), &unit_map(&[("cm", 2)]));
    }

    #[test]
    fn test_mixed_units_same_base() {
        let reg = registry();
        // 1 km * 1 m = 1000 m^2
        let q = reg.quantity(1.0, unit_map(&[("km", 1), ("m", 1)])).unwrap();
        let m2 = q.to("m").unwrap();
        assert_relative_eq!(*m2.value(), 1000.0);
        assert_eq!(m2.units().get("m"), Some(&exponent(2)));
    }

    #[test]
    fn test_compound_offsets_ignored() {
        let reg = registry();
        // degC inside a compound is a temperature difference
        let rate = reg.quantity(10.0, unit_map(&[("degC", 1), ("s", -1)])).unwrap();
        let per_min = rate.to_units(&unit_map(&[("K", 1), ("min", -1)])).unwrap();
        assert_relative_eq!(*per_min.value(), 600.0, max_relative = 1e-12);
    }

    #[test]
    fn test_incompatible_dimensions() {
        let reg = registry();
        let q = reg.quantity(1.0, "m").unwrap();
        let err = q.to("s").unwrap_err();
        assert_eq!(
            err,
            QuantaError::IncompatibleDimensions {
                left: "m".to_string(),
                right: "s".to_string(),
            }
        );
    }

    #[test]
    fn test_compound_to_single_unit_unsupported() {
        let reg = registry();
        let speed = reg.quantity(10.0, unit_map(&[("km", 1), ("hr", -1)])).unwrap();
        let err = speed.to("m").unwrap_err();
        assert!(matches!(err, QuantaError::UnsupportedCompoundConversion { .. }));
    }

    #[test]
    fn test_dimensionless_to_unit() {
        let reg = registry();
        let ratio = reg.quantity(1.0, unit_map(&[("km", 1), ("m", -1)])).unwrap();
        assert!(!ratio.is_dimensionless());
        assert!(matches!(
            ratio.to("m"),
            Err(QuantaError::IncompatibleDimensions { .. })
        ));
        let pure = ratio.to_units(&UnitMap::new()).unwrap();
        assert_relative_eq!(*pure.value(), 1000.0);
    }

    #[test]
    fn test_unknown_target() {
        let reg = registry();
        let q = reg.quantity(1.0, "m").unwrap();
        assert_eq!(q.to("furlong").unwrap_err(), QuantaError::undefined_unit("furlong"));
    }

    #[test]
    fn test_failed_conversion_registers_nothing() {
        let reg = registry();
        reg.define_base("gram").unwrap();
        let length = reg.quantity(5.0, "m").unwrap();
        assert!(length.to("kilogram").is_err());
        assert!(length.to_expr("kilogram/s").is_err());
        assert!(!reg.contains("kilogram"));

        let mass = reg.quantity(1500.0, "gram").unwrap();
        assert_relative_eq!(*mass.to("kilogram").unwrap().value(), 1.5);
        assert!(reg.contains("kilogram"));

        let flow = reg.quantity(2.0, unit_map(&[("gram", 1), ("s", -1)])).unwrap();
        let converted = flow.to_expr("milligram/s").unwrap();
        assert_relative_eq!(*converted.value(), 2000.0, max_relative = 1e-12);
        assert!(reg.contains("milligram"));
    }

    #[test]
    fn test_km_per_hr_to_m_per_s() {
        let reg = registry();
        let speed = reg.quantity(10.0, unit_map(&[("km", 1), ("hr", -1)])).unwrap();
        let si = speed.to_units(&unit_map(&[("m", 1), ("s", -1)])).unwrap();
        assert_relative_eq!(*si.value(), 10.0 * 1000.0 / 3600.0, max_relative = 1e-12);
        assert_relative_eq!(*si.value(), 2.77778, max_relative = 1e-5);
    }

    #[test]
    fn test_to_units_incompatible() {
        let reg = registry();
        let speed = reg.quantity(10.0, unit_map(&[("km", 1), ("hr", -1)])).unwrap();
        let err = speed.to_units(&unit_map(&[("m", 1), ("s", -2)])).unwrap_err();
        assert_eq!(
            err,
            QuantaError::IncompatibleDimensions {
                left: "m s^-1".to_string(),
                right: "m s^-2".to_string(),
            }
        );
    }

    #[test]
    fn test_to_expr() {
        let reg = registry();
        let speed = reg.quantity(36.0, unit_map(&[("km", 1), ("hr", -1)])).unwrap();
        let si = speed.to_expr("m/s").unwrap();
        assert_relative_eq!(*si.value(), 10.0, max_relative = 1e-12);

        let temp = reg.quantity(100.0, "degC").unwrap();
        assert_relative_eq!(*temp.to_expr("degF").unwrap().value(), 212.0, max_relative = 1e-12);
    }

    #[test]
    fn test_to_base() {
        let reg = registry();
        let temp = reg.quantity(25.0, "degC").unwrap().to_base().unwrap();
        assert_relative_eq!(*temp.value(), 298.15, max_relative = 1e-12);
        assert_eq!(temp.units(), &unit_map(&[("K", 1)]));

        let speed = reg.quantity(36.0, unit_map(&[("km", 1), ("hr", -1)])).unwrap();
        let base = speed.to_base().unwrap();
        assert_relative_eq!(*base.value(), 10.0, max_relative = 1e-12);
        assert_eq!(base.units(), &unit_map(&[("m", 1), ("s", -1)]));
    }

    #[test]
    fn test_convert_array() {
        let reg = registry();
        let lengths = reg.quantity(Array::new(vec![1.0, 2.0, 3.0]), "m").unwrap();
        let cm = lengths.to("cm").unwrap();
        assert!(cm.value().approx_eq(&Array::new(vec![100.0, 200.0, 300.0]), 1e-12));
    }

    #[test]
    fn test_source_unchanged() {
        let reg = registry();
        let q = reg.quantity(1.0, "km").unwrap();
        let _ = q.to("m").unwrap();
        assert_eq!(*q.value(), 1.0);
        assert_eq!(q.units(), &unit_map(&[("km", 1)]));
    }
}
