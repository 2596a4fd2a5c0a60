//! Unit exponent maps and base-unit tallies
//!
//! A compound unit is a map from unit name to rational exponent:
//! `{"km": 1, "hr": -1}` is kilometers per hour. Resolving every key to
//! its base unit and summing exponents per base yields a [`BaseTally`],
//! the dimensional signature used for compatibility checks.

use std::collections::BTreeMap;
use std::fmt;
use num_traits::{CheckedAdd, CheckedMul, One, Zero};
use quanta_core::{exponent, Exponent, QuantaError, Result};

/// Mapping from unit name to exponent. Zero exponents are never stored.
pub type UnitMap = BTreeMap<String, Exponent>;

/// `{name: 1}`
pub fn single(name: &str) -> UnitMap {
    let mut map = UnitMap::new();
    map.insert(name.to_string(), Exponent::one());
    map
}

/// Build a unit map from integer exponents, e.g. `unit_map(&[("m", 1), ("s", -2)])`.
///
/// Repeated names are summed; sums saturate at `±i64::MAX`.
pub fn unit_map(pairs: &[(&str, i64)]) -> UnitMap {
    let mut sums: BTreeMap<&str, i64> = BTreeMap::new();
    for &(name, exp) in pairs {
        let total = sums.entry(name).or_insert(0);
        *total = total.saturating_add(exp).max(-i64::MAX);
    }
    sums.into_iter()
        .filter(|(_, exp)| *exp != 0)
        .map(|(name, exp)| (name.to_string(), exponent(exp)))
        .collect()
}

fn overflow(op: &'static str) -> QuantaError {
    QuantaError::invalid_operand(op, "unit exponent overflows a 64-bit rational")
}

/// Numerators stay above `i64::MIN` so every exponent can be negated
pub(crate) fn is_representable(exp: &Exponent) -> bool {
    *exp.numer() != i64::MIN
}

fn checked_sum(a: &Exponent, b: &Exponent) -> Option<Exponent> {
    a.checked_add(b).filter(is_representable)
}

fn checked_product(a: &Exponent, b: &Exponent) -> Option<Exponent> {
    a.checked_mul(b).filter(is_representable)
}

/// Add `exp` to the exponent of `name`, dropping the key if it cancels
fn accumulate(map: &mut UnitMap, name: &str, exp: &Exponent, op: &'static str) -> Result<()> {
    let current = map.get(name).copied().unwrap_or_else(Exponent::zero);
    let total = checked_sum(&current, exp).ok_or_else(|| overflow(op))?;
    if total.is_zero() {
        map.remove(name);
    } else {
        map.insert(name.to_string(), total);
    }
    Ok(())
}

/// Drop zero exponents
pub(crate) fn normalize(map: UnitMap) -> UnitMap {
    map.into_iter().filter(|(_, e)| !e.is_zero()).collect()
}

/// `a * b^sign`: sign `1` multiplies units, `-1` divides them
pub(crate) fn combine(a: &UnitMap, b: &UnitMap, sign: i64) -> Result<UnitMap> {
    let op = if sign < 0 { "div" } else { "mul" };
    let sign = exponent(sign);
    let mut result = a.clone();
    for (name, exp) in b {
        let exp = checked_product(exp, &sign).ok_or_else(|| overflow(op))?;
        accumulate(&mut result, name, &exp, op)?;
    }
    Ok(result)
}

/// Multiply every exponent by `power`
pub(crate) fn raise(map: &UnitMap, power: Exponent) -> Result<UnitMap> {
    let mut result = UnitMap::new();
    for (name, exp) in map {
        let raised = checked_product(exp, &power).ok_or_else(|| overflow("pow"))?;
        if !raised.is_zero() {
            result.insert(name.clone(), raised);
        }
    }
    Ok(result)
}

/// Negate every exponent
pub(crate) fn invert(map: &UnitMap) -> UnitMap {
    map.iter().map(|(name, exp)| (name.clone(), -*exp)).collect()
}

/// Render a unit map as `num/den`, e.g. `kg m/s^2` or `W/(K m^2)`.
///
/// Keys appear in sorted order. Returns an empty string for an empty map.
pub fn format_units(map: &UnitMap) -> String {
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();

    for (name, exp) in map {
        if *exp > Exponent::zero() {
            numerator.push(format_term(name, exp));
        } else {
            denominator.push(format_term(name, &-*exp));
        }
    }

    if denominator.is_empty() {
        return numerator.join(" ");
    }

    let num_str = if numerator.is_empty() {
        "1".to_string()
    } else {
        numerator.join(" ")
    };

    let den_str = denominator.join(" ");
    if denominator.len() > 1 {
        format!("{}/({})", num_str, den_str)
    } else {
        format!("{}/{}", num_str, den_str)
    }
}

fn format_term(name: &str, exp: &Exponent) -> String {
    if exp.is_one() {
        name.to_string()
    } else {
        format!("{}^{}", name, exp)
    }
}

/// Summed exponent per base unit; the dimensional signature of a unit map
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseTally {
    exponents: BTreeMap<String, Exponent>,
}

impl BaseTally {
    /// Empty tally: dimensionless
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `exp` to the tally of `base`; fails if the sum overflows
    pub fn add(&mut self, base: &str, exp: Exponent) -> Result<()> {
        accumulate(&mut self.exponents, base, &exp, "tally")
    }

    /// Exponent of `base`, zero if absent
    pub fn get(&self, base: &str) -> Exponent {
        self.exponents.get(base).copied().unwrap_or_else(Exponent::zero)
    }

    /// True when every base cancels
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.is_empty()
    }

    /// Number of distinct bases with a nonzero exponent
    pub fn len(&self) -> usize {
        self.exponents.len()
    }

    /// The only base and its exponent, if exactly one base remains
    pub fn single_base(&self) -> Option<(&str, Exponent)> {
        if self.exponents.len() != 1 {
            return None;
        }
        self.exponents.iter().next().map(|(base, exp)| (base.as_str(), *exp))
    }

    /// Bases in sorted order with their exponents
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Exponent)> {
        self.exponents.iter().map(|(base, exp)| (base.as_str(), exp))
    }

    /// The tally viewed as a unit map over base units
    pub fn to_unit_map(&self) -> UnitMap {
        self.exponents.clone()
    }
}

impl fmt::Display for BaseTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponents.is_empty() {
            return write!(f, "1");
        }
        let parts: Vec<String> = self.exponents
            .iter()
            .map(|(base, exp)| format_term(base, exp))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_cancels() {
        let velocity = unit_map(&[("m", 1), ("s", -1)]);
        let time = single("s");
        let length = combine(&velocity, &time, 1).unwrap();
        assert_eq!(length, single("m"));
    }

    #[test]
    fn test_divide() {
        let result = combine(&single("m"), &single("s"), -1).unwrap();
        assert_eq!(result, unit_map(&[("m", 1), ("s", -1)]));
    }

    #[test]
    fn test_raise() {
        let area = raise(&single("m"), exponent(2)).unwrap();
        assert_eq!(area, unit_map(&[("m", 2)]));
        assert!(raise(&single("m"), exponent(0)).unwrap().is_empty());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(&unit_map(&[("kg", 1), ("m", 1), ("s", -2)])), "kg m/s^2");
        assert_eq!(format_units(&unit_map(&[("W", 1), ("m", -2), ("K", -1)])), "W/(K m^2)");
        assert_eq!(format_units(&unit_map(&[("s", -1)])), "1/s");
        assert_eq!(format_units(&UnitMap::new()), "");

        let mut root = UnitMap::new();
        root.insert("Hz".to_string(), Exponent::new(1, 2));
        assert_eq!(format_units(&root), "Hz^1/2");
    }

    #[test]
    fn test_tally_display() {
        let mut tally = BaseTally::new();
        tally.add("m", exponent(1)).unwrap();
        tally.add("s", exponent(-1)).unwrap();
        assert_eq!(format!("{}", tally), "m s^-1");
        assert_eq!(format!("{}", BaseTally::new()), "1");
    }

    #[test]
    fn test_tally_single_base() {
        let mut tally = BaseTally::new();
        tally.add("m", exponent(1)).unwrap();
        tally.add("m", exponent(1)).unwrap();
        assert_eq!(tally.single_base(), Some(("m", exponent(2))));

        tally.add("m", exponent(-2)).unwrap();
        assert!(tally.is_dimensionless());
        assert_eq!(tally.single_base(), None);
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        let huge = unit_map(&[("m", i64::MAX)]);
        let err = combine(&huge, &single("m"), 1).unwrap_err();
        assert_eq!(err.code(), quanta_core::codes::INVALID_OPERAND);

        let err = combine(&huge, &unit_map(&[("m", -1)]), -1).unwrap_err();
        assert_eq!(err.code(), quanta_core::codes::INVALID_OPERAND);

        let err = raise(&huge, exponent(2)).unwrap_err();
        assert_eq!(err.code(), quanta_core::codes::INVALID_OPERAND);

        let mut tally = BaseTally::new();
        tally.add("m", exponent(i64::MAX)).unwrap();
        assert!(tally.add("m", exponent(1)).is_err());
        assert_eq!(tally.get("m"), exponent(i64::MAX));
    }

    #[test]
    fn test_exponents_stay_negatable() {
        let low = unit_map(&[("m", -i64::MAX)]);
        assert!(combine(&low, &single("m"), -1).is_err());
        assert_eq!(invert(&low), unit_map(&[("m", i64::MAX)]));
        assert_eq!(unit_map(&[("s", i64::MIN)]), unit_map(&[("s", -i64::MAX)]));
    }

    #[test]
    fn test_fractional_exponent_overflow() {
        let root = raise(&single("m"), Exponent::new(1, 3_037_000_500)).unwrap();
        assert!(raise(&root, Exponent::new(1, 3_037_000_500)).is_err());
    }
}
