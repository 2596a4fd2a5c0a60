//! Unit registry - the catalog of known units
//!
//! Each unit is stored already resolved against its ultimate base unit:
//! `value_in_base = value * factor + offset`. Defining a unit in terms of
//! a parent composes the parent's relation immediately, so lookups never
//! chase chains.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use quanta_core::{pow_exponent, Numeric, QuantaError, Result};
use crate::dimension::{is_representable, BaseTally, UnitMap};
use crate::quantity::UnitSpecifier;
use crate::prefix::{self, Prefix};
use crate::{catalog, Quantity};

/// Resolved definition of a unit relative to its base unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    /// Name of the base unit this unit resolves to
    pub base: String,
    /// Multiplicative scale to the base unit
    pub factor: f64,
    /// Additive shift in base-unit terms (nonzero only for affine scales)
    pub offset: f64,
}

impl UnitDef {
    /// Definition of a base unit: factor 1, offset 0
    pub fn base(name: &str) -> Self {
        UnitDef {
            base: name.to_string(),
            factor: 1.0,
            offset: 0.0,
        }
    }

    /// Check if this unit has an offset (non-proportional conversion)
    pub fn has_offset(&self) -> bool {
        self.offset != 0.0
    }

    /// Convert a value in this unit to the base unit
    pub fn to_base<V: Numeric>(&self, value: &V) -> V {
        value.scale(self.factor).shift(self.offset)
    }

    /// Convert a value in the base unit to this unit
    pub fn from_base<V: Numeric>(&self, value: &V) -> V {
        value.shift(-self.offset).div_scalar(self.factor)
    }
}

fn default_factor() -> f64 {
    1.0
}

/// Unresolved definition as written in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
}

impl UnitSpec {
    /// A unit that is its own base
    pub fn base(name: &str) -> Self {
        Self::affine(name, None, 1.0, 0.0)
    }

    /// `name = factor * parent`
    pub fn scaled(name: &str, parent: &str, factor: f64) -> Self {
        Self::affine(name, Some(parent), factor, 0.0)
    }

    /// `name = factor * parent + offset`, or a base unit without a parent
    pub fn affine(name: &str, parent: Option<&str>, factor: f64, offset: f64) -> Self {
        UnitSpec {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            factor,
            offset,
        }
    }

    /// Parse a JSON catalog: an array of `{"name", "parent"?, "factor"?, "offset"?}`
    pub fn parse_catalog(json: &str) -> Result<Vec<UnitSpec>> {
        serde_json::from_str(json).map_err(|e| QuantaError::Catalog(e.to_string()))
    }
}

/// Prefixed unit resolved by name but not yet registered
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PrefixedUnit {
    pub name: String,
    pub prefix: &'static Prefix,
    pub parent: String,
}

/// Characters with a meaning in unit expressions; not allowed in names
const RESERVED: &[char] = &['*', '/', '^', '(', ')', '·'];

fn validate_definition(name: &str, factor: f64, offset: f64) -> Result<()> {
    if name.is_empty() {
        return Err(QuantaError::invalid_definition(name, "empty name"));
    }
    if name.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c)) {
        return Err(QuantaError::invalid_definition(
            name,
            "name contains whitespace or an operator character",
        ));
    }
    if name.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == '+') {
        return Err(QuantaError::invalid_definition(name, "name starts like a number"));
    }
    if !factor.is_finite() || factor == 0.0 {
        return Err(QuantaError::invalid_definition(
            name,
            format!("factor must be finite and nonzero, got {}", factor),
        ));
    }
    if !offset.is_finite() {
        return Err(QuantaError::invalid_definition(
            name,
            format!("offset must be finite, got {}", offset),
        ));
    }
    Ok(())
}

/// Registry of unit definitions.
///
/// Definitions sit behind a read-write lock: `define` holds the write lock
/// while it reads the parent and inserts, lookups take the read lock.
/// Populate once, then share through an `Arc`.
#[derive(Debug)]
pub struct UnitRegistry {
    units: RwLock<HashMap<String, UnitDef>>,
    prefixes: bool,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Empty registry with on-demand prefix resolution enabled
    pub fn new() -> Self {
        UnitRegistry {
            units: RwLock::new(HashMap::new()),
            prefixes: true,
        }
    }

    /// Registry preloaded with the default catalog
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry
            .load_defaults()
            .expect("default catalog defines parents before children");
        registry
    }

    /// Builder for a shared registry with custom options
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, UnitDef>> {
        self.units.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, UnitDef>> {
        self.units.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Define the default catalog in this registry
    pub fn load_defaults(&self) -> Result<()> {
        let specs = catalog::default_specs();
        self.define_all(&specs)?;
        debug!(count = specs.len(), "loaded default unit catalog");
        Ok(())
    }

    /// Register `name`.
    ///
    /// Without a parent the unit becomes its own base (factor and offset
    /// are ignored). With a parent the definition is composed with the
    /// parent's resolved one:
    /// `factor = factor * parent.factor`,
    /// `offset = offset * parent.factor + parent.offset`.
    ///
    /// Redefining a name replaces the previous definition.
    pub fn define(&self, name: &str, parent: Option<&str>, factor: f64, offset: f64) -> Result<()> {
        validate_definition(name, factor, offset)?;

        let mut units = self.write();
        let def = match parent {
            None => UnitDef::base(name),
            Some(parent) => {
                let parent_def = units
                    .get(parent)
                    .ok_or_else(|| QuantaError::undefined_unit(parent))?;
                if parent_def.base == name {
                    return Err(QuantaError::invalid_definition(
                        name,
                        format!("parent {} resolves back to {}", parent, name),
                    ));
                }
                UnitDef {
                    base: parent_def.base.clone(),
                    factor: factor * parent_def.factor,
                    offset: offset * parent_def.factor + parent_def.offset,
                }
            }
        };

        if def.base != name {
            let is_base_of_others = units
                .iter()
                .any(|(other, d)| d.base == name && other != name);
            if is_base_of_others {
                return Err(QuantaError::invalid_definition(
                    name,
                    "unit is the base of other units and cannot be redefined from a parent",
                ));
            }
        }

        trace!(unit = name, base = %def.base, factor = def.factor, offset = def.offset, "defined unit");
        if units.insert(name.to_string(), def).is_some() {
            debug!(unit = name, "redefined unit");
        }
        Ok(())
    }

    /// Register `name` as its own base unit
    pub fn define_base(&self, name: &str) -> Result<()> {
        self.define(name, None, 1.0, 0.0)
    }

    /// Register `name = factor * parent`
    pub fn define_scaled(&self, name: &str, parent: &str, factor: f64) -> Result<()> {
        self.define(name, Some(parent), factor, 0.0)
    }

    /// Register `name = factor * parent + offset`
    pub fn define_affine(&self, name: &str, parent: &str, factor: f64, offset: f64) -> Result<()> {
        self.define(name, Some(parent), factor, offset)
    }

    /// Register a catalog entry
    pub fn define_spec(&self, spec: &UnitSpec) -> Result<()> {
        self.define(&spec.name, spec.parent.as_deref(), spec.factor, spec.offset)
    }

    /// Define specs in order; stops at the first failure
    pub fn define_all<'a>(&self, specs: impl IntoIterator<Item = &'a UnitSpec>) -> Result<()> {
        for spec in specs {
            self.define_spec(spec)?;
        }
        Ok(())
    }

    /// Check whether `name` is registered (no prefix resolution)
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Resolved definition of a registered unit
    pub fn get(&self, name: &str) -> Result<UnitDef> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| QuantaError::undefined_unit(name))
    }

    /// Name of the base unit `name` resolves to
    pub fn get_base_unit(&self, name: &str) -> Result<String> {
        self.get(name).map(|d| d.base)
    }

    /// Multiplier from `name` to its base unit
    pub fn get_factor(&self, name: &str) -> Result<f64> {
        self.get(name).map(|d| d.factor)
    }

    /// Offset from `name` to its base unit, in base-unit terms
    pub fn get_offset(&self, name: &str) -> Result<f64> {
        self.get(name).map(|d| d.offset)
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All base unit names, sorted
    pub fn base_units(&self) -> Vec<String> {
        self.read()
            .values()
            .map(|d| d.base.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All definitions sorted by name
    pub fn definitions(&self) -> Vec<(String, UnitDef)> {
        let mut defs: Vec<(String, UnitDef)> = self
            .read()
            .iter()
            .map(|(name, def)| (name.clone(), def.clone()))
            .collect();
        defs.sort_by(|a, b| a.0.cmp(&b.0));
        defs
    }

    /// Number of registered units
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when no unit is registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Whether unknown names are tried as prefix plus registered unit
    pub fn prefixes_enabled(&self) -> bool {
        self.prefixes
    }

    /// Resolve a unit name, synthesizing a prefixed unit (`kilometer`)
    /// from a registered one (`meter`) if needed
    pub fn resolve_name(&self, name: &str) -> Result<String> {
        let (_, prefixed) = self.lookup(name)?;
        if let Some(unit) = prefixed {
            self.register_prefixed(std::slice::from_ref(&unit))?;
        }
        Ok(name.to_string())
    }

    /// Definition of `name` without registering anything.
    ///
    /// An unregistered prefixed name yields the definition it would get
    /// plus the pending unit, to be passed to [`Self::register_prefixed`]
    /// once the caller has succeeded.
    pub(crate) fn lookup(&self, name: &str) -> Result<(UnitDef, Option<PrefixedUnit>)> {
        let units = self.read();
        if let Some(def) = units.get(name) {
            return Ok((def.clone(), None));
        }
        if !self.prefixes {
            return Err(QuantaError::undefined_unit(name));
        }
        let (p, rest) = prefix::split_prefix(name, |n| units.contains_key(n))
            .ok_or_else(|| QuantaError::undefined_unit(name))?;
        let parent = units
            .get(rest)
            .ok_or_else(|| QuantaError::undefined_unit(rest))?;
        validate_definition(name, p.factor, 0.0)?;
        let def = UnitDef {
            base: parent.base.clone(),
            factor: p.factor * parent.factor,
            offset: parent.offset,
        };
        let unit = PrefixedUnit {
            name: name.to_string(),
            prefix: p,
            parent: rest.to_string(),
        };
        Ok((def, Some(unit)))
    }

    /// Define prefixed units found by [`Self::lookup`]; names registered in
    /// the meantime are left alone
    pub(crate) fn register_prefixed(&self, units: &[PrefixedUnit]) -> Result<()> {
        for unit in units {
            if self.contains(&unit.name) {
                continue;
            }
            self.define(&unit.name, Some(&unit.parent), unit.prefix.factor, 0.0)?;
            debug!(unit = %unit.name, prefix = unit.prefix.name, parent = %unit.parent, "synthesized prefixed unit");
        }
        Ok(())
    }

    /// One of the named unit: `Quantity(1, name)`
    pub fn unit(self: &Arc<Self>, name: &str) -> Result<Quantity> {
        let name = self.resolve_name(name)?;
        Quantity::new(1.0, name, self)
    }

    /// Quantity built against this registry
    pub fn quantity<V: Numeric>(
        self: &Arc<Self>,
        value: V,
        unit: impl Into<UnitSpecifier>,
    ) -> Result<Quantity<V>> {
        Quantity::new(value, unit, self)
    }

    /// Fail on the first key of `units` that is not registered, or whose
    /// exponent has no negation (numerator `i64::MIN`)
    pub fn validate(&self, units: &UnitMap) -> Result<()> {
        if let Some((name, _)) = units.iter().find(|(_, exp)| !is_representable(exp)) {
            return Err(QuantaError::invalid_operand(
                "quantity",
                format!("exponent of {} is out of range", name),
            ));
        }
        let defs = self.read();
        match units.keys().find(|name| !defs.contains_key(name.as_str())) {
            Some(name) => Err(QuantaError::undefined_unit(name.as_str())),
            None => Ok(()),
        }
    }

    /// Resolve every key to its base and sum exponents per base
    pub fn base_tally(&self, units: &UnitMap) -> Result<BaseTally> {
        let defs = self.read();
        let mut tally = BaseTally::new();
        for (name, exp) in units {
            let def = defs
                .get(name)
                .ok_or_else(|| QuantaError::undefined_unit(name.as_str()))?;
            tally.add(&def.base, *exp)?;
        }
        Ok(tally)
    }

    /// Base tally and `Π factor^exponent` of `units`, resolving prefixed
    /// names without registering them
    pub(crate) fn measure(&self, units: &UnitMap) -> Result<(BaseTally, f64, Vec<PrefixedUnit>)> {
        let mut tally = BaseTally::new();
        let mut scale = 1.0;
        let mut prefixed = Vec::new();
        for (name, exp) in units {
            let (def, unit) = self.lookup(name)?;
            tally.add(&def.base, *exp)?;
            scale *= pow_exponent(def.factor, exp);
            prefixed.extend(unit);
        }
        Ok((tally, scale, prefixed))
    }

    /// `Π factor^exponent`: multiplier from `units` to their base units,
    /// offsets ignored
    pub fn scale_to_base(&self, units: &UnitMap) -> Result<f64> {
        let defs = self.read();
        let mut scale = 1.0;
        for (name, exp) in units {
            let def = defs
                .get(name)
                .ok_or_else(|| QuantaError::undefined_unit(name.as_str()))?;
            scale *= pow_exponent(def.factor, exp);
        }
        Ok(scale)
    }
}

/// Configuration for building a shared registry
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    defaults: bool,
    prefixes: bool,
    definitions: Vec<UnitSpec>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        RegistryBuilder {
            defaults: false,
            prefixes: true,
            definitions: Vec::new(),
        }
    }
}

impl RegistryBuilder {
    /// Load the default catalog before any extra definitions
    pub fn with_defaults(mut self, defaults: bool) -> Self {
        self.defaults = defaults;
        self
    }

    /// Resolve SI long-form prefixes (`kilometer`) on demand
    pub fn with_prefixes(mut self, prefixes: bool) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Extra definitions, applied in order after the defaults
    pub fn with_definitions(mut self, specs: impl IntoIterator<Item = UnitSpec>) -> Self {
        self.definitions.extend(specs);
        self
    }

    /// Builder seeded from a JSON catalog
    pub fn from_json(json: &str) -> Result<Self> {
        Self::default().with_json(json)
    }

    /// Add definitions from a JSON catalog
    pub fn with_json(self, json: &str) -> Result<Self> {
        let specs = UnitSpec::parse_catalog(json)?;
        Ok(self.with_definitions(specs))
    }

    /// Create the registry and apply every definition
    pub fn build(self) -> Result<Arc<UnitRegistry>> {
        let registry = UnitRegistry {
            units: RwLock::new(HashMap::new()),
            prefixes: self.prefixes,
        };
        if self.defaults {
            registry.load_defaults()?;
        }
        registry.define_all(&self.definitions)?;
        Ok(Arc::new(registry))
    }
}
