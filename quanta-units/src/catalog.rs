//! Default unit catalog, organized by category
//!
//! Parents always precede their children. Derived quantities (power, force,
//! energy, pressure, volume, charge) are independent base units: `W` does
//! not reduce to `kg m^2 s^-3`.

use crate::UnitSpec;

/// Every default definition, in definition order
pub fn default_specs() -> Vec<UnitSpec> {
    let mut specs = Vec::new();
    length_units(&mut specs);
    mass_units(&mut specs);
    time_units(&mut specs);
    temperature_units(&mut specs);
    current_units(&mut specs);
    amount_units(&mut specs);
    charge_units(&mut specs);
    power_units(&mut specs);
    force_units(&mut specs);
    energy_units(&mut specs);
    pressure_units(&mut specs);
    volume_units(&mut specs);
    specs
}

fn base(specs: &mut Vec<UnitSpec>, name: &str) {
    specs.push(UnitSpec::base(name));
}

fn scaled(specs: &mut Vec<UnitSpec>, name: &str, parent: &str, factor: f64) {
    specs.push(UnitSpec::scaled(name, parent, factor));
}

fn affine(specs: &mut Vec<UnitSpec>, name: &str, parent: &str, factor: f64, offset: f64) {
    specs.push(UnitSpec::affine(name, Some(parent), factor, offset));
}

fn length_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "m");
    scaled(specs, "meter", "m", 1.0);
    scaled(specs, "mm", "m", 0.001);
    scaled(specs, "cm", "m", 0.01);
    scaled(specs, "km", "m", 1000.0);
    scaled(specs, "inch", "m", 0.0254);
    scaled(specs, "ft", "inch", 12.0);
    scaled(specs, "yd", "ft", 3.0);
    scaled(specs, "mile", "yd", 1760.0);
}

fn mass_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "kg");
    scaled(specs, "g", "kg", 0.001);
    scaled(specs, "gram", "g", 1.0);
    scaled(specs, "mg", "g", 0.001);
    scaled(specs, "lb", "kg", 0.45359237);
    scaled(specs, "oz", "lb", 1.0 / 16.0);
}

fn time_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "s");
    scaled(specs, "second", "s", 1.0);
    scaled(specs, "ms", "s", 0.001);
    scaled(specs, "min", "s", 60.0);
    scaled(specs, "hr", "min", 60.0);
    scaled(specs, "hour", "hr", 1.0);
    scaled(specs, "day", "hr", 24.0);
}

fn temperature_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "K");
    scaled(specs, "kelvin", "K", 1.0);
    affine(specs, "degC", "K", 1.0, 273.15);
    // Rankine is absolute: no offset
    scaled(specs, "degR", "K", 5.0 / 9.0);
    affine(specs, "degF", "K", 5.0 / 9.0, 255.37222222222222);
}

fn current_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "A");
    scaled(specs, "ampere", "A", 1.0);
    scaled(specs, "mA", "A", 0.001);
}

fn amount_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "mol");
    scaled(specs, "mole", "mol", 1.0);
    scaled(specs, "mmol", "mol", 0.001);
}

fn charge_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "C");
    scaled(specs, "coulomb", "C", 1.0);
}

fn power_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "W");
    scaled(specs, "watt", "W", 1.0);
    scaled(specs, "kW", "W", 1000.0);
    scaled(specs, "MW", "W", 1e6);
    scaled(specs, "hp", "W", 745.69987158227022);
}

fn force_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "N");
    scaled(specs, "newton", "N", 1.0);
    scaled(specs, "kN", "N", 1000.0);
    scaled(specs, "lbf", "N", 4.4482216152605);
}

fn energy_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "J");
    scaled(specs, "joule", "J", 1.0);
    scaled(specs, "kJ", "J", 1000.0);
    scaled(specs, "cal", "J", 4.184);
    scaled(specs, "kcal", "cal", 1000.0);
    scaled(specs, "Wh", "J", 3600.0);
    scaled(specs, "kWh", "Wh", 1000.0);
}

fn pressure_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "Pa");
    scaled(specs, "pascal", "Pa", 1.0);
    scaled(specs, "kPa", "Pa", 1000.0);
    scaled(specs, "bar", "Pa", 100_000.0);
    scaled(specs, "atm", "Pa", 101_325.0);
    scaled(specs, "mmHg", "Pa", 133.322387415);
    scaled(specs, "psi", "Pa", 6894.757293168);
}

fn volume_units(specs: &mut Vec<UnitSpec>) {
    base(specs, "L");
    scaled(specs, "liter", "L", 1.0);
    scaled(specs, "mL", "L", 0.001);
}
