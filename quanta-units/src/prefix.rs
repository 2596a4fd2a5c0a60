//! SI long-form prefixes (`kilo`, `milli`, ...) resolved on demand
//!
//! Only full prefix words are recognised, and only in front of word-like
//! unit names: the remainder must be at least three lowercase ASCII
//! letters. `kilometer` resolves against `meter`; `kilom` and `nanos` do
//! not resolve against the symbols `m` and `s`. Symbol prefixes (`k`, `m`,
//! `µ`) are never split off because they collide with registered symbols
//! such as `min` or `mile`.

/// A decimal multiple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prefix {
    pub name: &'static str,
    pub factor: f64,
}

const fn prefix(name: &'static str, factor: f64) -> Prefix {
    Prefix { name, factor }
}

/// SI prefixes, largest first
pub static PREFIXES: &[Prefix] = &[
    prefix("quetta", 1e30),
    prefix("ronna", 1e27),
    prefix("yotta", 1e24),
    prefix("zetta", 1e21),
    prefix("exa", 1e18),
    prefix("peta", 1e15),
    prefix("tera", 1e12),
    prefix("giga", 1e9),
    prefix("mega", 1e6),
    prefix("kilo", 1e3),
    prefix("hecto", 1e2),
    prefix("deca", 1e1),
    prefix("deka", 1e1),
    prefix("deci", 1e-1),
    prefix("centi", 1e-2),
    prefix("milli", 1e-3),
    prefix("micro", 1e-6),
    prefix("nano", 1e-9),
    prefix("pico", 1e-12),
    prefix("femto", 1e-15),
    prefix("atto", 1e-18),
    prefix("zepto", 1e-21),
    prefix("yocto", 1e-24),
    prefix("ronto", 1e-27),
    prefix("quecto", 1e-30),
];

/// Shortest unit name a prefix may attach to
const MIN_REMAINDER: usize = 3;

fn is_word(rest: &str) -> bool {
    rest.len() >= MIN_REMAINDER && rest.chars().all(|c| c.is_ascii_lowercase())
}

/// Look up a prefix by its full name
pub fn find_prefix(name: &str) -> Option<&'static Prefix> {
    PREFIXES.iter().find(|p| p.name == name)
}

/// Split `name` into a prefix and a known remainder.
///
/// The longest matching prefix wins; the remainder must be a lowercase
/// word of at least three letters and satisfy `is_known` as-is (no nested
/// prefixes).
pub fn split_prefix<'a>(
    name: &'a str,
    is_known: impl Fn(&str) -> bool,
) -> Option<(&'static Prefix, &'a str)> {
    PREFIXES
        .iter()
        .filter_map(|p| {
            let rest = name.strip_prefix(p.name)?;
            (is_word(rest) && is_known(rest)).then_some((p, rest))
        })
        .max_by_key(|(p, _)| p.name.len())
}
