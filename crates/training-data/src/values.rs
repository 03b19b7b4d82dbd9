//! Lenient cell-value parsing shared by both record builders.
//!
//! Numbers are read from the leading numeric prefix of a cell, so `"45 min"`
//! gives 45 and `"0.5abc"` gives 0.5. Anything without a numeric prefix is
//! `None` and the builder applies its default.

use std::sync::OnceLock;

use regex::Regex;

fn leading_int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+").expect("regex is valid"))
}

fn leading_float_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)")
            .expect("regex is valid")
    })
}

/// Integer from the leading digits of `cell`.
pub fn parse_leading_int(cell: Option<&str>) -> Option<i64> {
    let s = cell?.trim();
    leading_int_re().find(s)?.as_str().parse().ok()
}

/// Float from the leading numeric prefix of `cell`.
pub fn parse_leading_float(cell: Option<&str>) -> Option<f64> {
    let s = cell?.trim();
    let value: f64 = leading_float_re().find(s)?.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}

/// `Some(trimmed)` for a non-blank cell.
pub fn non_blank(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}
