//! Locale independent conversion between floating point values and text.
//!
//! Formatting produces the shortest decimal string that parses back to the same bits. Very large
//! and very small magnitudes switch to exponent form so the output stays compact.

use std::fmt::Write;

const EXPONENT_ABOVE: f64 = 1e21;
const EXPONENT_BELOW: f64 = 1e-6;

/// Formats a finite or non-finite `f64`.
///
/// Non-finite values are rendered as `nan`, `inf` and `-inf`; callers that need a different
/// spelling (JSON uses `"NaN"` and `"Infinity"`) check for them first.
pub fn format_double(value: f64) -> String {
    let mut out = String::new();
    write_double(&mut out, value);
    out
}

/// Formats an `f32` using the shortest representation that round trips through `f32`.
pub fn format_float(value: f32) -> String {
    let mut out = String::new();
    write_float(&mut out, value);
    out
}

pub(crate) fn write_double(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
    } else if use_exponent(value.abs()) {
        let start = out.len();
        let _ = write!(out, "{value:e}");
        fix_exponent_sign(out, start);
    } else {
        let _ = write!(out, "{value}");
    }
}

pub(crate) fn write_float(out: &mut String, value: f32) {
    if value.is_nan() {
        out.push_str("nan");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
    } else if use_exponent(f64::from(value.abs())) {
        let start = out.len();
        let _ = write!(out, "{value:e}");
        fix_exponent_sign(out, start);
    } else {
        let _ = write!(out, "{value}");
    }
}

fn use_exponent(magnitude: f64) -> bool {
    magnitude >= EXPONENT_ABOVE || (magnitude != 0.0 && magnitude < EXPONENT_BELOW)
}

/// Rust prints `1e21`; protobuf implementations print `1e+21`.
fn fix_exponent_sign(out: &mut String, start: usize) {
    if let Some(e) = out[start..].find('e') {
        let at = start + e + 1;
        if !out[at..].starts_with('-') {
            out.insert(at, '+');
        }
    }
}

/// Parses a decimal floating point literal.
///
/// Only the numeric grammar is accepted: `inf`, `nan` and friends are rejected here because every
/// format spells them differently.
pub fn parse_double(text: &str) -> Option<f64> {
    let first = *text.as_bytes().first()?;
    if !(first.is_ascii_digit() || first == b'-' || first == b'+' || first == b'.') {
        return None;
    }
    let digits = text.trim_start_matches(['-', '+']);
    if !digits
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    text.parse::<f64>().ok()
}
