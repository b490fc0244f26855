//! Compact number notation for HUD text
//!
//! Values below 1000 print as plain integers. Larger values are reduced to
//! three significant digits followed by a group suffix (`1.23k`, `25.2m`,
//! `252b`). Values beyond the suffix table print the `!!` marker as suffix.

/// Group suffixes, one per power of 1000
const SUFFIXES: [&str; 31] = [
    "", "k", "m", "b", "t", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
    "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
];

/// Suffix used once a value outgrows the table
pub const OVERFLOW_SUFFIX: &str = "!!";

/// Format a value in 3-digit fixed-width notation
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "0".to_string();
    }
    if value < 1000.0 {
        return format!("{}", value.floor() as i64);
    }

    let mut exp = (value.log10() / 3.0).floor();
    // log10 rounding near exact powers of 1000
    if exp.is_finite() && value / 1000f64.powf(exp) >= 1000.0 {
        exp += 1.0;
    }
    let suffix = if exp.is_finite() && (exp as usize) < SUFFIXES.len() {
        SUFFIXES[exp as usize]
    } else {
        OVERFLOW_SUFFIX
    };
    let short = value / 1000f64.powf(exp);

    if !short.is_finite() {
        return format!("0{suffix}");
    }
    if short >= 100.0 {
        format!("{}{suffix}", short.floor() as i64)
    } else if short >= 10.0 {
        format!("{:.1}{suffix}", short)
    } else {
        format!("{:.2}{suffix}", short)
    }
}
