/// Format a number with thousands separators and a fixed number of decimal
/// places.
///
/// # Examples
///
/// ```
/// use training_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let grouped = group_thousands(&(rounded.trunc() as u64).to_string());
    let body = if decimals == 0 {
        grouped
    } else {
        let frac = format!("{:.prec$}", rounded.fract(), prec = decimals as usize);
        format!("{}{}", grouped, &frac[1..])
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format an integer count with thousands separators.
pub fn format_count(count: usize) -> String {
    group_thousands(&count.to_string())
}

/// Format a 0–100 value as a percentage with one decimal place.
///
/// ```
/// use training_core::formatting::format_percent;
///
/// assert_eq!(format_percent(84.25), "84.3%");
/// assert_eq!(format_percent(0.0), "0.0%");
/// ```
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value, 1))
}

/// Format a duration in minutes: `"45m"`, `"3h"`, `"3h 45m"`.
pub fn format_minutes(minutes: f64) -> String {
    let total_mins = minutes.round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
