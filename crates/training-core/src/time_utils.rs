use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Patterns ──────────────────────────────────────────────────────────────────

/// `M/D/YY H:MM` as written by StoryLane and some LMS exports.
fn short_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})\s+(\d{1,2}):(\d{2})$")
            .expect("regex is valid")
    })
}

/// `M/D/YY` followed by anything (ignored).
fn short_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})(?:\s|$)").expect("regex is valid")
    })
}

fn month_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("regex is valid"))
}

/// Naive layouts accepted by the fallback parser, interpreted as wall-clock
/// time in the parser's zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y"];

// ── DateParser ────────────────────────────────────────────────────────────────

/// Parses the heterogeneous date strings found in LMS and StoryLane exports.
///
/// Output is a naive wall-clock timestamp in the parser's zone. Inputs that
/// carry an explicit offset (RFC 3339, RFC 2822) are converted into that zone
/// first.
#[derive(Debug, Clone)]
pub struct DateParser {
    default_tz: Tz,
}

impl Default for DateParser {
    fn default() -> Self {
        Self { default_tz: Tz::UTC }
    }
}

impl DateParser {
    /// Create a parser for the given IANA zone.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "DateParser: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Parse `input` into a timestamp.
    ///
    /// Empty, whitespace-only and absent inputs give `None` silently.
    /// Anything non-empty that matches no known layout gives `None` and a
    /// warning.
    pub fn parse(&self, input: Option<&str>) -> Option<NaiveDateTime> {
        let s = input?.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(caps) = short_datetime_re().captures(s) {
            let hour: u32 = caps[4].parse().ok()?;
            let minute: u32 = caps[5].parse().ok()?;
            if let Some(dt) = short_date(&caps[1], &caps[2], &caps[3])
                .and_then(|d| d.and_hms_opt(hour, minute, 0))
            {
                return Some(dt);
            }
        } else if let Some(caps) = short_date_re().captures(s) {
            if let Some(dt) =
                short_date(&caps[1], &caps[2], &caps[3]).and_then(|d| d.and_hms_opt(0, 0, 0))
            {
                return Some(dt);
            }
        }

        if let Some(dt) = self.parse_general(s) {
            return Some(dt);
        }

        warn!("DateParser: could not parse date \"{}\"", s);
        None
    }

    /// The current wall-clock time in the parser's zone.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.default_tz).naive_local()
    }

    /// Expose the configured zone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }

    // ── Private ───────────────────────────────────────────────────────────

    /// ISO 8601 / RFC 3339 / RFC 2822 and a few common naive layouts.
    fn parse_general(&self, s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&self.default_tz).naive_local());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&self.default_tz).naive_local());
        }

        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
        None
    }
}

/// Build a date from `M`, `D` and a 2- or 4-digit year. Two-digit years are
/// taken as 20YY.
fn short_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

// ── Month keys ────────────────────────────────────────────────────────────────

/// `YYYY-MM` key used for grouping and time-range filtering.
pub fn month_key(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m").to_string()
}

/// Human label for a month, e.g. `"May 2024"`.
pub fn month_display_name(dt: &NaiveDateTime) -> String {
    dt.format("%B %Y").to_string()
}

/// `true` for a well-formed `YYYY-MM` string.
pub fn is_month_key(s: &str) -> bool {
    month_key_re().is_match(s)
}
