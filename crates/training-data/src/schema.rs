//! Header reconciliation for LMS exports.
//!
//! LMS exports have shipped under several header conventions (display names,
//! camelCase, snake_case). [`ColumnMapping`] resolves whatever header row a
//! file carries onto [`CanonicalField`]s once, and [`normalize`] applies it to
//! every row. Columns with no alias are dropped.

use serde::Serialize;
use tracing::{debug, warn};

// ── Canonical fields ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Course,
    EnrollmentDate,
    StartedDate,
    CompletionDate,
    Status,
    ProgressPercentage,
    TimeSpentMinutes,
    QuizScore,
    CentreNumber,
    CentreCountry,
}

/// Every header spelling we know of, per canonical field.
const ALIASES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::Course, &["Course", "course"]),
    (
        CanonicalField::EnrollmentDate,
        &[
            "Enrollment Date (UTC TimeZone)",
            "Enrollment Date",
            "enrollmentDate",
            "enrollment_date",
        ],
    ),
    (
        CanonicalField::StartedDate,
        &[
            "Started Date (UTC TimeZone)",
            "Started Date",
            "startedDate",
            "started_date",
        ],
    ),
    (
        CanonicalField::CompletionDate,
        &[
            "Completion Date (UTC TimeZone)",
            "Completion Date",
            "completionDate",
            "completion_date",
        ],
    ),
    (CanonicalField::Status, &["Status", "status"]),
    (
        CanonicalField::ProgressPercentage,
        &["Progress %", "progressPercentage", "progress"],
    ),
    (
        CanonicalField::TimeSpentMinutes,
        &["Time Spent(minutes)", "timeSpentMinutes", "time_spent"],
    ),
    (
        CanonicalField::QuizScore,
        &["Quiz_score", "Quiz Score", "quizScore", "quiz_score"],
    ),
    (
        CanonicalField::CentreNumber,
        &["Centre Number", "centreNumber", "centre_number"],
    ),
    (
        CanonicalField::CentreCountry,
        &["Centre Country", "centreCountry", "centre_country"],
    ),
];

impl CanonicalField {
    /// Resolve one raw header cell. Surrounding whitespace and a UTF-8 BOM
    /// are ignored; otherwise the match is exact.
    pub fn from_header(header: &str) -> Option<CanonicalField> {
        let cleaned = header.trim_start_matches('\u{feff}').trim();
        ALIASES
            .iter()
            .find(|(_, names)| names.contains(&cleaned))
            .map(|(field, _)| *field)
    }
}

// ── ColumnMapping ─────────────────────────────────────────────────────────────

/// Column index → canonical field, built from one header row.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    columns: Vec<Option<CanonicalField>>,
}

impl ColumnMapping {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let columns: Vec<Option<CanonicalField>> = headers
            .iter()
            .map(|h| CanonicalField::from_header(h.as_ref()))
            .collect();

        let dropped: Vec<&str> = headers
            .iter()
            .zip(&columns)
            .filter(|(_, c)| c.is_none())
            .map(|(h, _)| h.as_ref())
            .collect();
        if !dropped.is_empty() {
            debug!("Dropping unmapped columns: {:?}", dropped);
        }

        Self { columns }
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.columns.iter().any(|c| *c == Some(field))
    }

    pub fn mapped_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    /// Apply the mapping to one data row. Cells past the header width are
    /// ignored; blank cells stay `None`.
    pub fn apply<S: AsRef<str>>(&self, row: &[S]) -> NormalizedRow {
        let mut out = NormalizedRow::default();
        for (field, cell) in self.columns.iter().zip(row) {
            if let Some(field) = field {
                let value = cell.as_ref().trim();
                // A later duplicate header overwrites an earlier one.
                out.set(*field, (!value.is_empty()).then(|| value.to_string()));
            }
        }
        out
    }
}

// ── NormalizedRow ─────────────────────────────────────────────────────────────

/// One LMS row keyed by canonical field. `None` means the column was absent
/// or the cell was blank; defaults are the record builder's business.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    pub course: Option<String>,
    pub enrollment_date: Option<String>,
    pub started_date: Option<String>,
    pub completion_date: Option<String>,
    pub status: Option<String>,
    pub progress_percentage: Option<String>,
    pub time_spent_minutes: Option<String>,
    pub quiz_score: Option<String>,
    pub centre_number: Option<String>,
    pub centre_country: Option<String>,
}

impl NormalizedRow {
    fn set(&mut self, field: CanonicalField, value: Option<String>) {
        let slot = match field {
            CanonicalField::Course => &mut self.course,
            CanonicalField::EnrollmentDate => &mut self.enrollment_date,
            CanonicalField::StartedDate => &mut self.started_date,
            CanonicalField::CompletionDate => &mut self.completion_date,
            CanonicalField::Status => &mut self.status,
            CanonicalField::ProgressPercentage => &mut self.progress_percentage,
            CanonicalField::TimeSpentMinutes => &mut self.time_spent_minutes,
            CanonicalField::QuizScore => &mut self.quiz_score,
            CanonicalField::CentreNumber => &mut self.centre_number,
            CanonicalField::CentreCountry => &mut self.centre_country,
        };
        *slot = value;
    }
}

// ── normalize ─────────────────────────────────────────────────────────────────

/// Normalise `rows` against `headers`.
///
/// Output has exactly one entry per input row, in input order. Nothing is
/// filtered here.
pub fn normalize<S: AsRef<str>, R: AsRef<[S]>>(headers: &[S], rows: &[R]) -> Vec<NormalizedRow> {
    let mapping = ColumnMapping::from_headers(headers);
    if !mapping.contains(CanonicalField::Course) {
        warn!("Header row has no course column; every row will be dropped");
    }
    rows.iter().map(|r| mapping.apply(r.as_ref())).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
