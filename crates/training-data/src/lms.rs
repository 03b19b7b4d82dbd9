//! Build [`TrainingRecord`]s from normalised LMS rows.

use training_core::models::{EnrollmentStatus, TrainingRecord};
use training_core::settings::EnrollmentDatePolicy;
use training_core::time_utils::DateParser;
use tracing::debug;

use crate::schema::{normalize, NormalizedRow};
use crate::values::{non_blank, parse_leading_float, parse_leading_int};

/// Turns LMS rows into canonical records, applying per-field defaults.
///
/// | field              | when missing or unparseable          |
/// |--------------------|--------------------------------------|
/// | course             | row dropped                          |
/// | enrollment date    | per [`EnrollmentDatePolicy`]         |
/// | started/completion | `None`                               |
/// | status             | `NotStarted`                         |
/// | progress, time     | `0`                                  |
/// | quiz score         | `None`                               |
#[derive(Debug, Clone, Default)]
pub struct TrainingRecordBuilder {
    parser: DateParser,
    policy: EnrollmentDatePolicy,
}

impl TrainingRecordBuilder {
    pub fn new(parser: DateParser, policy: EnrollmentDatePolicy) -> Self {
        Self { parser, policy }
    }

    /// Build records from a header row and its data rows. Output keeps input
    /// order; duplicate enrollments are kept.
    pub fn build<S: AsRef<str>, R: AsRef<[S]>>(&self, header: &[S], rows: &[R]) -> Vec<TrainingRecord> {
        normalize(header, rows)
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let record = self.build_record(row);
                if record.is_none() {
                    debug!("Skipping LMS row {}: no course", index + 1);
                }
                record
            })
            .collect()
    }

    /// Build one record, or `None` when the row has no course.
    pub fn build_record(&self, row: &NormalizedRow) -> Option<TrainingRecord> {
        let course = non_blank(row.course.as_deref())?.to_string();

        let enrollment_date = self
            .parser
            .parse(row.enrollment_date.as_deref())
            .or_else(|| match self.policy {
                EnrollmentDatePolicy::Now => Some(self.parser.now()),
                EnrollmentDatePolicy::Unknown => None,
            });

        let status = row
            .status
            .as_deref()
            .and_then(EnrollmentStatus::parse)
            .unwrap_or_default();

        Some(TrainingRecord {
            course,
            enrollment_date,
            started_date: self.parser.parse(row.started_date.as_deref()),
            completion_date: self.parser.parse(row.completion_date.as_deref()),
            status,
            progress_percentage: parse_leading_float(row.progress_percentage.as_deref())
                .unwrap_or(0.0),
            time_spent_minutes: parse_leading_int(row.time_spent_minutes.as_deref()).unwrap_or(0),
            quiz_score: parse_leading_float(row.quiz_score.as_deref()),
            centre_number: non_blank(row.centre_number.as_deref())
                .unwrap_or_default()
                .to_string(),
            centre_country: non_blank(row.centre_country.as_deref())
                .unwrap_or_default()
                .to_string(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
