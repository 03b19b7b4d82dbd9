use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// Substrings that mark a course or demo as a vocational qualification.
const VQ_MARKERS: &[&str] = &["pop", "btec", "cohort", "vq"];

// ── Status ────────────────────────────────────────────────────────────────────

/// Enrollment status as exported by the LMS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Completed,
    #[serde(rename = "In Progress")]
    InProgress,
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    Unenrolled,
}

impl EnrollmentStatus {
    /// Parse a raw status cell. Returns `None` for anything unrecognised so
    /// the caller decides the default.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "completed" => Some(Self::Completed),
            "inprogress" => Some(Self::InProgress),
            "notstarted" => Some(Self::NotStarted),
            "unenrolled" => Some(Self::Unenrolled),
            _ => None,
        }
    }

    pub const ALL: [EnrollmentStatus; 4] = [
        Self::Completed,
        Self::InProgress,
        Self::NotStarted,
        Self::Unenrolled,
    ];
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "Completed",
            Self::InProgress => "In Progress",
            Self::NotStarted => "Not Started",
            Self::Unenrolled => "Unenrolled",
        };
        f.write_str(s)
    }
}

// ── Category ──────────────────────────────────────────────────────────────────

/// Delivery category inferred from a course or demo title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Webinar,
    Recording,
    #[serde(rename = "eLearning")]
    ELearning,
    Other,
}

impl Category {
    /// Classify a free-text title.
    ///
    /// The check is case-insensitive and ordered: `webinar` wins over
    /// `recording`, and anything else falls back to `fallback`. Every
    /// aggregation and filter path goes through this function.
    pub fn classify(title: &str, fallback: Category) -> Category {
        let lower = title.to_lowercase();
        if lower.contains("webinar") {
            Category::Webinar
        } else if lower.contains("recording") {
            Category::Recording
        } else {
            fallback
        }
    }

    /// Classify an LMS course title; unmatched titles are eLearning.
    pub fn of_course(course: &str) -> Category {
        Self::classify(course, Category::ELearning)
    }

    /// Classify an engagement demo name; unmatched names are `Other`.
    pub fn of_demo(demo: &str) -> Category {
        Self::classify(demo, Category::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webinar => "Webinar",
            Self::Recording => "Recording",
            Self::ELearning => "eLearning",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "webinar" => Ok(Self::Webinar),
            "recording" => Ok(Self::Recording),
            "elearning" | "e-learning" => Ok(Self::ELearning),
            "other" => Ok(Self::Other),
            other => Err(ReportError::InvalidFilter(format!("unknown category \"{}\"", other))),
        }
    }
}

// ── Qualification type ────────────────────────────────────────────────────────

/// Vocational vs general qualification grouping, inferred from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualificationType {
    Vq,
    Gq,
}

impl QualificationType {
    /// `Vq` when the text contains any of `pop`, `btec`, `cohort` or `vq`
    /// (case-insensitive), otherwise `Gq`.
    pub fn infer(text: &str) -> QualificationType {
        let lower = text.to_lowercase();
        if VQ_MARKERS.iter().any(|m| lower.contains(m)) {
            QualificationType::Vq
        } else {
            QualificationType::Gq
        }
    }
}

/// Qualification selector in a filter; `All` disables the dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualificationFilter {
    #[default]
    All,
    Vq,
    Gq,
}

impl QualificationFilter {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::All => true,
            Self::Vq => QualificationType::infer(text) == QualificationType::Vq,
            Self::Gq => QualificationType::infer(text) == QualificationType::Gq,
        }
    }
}

impl FromStr for QualificationFilter {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "vq" => Ok(Self::Vq),
            "gq" => Ok(Self::Gq),
            other => Err(ReportError::InvalidFilter(format!(
                "unknown qualification type \"{}\"",
                other
            ))),
        }
    }
}

// ── Geography ─────────────────────────────────────────────────────────────────

/// `true` when a free-text country names the United Kingdom.
///
/// Only the exact (case-insensitive) forms `uk` and `united kingdom` count.
pub fn is_uk_country(country: &str) -> bool {
    let lower = country.trim().to_lowercase();
    lower == "uk" || lower == "united kingdom"
}

/// Country selector in a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryScope {
    #[default]
    All,
    Uk,
    International,
}

impl CountryScope {
    pub fn matches(&self, country: &str) -> bool {
        match self {
            Self::All => true,
            Self::Uk => is_uk_country(country),
            Self::International => !is_uk_country(country),
        }
    }
}

impl FromStr for CountryScope {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "uk" => Ok(Self::Uk),
            "international" => Ok(Self::International),
            other => Err(ReportError::InvalidFilter(format!(
                "unknown country scope \"{}\"",
                other
            ))),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One LMS enrollment row after normalisation and defaulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Course or session title. Never empty.
    pub course: String,
    /// `None` when the source cell could not be parsed and the
    /// `unknown` policy is active.
    pub enrollment_date: Option<NaiveDateTime>,
    pub started_date: Option<NaiveDateTime>,
    pub completion_date: Option<NaiveDateTime>,
    pub status: EnrollmentStatus,
    /// 0–100.
    pub progress_percentage: f64,
    pub time_spent_minutes: i64,
    pub quiz_score: Option<f64>,
    pub centre_number: String,
    pub centre_country: String,
}

impl TrainingRecord {
    pub fn category(&self) -> Category {
        Category::of_course(&self.course)
    }
}

/// One StoryLane demo view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub demo: String,
    pub link: String,
    /// Raw `M/D/YY H:MM` string; parsed on demand.
    pub last_view: String,
    /// Free-text duration, kept verbatim.
    pub total_time: String,
    pub steps_completed: i64,
    /// Always on the 0–100 scale.
    pub percent_complete: f64,
    pub opened_cta: String,
    pub cta_clicked: bool,
    pub country: String,
    pub centre_number: String,
}

impl EngagementRecord {
    pub fn category(&self) -> Category {
        Category::of_demo(&self.demo)
    }
}

/// `true` iff the trimmed CTA cell is neither `-` nor empty and contains
/// `http`.
pub fn cta_clicked(opened_cta: &str) -> bool {
    let trimmed = opened_cta.trim();
    !trimmed.is_empty() && trimmed != "-" && trimmed.contains("http")
}

// ── Filter specification ──────────────────────────────────────────────────────

/// User-selected view criteria. Every empty / `None` / `All` field means
/// "no restriction" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive lower bound, `YYYY-MM`.
    pub start_month: Option<String>,
    /// Inclusive upper bound, `YYYY-MM`.
    pub end_month: Option<String>,
    pub categories: Vec<Category>,
    pub country: CountryScope,
    /// eLearning course selector, exact title.
    pub course: Option<String>,
    pub qualification: QualificationFilter,
    pub centres: Vec<String>,
    pub courses: Vec<String>,
    pub search: Option<String>,
    /// Engagement demo selector, substring of the demo name.
    pub demo: Option<String>,
}

impl FilterSpec {
    /// Check month bounds are well formed and ordered.
    pub fn validate(&self) -> crate::error::Result<()> {
        for month in [&self.start_month, &self.end_month].into_iter().flatten() {
            if !crate::time_utils::is_month_key(month) {
                return Err(ReportError::InvalidFilter(format!(
                    "month \"{}\" is not in YYYY-MM form",
                    month
                )));
            }
        }
        if let (Some(start), Some(end)) = (&self.start_month, &self.end_month) {
            if start > end {
                return Err(ReportError::InvalidFilter(format!(
                    "start month {} is after end month {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// `true` when no dimension restricts anything.
    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }
}
