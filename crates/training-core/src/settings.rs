use clap::Parser;
use std::path::PathBuf;

use crate::error::{ReportError, Result};
use crate::models::{Category, CountryScope, FilterSpec, QualificationFilter};

// ── EnrollmentDatePolicy ───────────────────────────────────────────────────────

/// What the LMS record builder does with an enrollment date it cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EnrollmentDatePolicy {
    /// Leave the date empty; the record still counts in unfiltered totals
    /// but drops out of month grouping and bounded time ranges.
    #[default]
    Unknown,
    /// Substitute the current wall-clock time.
    Now,
}

/// Output format for the report binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Training and demo engagement report builder
#[derive(Parser, Debug, Clone)]
#[command(
    name = "training-report",
    about = "Training and demo engagement report builder",
    version
)]
pub struct Settings {
    /// Directory probed for the LMS and StoryLane exports
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Explicit path to the LMS export
    #[arg(long)]
    pub lms_file: Option<PathBuf>,

    /// Explicit path to the StoryLane export
    #[arg(long)]
    pub engagement_file: Option<PathBuf>,

    /// Timezone for interpreting offset-bearing timestamps (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Handling of unparseable enrollment dates
    #[arg(long, value_enum, default_value_t = EnrollmentDatePolicy::Unknown)]
    pub missing_enrollment_date: EnrollmentDatePolicy,

    /// First month to include (YYYY-MM)
    #[arg(long)]
    pub start_month: Option<String>,

    /// Last month to include (YYYY-MM)
    #[arg(long)]
    pub end_month: Option<String>,

    /// Category to include (repeatable): Webinar, Recording, eLearning, Other
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Country scope
    #[arg(long, default_value = "all", value_parser = ["all", "uk", "international"])]
    pub country: String,

    /// eLearning course to focus on
    #[arg(long)]
    pub course: Option<String>,

    /// Qualification type
    #[arg(long, default_value = "all", value_parser = ["all", "vq", "gq"])]
    pub qualification: String,

    /// Centre number to include (repeatable)
    #[arg(long = "centre")]
    pub centres: Vec<String>,

    /// Exact course title to include (repeatable)
    #[arg(long = "include-course")]
    pub courses: Vec<String>,

    /// Free-text search over demo, country, centre and last view
    #[arg(long)]
    pub search: Option<String>,

    /// Demo name filter (substring)
    #[arg(long)]
    pub demo: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and resolve `"auto"` values.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::resolve_auto_values(Settings::parse_from(args))
    }

    /// Resolve the `"auto"` timezone and apply `--debug`.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Build and validate the [`FilterSpec`] described by the filter flags.
    pub fn filter_spec(&self) -> Result<FilterSpec> {
        let categories = self
            .categories
            .iter()
            .map(|c| c.parse::<Category>())
            .collect::<Result<Vec<_>>>()?;

        let spec = FilterSpec {
            start_month: non_empty(&self.start_month),
            end_month: non_empty(&self.end_month),
            categories,
            country: self.country.parse::<CountryScope>()?,
            course: non_empty(&self.course),
            qualification: self.qualification.parse::<QualificationFilter>()?,
            centres: self.centres.clone(),
            courses: self.courses.clone(),
            search: non_empty(&self.search),
            demo: non_empty(&self.demo),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Fail early when `--data-dir` names a directory that does not exist and
    /// no explicit LMS path overrides it.
    pub fn require_data_source(&self) -> Result<()> {
        if let (None, Some(dir)) = (&self.lms_file, &self.data_dir) {
            if !dir.is_dir() {
                return Err(ReportError::Config(format!(
                    "data directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
