//! Export file discovery and loading.
//!
//! The LMS export is required: a missing or empty file is an error. The
//! StoryLane export is optional: a missing file loads as zero records.

use std::path::{Path, PathBuf};

use serde::Serialize;
use training_core::error::{ReportError, Result};
use training_core::models::{EngagementRecord, TrainingRecord};
use tracing::{debug, info, warn};

use crate::lms::TrainingRecordBuilder;
use crate::storylane::{EngagementRecordBuilder, MIN_ENGAGEMENT_FIELDS};
use crate::tokenizer::{tokenize, tokenize_layered, TokenizeStrategy};

/// Conventional name of the LMS export.
pub const LMS_FILE_NAME: &str = "data for cursor.csv";

/// Conventional name of the StoryLane export.
pub const ENGAGEMENT_FILE_NAME: &str = "Storylane all.csv";

// ── DataPaths ─────────────────────────────────────────────────────────────────

/// Locations of the two exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub lms: PathBuf,
    pub engagement: PathBuf,
}

impl DataPaths {
    /// Both files under their conventional names in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            lms: dir.join(LMS_FILE_NAME),
            engagement: dir.join(ENGAGEMENT_FILE_NAME),
        }
    }
}

// ── LoadReport ────────────────────────────────────────────────────────────────

/// What one ingestion pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// File path or other label for the input.
    pub source: String,
    /// Data rows seen, header excluded.
    pub rows_read: usize,
    pub records_built: usize,
    pub rows_skipped: usize,
    /// Tokenizer layer that was accepted; `None` when nothing was read.
    pub strategy: Option<TokenizeStrategy>,
}

impl LoadReport {
    fn new(source: &str, rows_read: usize, records_built: usize, strategy: TokenizeStrategy) -> Self {
        Self {
            source: source.to_string(),
            rows_read,
            records_built,
            rows_skipped: rows_read.saturating_sub(records_built),
            strategy: Some(strategy),
        }
    }

    fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }
}

// ── Text parsing ──────────────────────────────────────────────────────────────

/// Parse LMS export text. `source` labels the input in logs and errors.
///
/// Fails with [`ReportError::EmptyDataset`] when no row yields a record.
pub fn parse_lms_text(
    text: &str,
    builder: &TrainingRecordBuilder,
    source: &str,
) -> Result<(Vec<TrainingRecord>, LoadReport)> {
    let rows = tokenize(text, TokenizeStrategy::Comma.delimiter());
    let Some((header, data)) = rows.split_first() else {
        return Err(ReportError::EmptyDataset(source.to_string()));
    };

    let records = builder.build(header, data);
    let report = LoadReport::new(source, data.len(), records.len(), TokenizeStrategy::Comma);
    info!(
        "Loaded {} LMS records from {} ({} rows skipped)",
        report.records_built, source, report.rows_skipped
    );

    if records.is_empty() {
        return Err(ReportError::EmptyDataset(source.to_string()));
    }
    Ok((records, report))
}

/// Parse StoryLane export text. Never fails; bad rows are skipped.
pub fn parse_engagement_text(text: &str, source: &str) -> (Vec<EngagementRecord>, LoadReport) {
    let table = tokenize_layered(text, MIN_ENGAGEMENT_FIELDS);
    let records = EngagementRecordBuilder::build_table(&table);
    let report = LoadReport::new(source, table.data_rows().len(), records.len(), table.strategy);
    info!(
        "Loaded {} engagement records from {} via {:?} ({} rows skipped)",
        report.records_built, source, table.strategy, report.rows_skipped
    );
    (records, report)
}

// ── File loading ──────────────────────────────────────────────────────────────

/// Load the required LMS export.
pub fn load_lms_file(
    path: &Path,
    builder: &TrainingRecordBuilder,
) -> Result<(Vec<TrainingRecord>, LoadReport)> {
    if !path.is_file() {
        return Err(ReportError::MissingResource(path.to_path_buf()));
    }
    let text = read_text(path)?;
    parse_lms_text(&text, builder, &path.display().to_string())
}

/// Load the optional StoryLane export. A missing file gives no records.
pub fn load_engagement_file(path: &Path) -> Result<(Vec<EngagementRecord>, LoadReport)> {
    let source = path.display().to_string();
    if !path.is_file() {
        warn!("Engagement file not found at {}; continuing without it", source);
        return Ok((Vec::new(), LoadReport::empty(&source)));
    }
    let text = read_text(path)?;
    Ok(parse_engagement_text(&text, &source))
}

/// Read a file as text. Invalid UTF-8 is replaced, and a leading BOM is
/// removed.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LMS_CSV: &str = "\
Course,Enrollment Date (UTC TimeZone),Status,Progress %,Time Spent(minutes),Centre Country
Webinar: Intro,5/7/24 13:25,Completed,100,60,UK
Safeguarding,6/1/24 09:00,In Progress,40,20,Ireland
,6/2/24 09:00,Completed,100,10,UK
";

    const STORYLANE_CSV: &str = "\
Demo,Link,Last View,Total Time,Steps Completed,Percent Complete,Opened CTA,Country
Tour A,https://x,5/7/24 13:25,1m,3,60,-,China
Tour B,https://y,5/8/24 10:00,2m,5,100,https://cta,United Kingdom
bad row
";

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    // ── DataPaths ─────────────────────────────────────────────────────────

    #[test]
    fn test_data_paths_in_dir() {
        let paths = DataPaths::in_dir(Path::new("/data"));
        assert_eq!(paths.lms, PathBuf::from("/data/data for cursor.csv"));
        assert_eq!(paths.engagement, PathBuf::from("/data/Storylane all.csv"));
    }

    // ── LMS ───────────────────────────────────────────────────────────────

    #[test]
    fn test_load_lms_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), LMS_FILE_NAME, LMS_CSV);

        let (records, report) = load_lms_file(&path, &TrainingRecordBuilder::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.records_built, 2);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.strategy, Some(TokenizeStrategy::Comma));
    }

    #[test]
    fn test_load_lms_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = load_lms_file(&dir.path().join(LMS_FILE_NAME), &TrainingRecordBuilder::default());
        assert!(matches!(result, Err(ReportError::MissingResource(_))));
    }

    #[test]
    fn test_load_lms_file_no_valid_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), LMS_FILE_NAME, "Learner,Email\nx,y\n");
        let result = load_lms_file(&path, &TrainingRecordBuilder::default());
        assert!(matches!(result, Err(ReportError::EmptyDataset(_))));
    }

    #[test]
    fn test_load_lms_file_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), LMS_FILE_NAME, "");
        let result = load_lms_file(&path, &TrainingRecordBuilder::default());
        assert!(matches!(result, Err(ReportError::EmptyDataset(_))));
    }

    #[test]
    fn test_load_lms_file_with_bom_and_crlf() {
        let dir = TempDir::new().unwrap();
        let body = format!("\u{feff}{}", LMS_CSV.replace('\n', "\r\n"));
        let path = write(dir.path(), LMS_FILE_NAME, &body);
        let (records, _) = load_lms_file(&path, &TrainingRecordBuilder::default()).unwrap();
        assert_eq!(records[0].course, "Webinar: Intro");
    }

    #[test]
    fn test_load_lms_file_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LMS_FILE_NAME);
        let mut bytes = b"Course,Status\nCaf".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b",Completed\n");
        fs::write(&path, bytes).unwrap();

        let (records, _) = load_lms_file(&path, &TrainingRecordBuilder::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].course.starts_with("Caf"));
    }

    // ── Engagement ────────────────────────────────────────────────────────

    #[test]
    fn test_load_engagement_file() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), ENGAGEMENT_FILE_NAME, STORYLANE_CSV);

        let (records, report) = load_engagement_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.strategy, Some(TokenizeStrategy::Comma));
    }

    #[test]
    fn test_load_engagement_file_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let (records, report) =
            load_engagement_file(&dir.path().join(ENGAGEMENT_FILE_NAME)).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.rows_read, 0);
        assert!(report.strategy.is_none());
    }

    #[test]
    fn test_read_text_missing_is_file_read_error() {
        let dir = TempDir::new().unwrap();
        let result = read_text(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(ReportError::FileRead { .. })));
    }
}
