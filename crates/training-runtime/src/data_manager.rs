//! Dataset manager for the report runtime.
//!
//! Loads the LMS and StoryLane exports concurrently and joins them into one
//! [`Dataset`]. The two pipelines are independent: a failed LMS load is kept
//! as an error state next to whatever engagement data did load, and a missing
//! or unreadable StoryLane export just means no engagement records. Nothing
//! is retried automatically; callers invoke [`DataManager::reload`].

use std::time::{Duration, Instant};

use training_core::error::{ReportError, Result};
use training_core::models::{EngagementRecord, TrainingRecord};
use training_data::analysis::Dataset;
use training_data::lms::TrainingRecordBuilder;
use training_data::reader::{load_engagement_file, load_lms_file, DataPaths, LoadReport};

// ── DataManager ───────────────────────────────────────────────────────────────

/// Owns the current dataset and the outcome of the last ingestion pass.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use training_data::lms::TrainingRecordBuilder;
/// use training_data::reader::DataPaths;
/// use training_runtime::data_manager::DataManager;
///
/// # async fn run() {
/// let mut mgr = DataManager::new(DataPaths::in_dir(Path::new(".")), TrainingRecordBuilder::default());
/// let dataset = mgr.load().await;
/// println!("{} training records", dataset.training.len());
/// # }
/// ```
pub struct DataManager {
    paths: DataPaths,
    builder: TrainingRecordBuilder,
    /// Replaced wholesale on every load.
    dataset: Dataset,
    lms_report: Option<LoadReport>,
    engagement_report: Option<LoadReport>,
    /// Human-readable description of the last LMS failure.
    last_error: Option<String>,
    loaded_at: Option<Instant>,
}

impl DataManager {
    pub fn new(paths: DataPaths, builder: TrainingRecordBuilder) -> Self {
        Self {
            paths,
            builder,
            dataset: Dataset::default(),
            lms_report: None,
            engagement_report: None,
            last_error: None,
            loaded_at: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run one ingestion pass over both files and replace the dataset.
    pub async fn load(&mut self) -> &Dataset {
        let lms_path = self.paths.lms.clone();
        let engagement_path = self.paths.engagement.clone();
        let builder = self.builder.clone();

        let (lms, engagement) = tokio::join!(
            tokio::task::spawn_blocking(move || load_lms_file(&lms_path, &builder)),
            tokio::task::spawn_blocking(move || load_engagement_file(&engagement_path)),
        );

        let (training, lms_report) = match flatten(lms) {
            Ok((records, report)) => {
                self.last_error = None;
                (records, Some(report))
            }
            Err(e) => {
                tracing::error!(error = %e, "LMS data could not be loaded");
                self.last_error = Some(e.to_string());
                (Vec::<TrainingRecord>::new(), None)
            }
        };

        let (engagement, engagement_report) = match flatten(engagement) {
            Ok((records, report)) => (records, Some(report)),
            Err(e) => {
                tracing::warn!(error = %e, "engagement data unavailable; continuing without it");
                (Vec::<EngagementRecord>::new(), None)
            }
        };

        tracing::debug!(
            training = training.len(),
            engagement = engagement.len(),
            "dataset replaced"
        );

        self.dataset = Dataset {
            training,
            engagement,
        };
        self.lms_report = lms_report;
        self.engagement_report = engagement_report;
        self.loaded_at = Some(Instant::now());
        &self.dataset
    }

    /// User-initiated retry after a failed load. Same as [`DataManager::load`].
    pub async fn reload(&mut self) -> &Dataset {
        tracing::info!("reloading data files");
        self.load().await
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Description of the last LMS failure, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn lms_report(&self) -> Option<&LoadReport> {
        self.lms_report.as_ref()
    }

    pub fn engagement_report(&self) -> Option<&LoadReport> {
        self.engagement_report.as_ref()
    }

    /// Time since the last load, or `None` before the first one.
    pub fn data_age(&self) -> Option<Duration> {
        self.loaded_at.map(|t| t.elapsed())
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }
}

/// Fold a panicked or cancelled loader task into the loader's own error type.
fn flatten<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    joined.map_err(|e| ReportError::Other(anyhow::anyhow!("loader task failed: {}", e)))?
}

// ── Tests ─────────────────────────────────────────────────────────────────────
