use std::path::{Path, PathBuf};

use training_core::settings::Settings;
use training_data::reader::{DataPaths, LMS_FILE_NAME};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised. Output goes
/// to stderr so reports on stdout stay clean.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let upper = log_level.to_uppercase();
    let normalised = match upper.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(normalised).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Locate the directory holding the exports.
///
/// An explicit `--data-dir` always wins. Otherwise the first of these that
/// contains the LMS export is used:
/// 1. the current directory
/// 2. `~/.training-report/data/`
///
/// Returns `None` when neither does.
pub fn discover_data_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }

    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".training-report").join("data"));
    }
    candidates
        .into_iter()
        .find(|dir| dir.join(LMS_FILE_NAME).is_file())
}

/// Final file locations: the discovered directory with any per-file
/// overrides from the command line applied.
pub fn resolve_data_paths(settings: &Settings) -> DataPaths {
    let dir = discover_data_dir(settings.data_dir.as_deref()).unwrap_or_else(|| {
        tracing::debug!("No data directory found; using the current directory");
        PathBuf::from(".")
    });

    let mut paths = DataPaths::in_dir(&dir);
    if let Some(lms) = &settings.lms_file {
        paths.lms = lms.clone();
    }
    if let Some(engagement) = &settings.engagement_file {
        paths.engagement = engagement.clone();
    }
    paths
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;
    use training_data::reader::ENGAGEMENT_FILE_NAME;

    fn with_home<T>(home: &Path, f: impl FnOnce() -> T) -> T {
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", home);

        let result = f();

        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }
        result
    }

    // ── discover_data_dir ─────────────────────────────────────────────────────

    #[test]
    fn test_discover_explicit_dir_wins() {
        let tmp = TempDir::new().expect("tempdir");
        assert_eq!(
            discover_data_dir(Some(tmp.path())),
            Some(tmp.path().to_path_buf())
        );
    }

    #[test]
    fn test_discover_home_data_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let data = tmp.path().join(".training-report").join("data");
        std::fs::create_dir_all(&data).expect("create data dir");
        std::fs::write(data.join(LMS_FILE_NAME), "Course\nMaths\n").expect("write lms");

        let found = with_home(tmp.path(), || discover_data_dir(None));
        assert_eq!(found, Some(data));
    }

    #[test]
    fn test_discover_returns_none_when_absent() {
        let tmp = TempDir::new().expect("tempdir");
        let found = with_home(tmp.path(), || discover_data_dir(None));
        assert!(found.is_none(), "should return None when no export exists");
    }

    // ── resolve_data_paths ────────────────────────────────────────────────────

    #[test]
    fn test_resolve_data_paths_from_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let dir = tmp.path().to_str().unwrap().to_string();
        let settings = Settings::parse_from(["training-report", "--data-dir", dir.as_str()]);

        let paths = resolve_data_paths(&settings);
        assert_eq!(paths.lms, tmp.path().join(LMS_FILE_NAME));
        assert_eq!(paths.engagement, tmp.path().join(ENGAGEMENT_FILE_NAME));
    }

    #[test]
    fn test_resolve_data_paths_overrides() {
        let tmp = TempDir::new().expect("tempdir");
        let dir = tmp.path().to_str().unwrap().to_string();
        let settings = Settings::parse_from([
            "training-report",
            "--data-dir",
            dir.as_str(),
            "--lms-file",
            "/exports/lms.csv",
            "--engagement-file",
            "/exports/views.tsv",
        ]);

        let paths = resolve_data_paths(&settings);
        assert_eq!(paths.lms, PathBuf::from("/exports/lms.csv"));
        assert_eq!(paths.engagement, PathBuf::from("/exports/views.tsv"));
    }
}
