use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the training report pipeline.
///
/// Row-level problems (short rows, unparseable numbers or dates) never show
/// up here: they are logged and the row is dropped. These variants describe
/// failures that reach the caller.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required input file does not exist.
    #[error("Required data file not found: {0}")]
    MissingResource(PathBuf),

    /// The input was read but produced zero valid records.
    #[error("No valid records found in {0}")]
    EmptyDataset(String),

    /// A report could not be serialised to JSON.
    #[error("Failed to serialise JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// A filter value (month, category, selector) is malformed.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the training report crates.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ReportError::FileRead {
            path: PathBuf::from("/data/lms.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/lms.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_resource() {
        let err = ReportError::MissingResource(PathBuf::from("/data/data for cursor.csv"));
        assert_eq!(
            err.to_string(),
            "Required data file not found: /data/data for cursor.csv"
        );
    }

    #[test]
    fn test_error_display_empty_dataset() {
        let err = ReportError::EmptyDataset("lms.csv".to_string());
        assert_eq!(err.to_string(), "No valid records found in lms.csv");
    }

    #[test]
    fn test_error_display_invalid_filter() {
        let err = ReportError::InvalidFilter("month 2024-13".to_string());
        assert_eq!(err.to_string(), "Invalid filter: month 2024-13");
    }

    #[test]
    fn test_error_display_config() {
        let err = ReportError::Config("bad timezone".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad timezone");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReportError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ReportError = json_err.into();
        assert!(err.to_string().contains("Failed to serialise JSON"));
    }
}
