//! Runtime layer for the training report.
//!
//! Owns the loaded dataset: concurrent ingestion of both exports, the
//! partial-data policy and user-initiated reloads.

pub mod data_manager;

pub use training_core as core;
pub use training_data as data;
