//! Data ingestion and aggregation layer for the training report.
//!
//! Tokenizes LMS and StoryLane CSV exports, reconciles header conventions,
//! builds canonical records, filters them and computes the statistics the
//! dashboard shows.

pub mod aggregator;
pub mod analysis;
pub mod engagement;
pub mod filter;
pub mod lms;
pub mod reader;
pub mod schema;
pub mod storylane;
pub mod tokenizer;
pub mod values;

pub use training_core as core;
