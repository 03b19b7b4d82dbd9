//! Core types for the training report pipeline.
//!
//! Holds the canonical record model, the shared category / qualification /
//! geography inference rules, the date parser, CLI settings and the error
//! type used by every other crate in the workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
