//! Build [`EngagementRecord`]s from StoryLane demo-view exports.
//!
//! StoryLane columns are positional:
//!
//! | index | field            |
//! |-------|------------------|
//! | 0     | demo             |
//! | 1     | link             |
//! | 2     | last view        |
//! | 3     | total time       |
//! | 4     | steps completed  |
//! | 5     | percent complete |
//! | 6     | opened CTA       |
//! | 7+    | country          |
//!
//! Some exports append a centre-number column; it is only read when the
//! header names it.

use training_core::models::{cta_clicked, EngagementRecord};
use tracing::{debug, info};

use crate::tokenizer::{fold_trailing_fields, tokenize_layered, TokenizedTable};
use crate::values::{parse_leading_float, parse_leading_int};

/// Rows with fewer fields than this are dropped.
pub const MIN_ENGAGEMENT_FIELDS: usize = 8;

/// Builds engagement records from raw export text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementRecordBuilder;

impl EngagementRecordBuilder {
    /// Tokenize `text` with the layered fallback and build records.
    pub fn build(text: &str) -> Vec<EngagementRecord> {
        Self::build_table(&tokenize_layered(text, MIN_ENGAGEMENT_FIELDS))
    }

    /// Build records from an already tokenized table. Row 0 is the header.
    pub fn build_table(table: &TokenizedTable) -> Vec<EngagementRecord> {
        let has_centre_column = table.header().is_some_and(|h| {
            h.len() > MIN_ENGAGEMENT_FIELDS
                && h.last()
                    .is_some_and(|c| c.to_lowercase().contains("centre"))
        });

        let mut records = Vec::new();
        let mut percent_cells: Vec<String> = Vec::new();

        for (index, row) in table.data_rows().iter().enumerate() {
            if row.len() < MIN_ENGAGEMENT_FIELDS {
                debug!(
                    "Skipping engagement row {}: {} fields, need {}",
                    index + 1,
                    row.len(),
                    MIN_ENGAGEMENT_FIELDS
                );
                continue;
            }

            let mut fields = row.clone();
            let centre_number = if has_centre_column && fields.len() > MIN_ENGAGEMENT_FIELDS {
                fields.pop().unwrap_or_default().trim().to_string()
            } else {
                String::new()
            };
            let fields: Vec<String> =
                fold_trailing_fields(fields, MIN_ENGAGEMENT_FIELDS, table.delimiter())
                    .into_iter()
                    .map(|f| f.trim().to_string())
                    .collect();

            percent_cells.push(fields[5].clone());
            records.push(EngagementRecord {
                demo: fields[0].clone(),
                link: fields[1].clone(),
                last_view: fields[2].clone(),
                total_time: fields[3].clone(),
                steps_completed: parse_leading_int(Some(fields[4].as_str())).unwrap_or(0),
                percent_complete: parse_leading_float(Some(fields[5].as_str())).unwrap_or(0.0),
                cta_clicked: cta_clicked(&fields[6]),
                opened_cta: fields[6].clone(),
                country: fields[7].clone(),
                centre_number,
            });
        }

        let percent_cells: Vec<&str> = percent_cells.iter().map(String::as_str).collect();
        if percent_is_fractional(&percent_cells) {
            info!("Percent complete column holds fractions; scaling to 0-100");
            for record in &mut records {
                record.percent_complete *= 100.0;
            }
        }

        records
    }
}

/// `true` when a percent column looks like 0–1 fractions: no cell carries a
/// `%`, every parsed value is at most 1 and at least one is above 0.
fn percent_is_fractional(cells: &[&str]) -> bool {
    if cells.iter().any(|c| c.contains('%')) {
        return false;
    }
    let values: Vec<f64> = cells
        .iter()
        .filter_map(|c| parse_leading_float(Some(*c)))
        .collect();
    values.iter().all(|v| *v <= 1.0) && values.iter().any(|v| *v > 0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
