//! CSV tokenizer with a layered delimiter fallback.
//!
//! [`tokenize`] splits text with one known delimiter and honours quoted
//! fields. [`tokenize_layered`] is used for StoryLane exports whose delimiter
//! is not known up front: it tries comma, tab and semicolon in turn, then a
//! marker-based heuristic, and keeps the first layer that yields usable rows.
//! Layers are never merged. Layered rows are split line by line with quotes
//! taken literally, so a stray `"` only affects its own line.
//!
//! The header row is always returned as row 0; skipping it is the caller's
//! business.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Country names the heuristic layer recognises inside an otherwise
/// unsplittable line.
const COUNTRY_MARKERS: &[&str] = &[
    "United Kingdom",
    "United Arab Emirates",
    "China",
    "Ireland",
];

/// Placeholder for fields the heuristic layer cannot recover.
pub const UNKNOWN_FIELD: &str = "unknown";

// ── Strategy ──────────────────────────────────────────────────────────────────

/// Which layer produced a [`TokenizedTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizeStrategy {
    Comma,
    Tab,
    Semicolon,
    Flexible,
}

impl TokenizeStrategy {
    /// Field separator for this layer. The heuristic layer reports comma,
    /// which is what its synthesised rows are joined with.
    pub fn delimiter(&self) -> u8 {
        match self {
            Self::Comma | Self::Flexible => b',',
            Self::Tab => b'\t',
            Self::Semicolon => b';',
        }
    }
}

/// Rows produced by one tokenizer layer.
#[derive(Debug, Clone)]
pub struct TokenizedTable {
    pub strategy: TokenizeStrategy,
    /// Header first, then data rows. Blank lines are already gone.
    pub rows: Vec<Vec<String>>,
}

impl TokenizedTable {
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn delimiter(&self) -> u8 {
        self.strategy.delimiter()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split `text` into rows of trimmed fields using `delimiter`.
///
/// Quoted fields are honoured. Rows whose fields are all blank are dropped;
/// rows the reader cannot decode are logged and dropped. Nothing else is
/// filtered, so short rows come back as they are.
pub fn tokenize(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let normalized = normalize_line_endings(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(normalized.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                if record.iter().all(str::is_empty) {
                    continue;
                }
                rows.push(record.iter().map(str::to_string).collect());
            }
            Err(e) => {
                debug!("Skipping undecodable row {}: {}", index, e);
            }
        }
    }
    rows
}

/// Split each line of `text` on `delimiter`, with no quote handling.
///
/// Fields are returned untrimmed so that [`fold_trailing_fields`] can rejoin
/// free text exactly; callers trim after folding. Lines that are blank after
/// trimming are dropped.
pub fn tokenize_lines(text: &str, delimiter: u8) -> Vec<Vec<String>> {
    let normalized = normalize_line_endings(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(delimiter)
        .from_reader(normalized.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                if record.iter().all(|f| f.trim().is_empty()) {
                    continue;
                }
                rows.push(record.iter().map(str::to_string).collect());
            }
            Err(e) => {
                debug!("Skipping undecodable line {}: {}", index, e);
            }
        }
    }
    rows
}

/// Tokenize with the comma → tab → semicolon → heuristic fallback chain.
///
/// A delimiter layer is accepted outright when more than half of its data
/// rows reach `min_fields`. When none does, the first delimiter layer with
/// any usable row wins; when all three are empty the heuristic layer runs.
pub fn tokenize_layered(text: &str, min_fields: usize) -> TokenizedTable {
    let layers = [
        TokenizeStrategy::Comma,
        TokenizeStrategy::Tab,
        TokenizeStrategy::Semicolon,
    ];

    let mut first_non_empty: Option<TokenizedTable> = None;

    for strategy in layers {
        let rows = tokenize_lines(text, strategy.delimiter());
        let data_rows = rows.len().saturating_sub(1);
        let valid = rows
            .iter()
            .skip(1)
            .filter(|r| r.len() >= min_fields)
            .count();

        info!(
            "{:?} layer: {} valid rows, {} short rows",
            strategy,
            valid,
            data_rows - valid
        );

        let table = TokenizedTable { strategy, rows };
        if valid * 2 > data_rows {
            return table;
        }
        if valid > 0 && first_non_empty.is_none() {
            first_non_empty = Some(table);
        }
    }

    if let Some(table) = first_non_empty {
        debug!("Accepting {:?} layer without a majority", table.strategy);
        return table;
    }

    let rows = tokenize_flexible(text);
    info!(
        "Flexible layer: {} rows recovered",
        rows.len().saturating_sub(1)
    );
    TokenizedTable {
        strategy: TokenizeStrategy::Flexible,
        rows,
    }
}

/// Fold every field past `min_fields - 1` back into the last kept field,
/// re-joined with `delimiter`.
///
/// Free-text country names can contain the delimiter, so an 8-column row may
/// arrive as 9 or more fields.
pub fn fold_trailing_fields(mut fields: Vec<String>, min_fields: usize, delimiter: u8) -> Vec<String> {
    if min_fields == 0 || fields.len() <= min_fields {
        return fields;
    }
    let tail = fields.split_off(min_fields - 1);
    let sep = char::from(delimiter).to_string();
    fields.push(tail.join(&sep));
    fields
}

// ── Heuristic layer ───────────────────────────────────────────────────────────

fn steps_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*,\s*([\d.]+)").expect("regex is valid"))
}

fn country_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives: Vec<String> = COUNTRY_MARKERS.iter().map(|c| regex::escape(c)).collect();
        Regex::new(&format!("(?i)({})", alternatives.join("|"))).expect("regex is valid")
    })
}

/// Last-resort recovery for StoryLane rows that no delimiter splits cleanly.
///
/// Only runs when the header mentions `demo`, `last view` and `steps`. Each
/// line yields an 8-field row built from the text before the first comma,
/// the first `<int>,<number>` pair (steps and percent) and a known country
/// name; everything else is [`UNKNOWN_FIELD`].
fn tokenize_flexible(text: &str) -> Vec<Vec<String>> {
    if !text.contains(',') && !text.contains('\t') && !text.contains(';') {
        warn!("Content does not look delimited; nothing to recover");
        return Vec::new();
    }

    let normalized = normalize_line_endings(text);
    let mut lines = normalized.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };

    let header = header_line.to_lowercase();
    let has_demo = header.contains("demo");
    let has_last_view = header.contains("last view") || header.contains("lastview");
    let has_steps = header.contains("steps");
    debug!(has_demo, has_last_view, has_steps, "Flexible layer header detection");
    if !(has_demo && has_last_view && has_steps) {
        return Vec::new();
    }

    let mut rows = vec![header_line.split(',').map(|h| h.trim().to_string()).collect()];

    for line in lines {
        let line = line.trim();
        if line.len() < 10 {
            continue;
        }
        let Some(demo_end) = line.find(',') else {
            continue;
        };
        let demo = line[..demo_end].trim();
        if demo.is_empty() {
            continue;
        }
        let (Some(steps), Some(country)) = (steps_re().captures(line), country_re().find(line))
        else {
            continue;
        };

        rows.push(vec![
            demo.to_string(),
            UNKNOWN_FIELD.to_string(),
            UNKNOWN_FIELD.to_string(),
            UNKNOWN_FIELD.to_string(),
            steps[1].to_string(),
            steps[2].to_string(),
            UNKNOWN_FIELD.to_string(),
            country.as_str().to_string(),
        ]);
    }
    rows
}

// ── Tests ─────────────────────────────────────────────────────────────────────
