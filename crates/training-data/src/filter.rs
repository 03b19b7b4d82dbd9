//! Multi-dimensional record filtering.
//!
//! Dimensions are ANDed together. Inside the category dimension the selected
//! categories are ORed. An unset dimension does not restrict anything.

use training_core::models::{Category, EngagementRecord, FilterSpec, TrainingRecord};
use training_core::time_utils::{month_key, DateParser};

// ── Filterable ────────────────────────────────────────────────────────────────

/// What the evaluator needs to know about a record.
pub trait Filterable {
    /// Text used for qualification inference.
    fn title(&self) -> &str;

    fn category(&self) -> Category;

    fn country(&self) -> &str;

    fn centre_number(&self) -> &str;

    /// `YYYY-MM` of the record's date, if it has a usable one.
    fn month_key(&self, parser: &DateParser) -> Option<String>;

    /// Whether a record without a usable month passes a bounded time range.
    fn undated_in_range(&self) -> bool {
        false
    }

    /// Fields scanned by free-text search. Empty disables search matching
    /// for this record type.
    fn search_fields(&self) -> Vec<&str>;

    /// Exact course title for the course selectors. `None` for record types
    /// that have no course.
    fn course_title(&self) -> Option<&str> {
        None
    }

    /// Demo name for the demo selector. `None` for record types without one.
    fn demo_name(&self) -> Option<&str> {
        None
    }
}

impl Filterable for TrainingRecord {
    fn title(&self) -> &str {
        &self.course
    }

    fn category(&self) -> Category {
        TrainingRecord::category(self)
    }

    fn country(&self) -> &str {
        &self.centre_country
    }

    fn centre_number(&self) -> &str {
        &self.centre_number
    }

    fn month_key(&self, _parser: &DateParser) -> Option<String> {
        self.enrollment_date.as_ref().map(month_key)
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.course.as_str(),
            self.centre_country.as_str(),
            self.centre_number.as_str(),
        ]
    }

    fn course_title(&self) -> Option<&str> {
        Some(&self.course)
    }
}

impl Filterable for EngagementRecord {
    fn title(&self) -> &str {
        &self.demo
    }

    fn category(&self) -> Category {
        EngagementRecord::category(self)
    }

    fn country(&self) -> &str {
        &self.country
    }

    fn centre_number(&self) -> &str {
        &self.centre_number
    }

    fn month_key(&self, parser: &DateParser) -> Option<String> {
        parser.parse(Some(self.last_view.as_str())).as_ref().map(month_key)
    }

    /// An unreadable `lastView` skips the time filter instead of failing it.
    fn undated_in_range(&self) -> bool {
        true
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.demo.as_str(),
            self.country.as_str(),
            self.centre_number.as_str(),
            self.last_view.as_str(),
        ]
    }

    fn demo_name(&self) -> Option<&str> {
        Some(&self.demo)
    }
}

// ── FilterEvaluator ───────────────────────────────────────────────────────────

/// Applies a [`FilterSpec`] to record collections.
#[derive(Debug, Clone, Default)]
pub struct FilterEvaluator {
    parser: DateParser,
}

impl FilterEvaluator {
    pub fn new(parser: DateParser) -> Self {
        Self { parser }
    }

    /// Records that pass every dimension of `spec`, in input order.
    pub fn apply<T: Filterable + Clone>(&self, records: &[T], spec: &FilterSpec) -> Vec<T> {
        if spec.is_empty() {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|r| self.matches(*r, spec))
            .cloned()
            .collect()
    }

    pub fn matches<T: Filterable>(&self, record: &T, spec: &FilterSpec) -> bool {
        self.in_time_range(record, spec)
            && in_categories(record, spec)
            && spec.country.matches(record.country())
            && spec.qualification.matches(record.title())
            && matches_course(record, spec)
            && matches_centres(record, spec)
            && matches_course_set(record, spec)
            && matches_demo(record, spec)
            && matches_search(record, spec)
    }

    /// Records whose month is unknown pass a bounded range only when their
    /// type says so.
    fn in_time_range<T: Filterable>(&self, record: &T, spec: &FilterSpec) -> bool {
        if spec.start_month.is_none() && spec.end_month.is_none() {
            return true;
        }
        let Some(month) = record.month_key(&self.parser) else {
            return record.undated_in_range();
        };
        let after_start = spec
            .start_month
            .as_deref()
            .map_or(true, |start| month.as_str() >= start);
        let before_end = spec
            .end_month
            .as_deref()
            .map_or(true, |end| month.as_str() <= end);
        after_start && before_end
    }
}

fn in_categories<T: Filterable>(record: &T, spec: &FilterSpec) -> bool {
    spec.categories.is_empty() || spec.categories.contains(&record.category())
}

/// The eLearning course selector leaves webinars and recordings alone.
fn matches_course<T: Filterable>(record: &T, spec: &FilterSpec) -> bool {
    let (Some(selected), Some(title)) = (&spec.course, record.course_title()) else {
        return true;
    };
    match record.category() {
        Category::Webinar | Category::Recording => true,
        _ => title == selected,
    }
}

fn matches_centres<T: Filterable>(record: &T, spec: &FilterSpec) -> bool {
    spec.centres.is_empty()
        || spec
            .centres
            .iter()
            .any(|c| c.trim() == record.centre_number().trim())
}

fn matches_course_set<T: Filterable>(record: &T, spec: &FilterSpec) -> bool {
    match record.course_title() {
        Some(title) if !spec.courses.is_empty() => spec.courses.iter().any(|c| c == title),
        _ => true,
    }
}

fn matches_demo<T: Filterable>(record: &T, spec: &FilterSpec) -> bool {
    match (&spec.demo, record.demo_name()) {
        (Some(selected), Some(demo)) => demo.contains(selected.as_str()),
        _ => true,
    }
}

fn matches_search<T: Filterable>(record: &T, spec: &FilterSpec) -> bool {
    let Some(needle) = spec.search.as_deref() else {
        return true;
    };
    let needle = needle.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
