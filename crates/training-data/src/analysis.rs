//! Dashboard pipeline.
//!
//! Applies a [`FilterSpec`] to both collections and assembles every
//! aggregate the presentation layer shows into one [`DashboardReport`].

use chrono::Utc;
use serde::Serialize;
use training_core::error::Result;
use training_core::models::{Category, EngagementRecord, FilterSpec, TrainingRecord};
use tracing::debug;

use crate::aggregator::{
    CategoryDetail, CompletionRates, EngagementMetrics, GeographicDistribution, MonthOption,
    MonthlyStats, TrainingAggregator, WebinarEnrollmentStats,
};
use crate::engagement::{CountryCount, DemoStats, EngagementAggregator, TOP_COUNTRIES};
use crate::filter::FilterEvaluator;

// ── Public types ──────────────────────────────────────────────────────────────

/// Both canonical collections, unfiltered.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub training: Vec<TrainingRecord>,
    /// Empty when no StoryLane export was available.
    pub engagement: Vec<EngagementRecord>,
}

/// Metadata produced alongside the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    /// RFC 3339 timestamp when this report was generated.
    pub generated_at: String,
    pub total_training_records: usize,
    pub filtered_training_records: usize,
    pub total_engagement_records: usize,
    pub filtered_engagement_records: usize,
    /// Wall-clock seconds spent filtering and aggregating.
    pub compute_time_seconds: f64,
}

/// Values a user can pick from, derived from the unfiltered data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOptions {
    pub months: Vec<MonthOption>,
    pub categories: Vec<Category>,
    pub elearning_courses: Vec<String>,
    pub demos: Vec<String>,
}

/// Drill-down shown when exactly one category is selected.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryFocus {
    pub category: Category,
    #[serde(flatten)]
    pub detail: CategoryDetail,
}

/// Everything the dashboard renders for one filter state.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: DashboardMetadata,
    pub filter: FilterSpec,
    pub options: FilterOptions,
    pub completion_rates: CompletionRates,
    pub geography: GeographicDistribution,
    pub engagement: EngagementMetrics,
    /// `None` when the filtered data covers fewer than two months.
    pub monthly_breakdown: Option<Vec<MonthlyStats>>,
    /// Computed over all webinar records, ignoring the filter.
    pub webinar_stats: WebinarEnrollmentStats,
    pub category_detail: Option<CategoryFocus>,
    pub demo_stats: Vec<DemoStats>,
    pub top_countries: Vec<CountryCount>,
}

impl DashboardReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Filter both collections with `spec` and compute the dashboard.
pub fn build_dashboard(
    dataset: &Dataset,
    spec: &FilterSpec,
    evaluator: &FilterEvaluator,
) -> DashboardReport {
    let start = std::time::Instant::now();

    let training = evaluator.apply(&dataset.training, spec);
    let engagement = evaluator.apply(&dataset.engagement, spec);
    debug!(
        "Filter kept {}/{} training and {}/{} engagement records",
        training.len(),
        dataset.training.len(),
        engagement.len(),
        dataset.engagement.len()
    );

    let options = FilterOptions {
        months: TrainingAggregator::available_months(&dataset.training),
        categories: TrainingAggregator::available_categories(&dataset.training),
        elearning_courses: TrainingAggregator::elearning_courses(&dataset.training),
        demos: EngagementAggregator::demo_names(&dataset.engagement),
    };

    let category_detail = match spec.categories.as_slice() {
        [category] => Some(CategoryFocus {
            category: *category,
            detail: TrainingAggregator::category_detail(&training),
        }),
        _ => None,
    };

    let completion_rates = TrainingAggregator::completion_rates(&training);
    let geography = TrainingAggregator::geographic_distribution(&training);
    let engagement_metrics = TrainingAggregator::engagement_metrics(&training);
    let monthly_breakdown = TrainingAggregator::monthly_breakdown(&training);
    let webinar_stats = TrainingAggregator::webinar_enrollment_stats(&dataset.training);
    let demo_stats = EngagementAggregator::all_demo_stats(&engagement);
    let top_countries = EngagementAggregator::top_countries(&engagement, TOP_COUNTRIES);

    let metadata = DashboardMetadata {
        generated_at: Utc::now().to_rfc3339(),
        total_training_records: dataset.training.len(),
        filtered_training_records: training.len(),
        total_engagement_records: dataset.engagement.len(),
        filtered_engagement_records: engagement.len(),
        compute_time_seconds: start.elapsed().as_secs_f64(),
    };

    DashboardReport {
        metadata,
        filter: spec.clone(),
        options,
        completion_rates,
        geography,
        engagement: engagement_metrics,
        monthly_breakdown,
        webinar_stats,
        category_detail,
        demo_stats,
        top_countries,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
