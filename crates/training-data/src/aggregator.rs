//! Aggregate statistics over LMS training records.
//!
//! Every function takes a slice and returns a fresh value; inputs are never
//! mutated. Callers filter first (see [`crate::filter`]).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use training_core::formatting::percentage;
use training_core::models::{is_uk_country, Category, EnrollmentStatus, TrainingRecord};
use training_core::time_utils::{month_display_name, month_key};

/// Number of courses listed in a [`CategoryDetail`].
pub const TOP_COURSES: usize = 5;

// ── Result types ──────────────────────────────────────────────────────────────

/// Completion rate per delivery category, each 0–100.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionRates {
    pub live_webinar: f64,
    pub recording: f64,
    pub e_learning: f64,
}

/// UK vs everything else, as counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeographicDistribution {
    pub uk: usize,
    pub international: usize,
}

/// Mean time spent (minutes) and mean progress (0–100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngagementMetrics {
    pub time_spent: f64,
    pub progress_percentage: f64,
}

/// Activity within one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyStats {
    /// `YYYY-MM`.
    pub month: String,
    /// e.g. `"May 2024"`.
    pub display_name: String,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    /// Mean progress percentage, accumulated incrementally.
    pub avg_engagement: f64,
}

impl MonthlyStats {
    fn add(&mut self, record: &TrainingRecord) {
        self.total += 1;
        match record.status {
            EnrollmentStatus::Completed => self.completed += 1,
            EnrollmentStatus::InProgress => self.in_progress += 1,
            EnrollmentStatus::NotStarted => self.not_started += 1,
            EnrollmentStatus::Unenrolled => {}
        }
        self.avg_engagement +=
            (record.progress_percentage - self.avg_engagement) / self.total as f64;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseCount {
    pub course: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebinarEnrollmentStats {
    pub total_webinar_enrollments: usize,
    /// Sorted by count, highest first.
    pub webinar_details: Vec<CourseCount>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub unenrolled: usize,
}

impl StatusCounts {
    pub fn get(&self, status: EnrollmentStatus) -> usize {
        match status {
            EnrollmentStatus::Completed => self.completed,
            EnrollmentStatus::InProgress => self.in_progress,
            EnrollmentStatus::NotStarted => self.not_started,
            EnrollmentStatus::Unenrolled => self.unenrolled,
        }
    }
}

/// Drill-down for a set of records, normally one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDetail {
    pub total: usize,
    pub status_counts: StatusCounts,
    pub avg_time_spent: f64,
    pub avg_progress: f64,
    /// Mean over records that have a score; 0 when none do.
    pub avg_quiz_score: f64,
    pub top_courses: Vec<CourseCount>,
}

/// A month the user can pick in a time-range filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    pub value: String,
    pub label: String,
}

// ── TrainingAggregator ────────────────────────────────────────────────────────

/// Stateless helper computing dashboard statistics over training records.
pub struct TrainingAggregator;

impl TrainingAggregator {
    /// Webinars count every enrollment as a success; recordings and
    /// eLearning need `Completed`.
    pub fn completion_rates(records: &[TrainingRecord]) -> CompletionRates {
        let mut totals: HashMap<Category, (usize, usize)> = HashMap::new();
        for record in records {
            let category = record.category();
            let success = match category {
                Category::Webinar => true,
                _ => record.status == EnrollmentStatus::Completed,
            };
            let entry = totals.entry(category).or_default();
            entry.0 += 1;
            if success {
                entry.1 += 1;
            }
        }

        let rate = |category: Category| {
            totals
                .get(&category)
                .map_or(0.0, |(total, success)| percentage(*success, *total))
        };

        CompletionRates {
            live_webinar: rate(Category::Webinar),
            recording: rate(Category::Recording),
            e_learning: rate(Category::ELearning),
        }
    }

    pub fn geographic_distribution(records: &[TrainingRecord]) -> GeographicDistribution {
        let uk = records
            .iter()
            .filter(|r| is_uk_country(&r.centre_country))
            .count();
        GeographicDistribution {
            uk,
            international: records.len() - uk,
        }
    }

    pub fn engagement_metrics(records: &[TrainingRecord]) -> EngagementMetrics {
        if records.is_empty() {
            return EngagementMetrics::default();
        }
        let n = records.len() as f64;
        let time: i64 = records.iter().map(|r| r.time_spent_minutes).sum();
        let progress: f64 = records.iter().map(|r| r.progress_percentage).sum();
        EngagementMetrics {
            time_spent: time as f64 / n,
            progress_percentage: progress / n,
        }
    }

    /// Per-month activity, ascending by month.
    ///
    /// Records without an enrollment date are left out. Returns `None` when
    /// fewer than two distinct months remain.
    pub fn monthly_breakdown(records: &[TrainingRecord]) -> Option<Vec<MonthlyStats>> {
        let mut map: BTreeMap<String, MonthlyStats> = BTreeMap::new();

        for record in records {
            let Some(date) = record.enrollment_date.as_ref() else {
                continue;
            };
            let key = month_key(date);
            map.entry(key.clone())
                .or_insert_with(|| MonthlyStats {
                    month: key,
                    display_name: month_display_name(date),
                    ..Default::default()
                })
                .add(record);
        }

        if map.len() <= 1 {
            return None;
        }
        Some(map.into_values().collect())
    }

    pub fn webinar_enrollment_stats(records: &[TrainingRecord]) -> WebinarEnrollmentStats {
        let webinar_details = count_by_course(
            records
                .iter()
                .filter(|r| r.category() == Category::Webinar)
                .map(|r| r.course.as_str()),
        );
        WebinarEnrollmentStats {
            total_webinar_enrollments: webinar_details.iter().map(|c| c.count).sum(),
            webinar_details,
        }
    }

    /// Enrollments in the webinar titled exactly `title`.
    pub fn count_webinar_enrollments(records: &[TrainingRecord], title: &str) -> usize {
        records
            .iter()
            .filter(|r| r.category() == Category::Webinar && r.course == title)
            .count()
    }

    /// Enrollment count per course, highest first.
    pub fn course_breakdown(records: &[TrainingRecord]) -> Vec<CourseCount> {
        count_by_course(records.iter().map(|r| r.course.as_str()))
    }

    pub fn category_detail(records: &[TrainingRecord]) -> CategoryDetail {
        if records.is_empty() {
            return CategoryDetail::default();
        }

        let mut status_counts = StatusCounts::default();
        for record in records {
            match record.status {
                EnrollmentStatus::Completed => status_counts.completed += 1,
                EnrollmentStatus::InProgress => status_counts.in_progress += 1,
                EnrollmentStatus::NotStarted => status_counts.not_started += 1,
                EnrollmentStatus::Unenrolled => status_counts.unenrolled += 1,
            }
        }

        let scores: Vec<f64> = records.iter().filter_map(|r| r.quiz_score).collect();
        let avg_quiz_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let metrics = Self::engagement_metrics(records);
        let mut top_courses = Self::course_breakdown(records);
        top_courses.truncate(TOP_COURSES);

        CategoryDetail {
            total: records.len(),
            status_counts,
            avg_time_spent: metrics.time_spent,
            avg_progress: metrics.progress_percentage,
            avg_quiz_score,
            top_courses,
        }
    }

    // ── Filter options ────────────────────────────────────────────────────

    /// Distinct enrollment months, ascending.
    pub fn available_months(records: &[TrainingRecord]) -> Vec<MonthOption> {
        let months: BTreeMap<String, String> = records
            .iter()
            .filter_map(|r| r.enrollment_date.as_ref())
            .map(|d| (month_key(d), month_display_name(d)))
            .collect();
        months
            .into_iter()
            .map(|(value, label)| MonthOption { value, label })
            .collect()
    }

    pub fn available_categories(records: &[TrainingRecord]) -> Vec<Category> {
        let set: BTreeSet<Category> = records.iter().map(|r| r.category()).collect();
        set.into_iter().collect()
    }

    /// Distinct eLearning course titles, sorted.
    pub fn elearning_courses(records: &[TrainingRecord]) -> Vec<String> {
        let set: BTreeSet<&str> = records
            .iter()
            .filter(|r| r.category() == Category::ELearning)
            .map(|r| r.course.as_str())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

/// Count titles, then sort by count descending. Ties keep first-seen order.
fn count_by_course<'a>(titles: impl Iterator<Item = &'a str>) -> Vec<CourseCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CourseCount> = Vec::new();
    for title in titles {
        let i = *index.entry(title).or_insert_with(|| {
            counts.push(CourseCount {
                course: title.to_string(),
                count: 0,
            });
            counts.len() - 1
        });
        counts[i].count += 1;
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(course: &str, status: EnrollmentStatus, date: Option<&str>) -> TrainingRecord {
        TrainingRecord {
            course: course.to_string(),
            enrollment_date: date.map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap()
            }),
            started_date: None,
            completion_date: None,
            status,
            progress_percentage: 0.0,
            time_spent_minutes: 0,
            quiz_score: None,
            centre_number: String::new(),
            centre_country: String::new(),
        }
    }

    fn with_progress(mut r: TrainingRecord, progress: f64, minutes: i64) -> TrainingRecord {
        r.progress_percentage = progress;
        r.time_spent_minutes = minutes;
        r
    }

    fn with_country(mut r: TrainingRecord, country: &str) -> TrainingRecord {
        r.centre_country = country.to_string();
        r
    }

    // ── completion_rates ──────────────────────────────────────────────────

    #[test]
    fn test_webinar_rate_ignores_status() {
        let records = vec![
            record("Webinar A", EnrollmentStatus::NotStarted, None),
            record("Webinar B", EnrollmentStatus::Unenrolled, None),
            record("webinar c", EnrollmentStatus::InProgress, None),
        ];
        let rates = TrainingAggregator::completion_rates(&records);
        assert_eq!(rates.live_webinar, 100.0);
        assert_eq!(rates.recording, 0.0);
        assert_eq!(rates.e_learning, 0.0);
    }

    #[test]
    fn test_completion_rates_need_completed() {
        let records = vec![
            record("Recording 1", EnrollmentStatus::Completed, None),
            record("Recording 2", EnrollmentStatus::InProgress, None),
            record("Maths", EnrollmentStatus::Completed, None),
            record("English", EnrollmentStatus::NotStarted, None),
            record("Science", EnrollmentStatus::NotStarted, None),
            record("History", EnrollmentStatus::NotStarted, None),
        ];
        let rates = TrainingAggregator::completion_rates(&records);
        assert_eq!(rates.recording, 50.0);
        assert_eq!(rates.e_learning, 25.0);
    }

    #[test]
    fn test_completion_rates_empty() {
        assert_eq!(
            TrainingAggregator::completion_rates(&[]),
            CompletionRates::default()
        );
    }

    // ── geographic_distribution ───────────────────────────────────────────

    #[test]
    fn test_geographic_distribution() {
        let records = vec![
            with_country(record("A", EnrollmentStatus::NotStarted, None), "UK"),
            with_country(record("A", EnrollmentStatus::NotStarted, None), "united kingdom"),
            with_country(record("A", EnrollmentStatus::NotStarted, None), "Ireland"),
            with_country(record("A", EnrollmentStatus::NotStarted, None), ""),
        ];
        let geo = TrainingAggregator::geographic_distribution(&records);
        assert_eq!(geo, GeographicDistribution { uk: 2, international: 2 });
    }

    // ── engagement_metrics ────────────────────────────────────────────────

    #[test]
    fn test_engagement_metrics_means() {
        let records = vec![
            with_progress(record("A", EnrollmentStatus::NotStarted, None), 20.0, 10),
            with_progress(record("B", EnrollmentStatus::NotStarted, None), 80.0, 30),
        ];
        let m = TrainingAggregator::engagement_metrics(&records);
        assert_eq!(m.time_spent, 20.0);
        assert_eq!(m.progress_percentage, 50.0);
    }

    #[test]
    fn test_engagement_metrics_empty_is_zero() {
        let m = TrainingAggregator::engagement_metrics(&[]);
        assert_eq!(m, EngagementMetrics::default());
        assert!(!m.time_spent.is_nan());
    }

    // ── monthly_breakdown ─────────────────────────────────────────────────

    #[test]
    fn test_monthly_breakdown_single_month_is_none() {
        let records = vec![
            record("A", EnrollmentStatus::Completed, Some("2024-05-01")),
            record("B", EnrollmentStatus::Completed, Some("2024-05-30")),
        ];
        assert!(TrainingAggregator::monthly_breakdown(&records).is_none());
        assert!(TrainingAggregator::monthly_breakdown(&[]).is_none());
    }

    #[test]
    fn test_monthly_breakdown_sorted_with_counts() {
        let records = vec![
            with_progress(record("A", EnrollmentStatus::Completed, Some("2024-06-02")), 100.0, 0),
            with_progress(record("B", EnrollmentStatus::InProgress, Some("2024-05-10")), 40.0, 0),
            with_progress(record("C", EnrollmentStatus::NotStarted, Some("2024-05-11")), 0.0, 0),
            with_progress(record("D", EnrollmentStatus::Completed, Some("2024-05-12")), 50.0, 0),
            record("E", EnrollmentStatus::Completed, None),
        ];
        let months = TrainingAggregator::monthly_breakdown(&records).unwrap();

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-05");
        assert_eq!(months[0].display_name, "May 2024");
        assert_eq!(months[0].total, 3);
        assert_eq!(months[0].completed, 1);
        assert_eq!(months[0].in_progress, 1);
        assert_eq!(months[0].not_started, 1);
        assert!((months[0].avg_engagement - 30.0).abs() < 1e-9);
        assert_eq!(months[1].month, "2024-06");
        assert_eq!(months[1].avg_engagement, 100.0);
    }

    #[test]
    fn test_monthly_breakdown_undated_only_months_counted() {
        let records = vec![
            record("A", EnrollmentStatus::Completed, Some("2024-05-01")),
            record("B", EnrollmentStatus::Completed, None),
        ];
        assert!(TrainingAggregator::monthly_breakdown(&records).is_none());
    }

    // ── webinar stats ─────────────────────────────────────────────────────

    #[test]
    fn test_webinar_enrollment_stats() {
        let mut records = Vec::new();
        for _ in 0..2 {
            records.push(record("Webinar: C", EnrollmentStatus::NotStarted, None));
        }
        for _ in 0..5 {
            records.push(record("Webinar: A", EnrollmentStatus::NotStarted, None));
        }
        for _ in 0..3 {
            records.push(record("Webinar: B", EnrollmentStatus::NotStarted, None));
        }
        records.push(record("Recording: A", EnrollmentStatus::Completed, None));

        let stats = TrainingAggregator::webinar_enrollment_stats(&records);
        assert_eq!(stats.total_webinar_enrollments, 10);
        let details: Vec<(&str, usize)> = stats
            .webinar_details
            .iter()
            .map(|c| (c.course.as_str(), c.count))
            .collect();
        assert_eq!(
            details,
            vec![("Webinar: A", 5), ("Webinar: B", 3), ("Webinar: C", 2)]
        );
    }

    #[test]
    fn test_count_webinar_enrollments() {
        let records = vec![
            record("Webinar: A", EnrollmentStatus::NotStarted, None),
            record("Webinar: A", EnrollmentStatus::NotStarted, None),
            record("Webinar: AB", EnrollmentStatus::NotStarted, None),
        ];
        assert_eq!(TrainingAggregator::count_webinar_enrollments(&records, "Webinar: A"), 2);
        assert_eq!(TrainingAggregator::count_webinar_enrollments(&records, "Maths"), 0);
    }

    #[test]
    fn test_course_breakdown_ties_keep_first_seen() {
        let records = vec![
            record("B", EnrollmentStatus::NotStarted, None),
            record("A", EnrollmentStatus::NotStarted, None),
            record("C", EnrollmentStatus::NotStarted, None),
            record("C", EnrollmentStatus::NotStarted, None),
        ];
        let breakdown = TrainingAggregator::course_breakdown(&records);
        let names: Vec<&str> = breakdown.iter().map(|c| c.course.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    // ── category_detail ───────────────────────────────────────────────────

    #[test]
    fn test_category_detail() {
        let mut records = vec![
            with_progress(record("Maths", EnrollmentStatus::Completed, None), 100.0, 60),
            with_progress(record("Maths", EnrollmentStatus::InProgress, None), 50.0, 30),
            with_progress(record("English", EnrollmentStatus::Unenrolled, None), 0.0, 0),
        ];
        records[0].quiz_score = Some(80.0);
        records[1].quiz_score = Some(60.0);

        let detail = TrainingAggregator::category_detail(&records);
        assert_eq!(detail.total, 3);
        assert_eq!(detail.status_counts.get(EnrollmentStatus::Completed), 1);
        assert_eq!(detail.status_counts.get(EnrollmentStatus::InProgress), 1);
        assert_eq!(detail.status_counts.get(EnrollmentStatus::Unenrolled), 1);
        assert_eq!(detail.status_counts.get(EnrollmentStatus::NotStarted), 0);
        assert_eq!(detail.avg_time_spent, 30.0);
        assert_eq!(detail.avg_progress, 50.0);
        assert_eq!(detail.avg_quiz_score, 70.0);
        assert_eq!(detail.top_courses[0].course, "Maths");
        assert_eq!(detail.top_courses[0].count, 2);
    }

    #[test]
    fn test_category_detail_top_five() {
        let records: Vec<TrainingRecord> = (0..8)
            .map(|i| record(&format!("Course {}", i), EnrollmentStatus::NotStarted, None))
            .collect();
        let detail = TrainingAggregator::category_detail(&records);
        assert_eq!(detail.top_courses.len(), TOP_COURSES);
        assert_eq!(detail.avg_quiz_score, 0.0);
    }

    // ── Filter options ────────────────────────────────────────────────────

    #[test]
    fn test_available_months() {
        let records = vec![
            record("A", EnrollmentStatus::NotStarted, Some("2024-06-01")),
            record("A", EnrollmentStatus::NotStarted, Some("2023-12-01")),
            record("A", EnrollmentStatus::NotStarted, Some("2024-06-20")),
            record("A", EnrollmentStatus::NotStarted, None),
        ];
        let months = TrainingAggregator::available_months(&records);
        assert_eq!(
            months,
            vec![
                MonthOption {
                    value: "2023-12".to_string(),
                    label: "December 2023".to_string()
                },
                MonthOption {
                    value: "2024-06".to_string(),
                    label: "June 2024".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_available_categories_and_elearning_courses() {
        let records = vec![
            record("Webinar: A", EnrollmentStatus::NotStarted, None),
            record("Safeguarding", EnrollmentStatus::NotStarted, None),
            record("Assessment", EnrollmentStatus::NotStarted, None),
            record("Safeguarding", EnrollmentStatus::NotStarted, None),
        ];
        assert_eq!(
            TrainingAggregator::available_categories(&records),
            vec![Category::Webinar, Category::ELearning]
        );
        assert_eq!(
            TrainingAggregator::elearning_courses(&records),
            vec!["Assessment".to_string(), "Safeguarding".to_string()]
        );
    }
}
