//! Aggregate statistics over StoryLane demo views.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use training_core::models::EngagementRecord;

/// Number of countries shown in the dashboard's country table.
pub const TOP_COUNTRIES: usize = 10;

/// Engagement summary for one demo.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemoStats {
    pub demo: String,
    pub avg_steps_completed: f64,
    /// 0–100.
    pub avg_percent_complete: f64,
    pub cta_clicks: usize,
    pub total_views: usize,
    /// Views per trimmed country name. Blank countries are not listed.
    pub countries_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

/// Stateless helper computing demo engagement statistics.
pub struct EngagementAggregator;

impl EngagementAggregator {
    /// Stats for views whose demo name equals `demo`. A demo with no views
    /// gives all zeros.
    pub fn demo_stats(records: &[EngagementRecord], demo: &str) -> DemoStats {
        let matching: Vec<&EngagementRecord> = records.iter().filter(|r| r.demo == demo).collect();
        Self::summarise(demo, &matching)
    }

    /// One entry per distinct demo, most viewed first. Ties keep first-seen
    /// order.
    pub fn all_demo_stats(records: &[EngagementRecord]) -> Vec<DemoStats> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&EngagementRecord>> = HashMap::new();
        for record in records {
            groups
                .entry(record.demo.as_str())
                .or_insert_with(|| {
                    order.push(record.demo.as_str());
                    Vec::new()
                })
                .push(record);
        }

        let mut stats: Vec<DemoStats> = order
            .iter()
            .map(|demo| Self::summarise(demo, &groups[demo]))
            .collect();
        stats.sort_by(|a, b| b.total_views.cmp(&a.total_views));
        stats
    }

    /// View counts per country across all records, highest first, at most
    /// `limit` entries.
    pub fn top_countries(records: &[EngagementRecord], limit: usize) -> Vec<CountryCount> {
        let mut counts: Vec<CountryCount> = country_counts(records.iter())
            .into_iter()
            .map(|(country, count)| CountryCount { country, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(limit);
        counts
    }

    /// Distinct demo names, sorted.
    pub fn demo_names(records: &[EngagementRecord]) -> Vec<String> {
        let names: BTreeSet<&str> = records.iter().map(|r| r.demo.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    fn summarise(demo: &str, records: &[&EngagementRecord]) -> DemoStats {
        if records.is_empty() {
            return DemoStats {
                demo: demo.to_string(),
                ..Default::default()
            };
        }
        let n = records.len() as f64;
        let steps: i64 = records.iter().map(|r| r.steps_completed).sum();
        let percent: f64 = records.iter().map(|r| r.percent_complete).sum();

        DemoStats {
            demo: demo.to_string(),
            avg_steps_completed: steps as f64 / n,
            avg_percent_complete: percent / n,
            cta_clicks: records.iter().filter(|r| r.cta_clicked).count(),
            total_views: records.len(),
            countries_breakdown: country_counts(records.iter().copied()),
        }
    }
}

fn country_counts<'a>(records: impl Iterator<Item = &'a EngagementRecord>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let country = record.country.trim();
        if !country.is_empty() {
            *counts.entry(country.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn view(demo: &str, steps: i64, percent: f64, cta: &str, country: &str) -> EngagementRecord {
        EngagementRecord {
            demo: demo.to_string(),
            link: String::new(),
            last_view: "5/7/24 13:25".to_string(),
            total_time: "1m".to_string(),
            steps_completed: steps,
            percent_complete: percent,
            opened_cta: cta.to_string(),
            cta_clicked: training_core::models::cta_clicked(cta),
            country: country.to_string(),
            centre_number: String::new(),
        }
    }

    fn sample() -> Vec<EngagementRecord> {
        vec![
            view("Tour A", 2, 40.0, "-", "China"),
            view("Tour B", 5, 100.0, "https://cta", " United Kingdom "),
            view("Tour A", 4, 60.0, "https://cta", "China"),
            view("Tour B", 1, 10.0, "-", "Ireland"),
            view("Tour B", 3, 50.0, "-", ""),
            view("Tour C", 0, 0.0, "-", "Ireland"),
        ]
    }

    // ── demo_stats ────────────────────────────────────────────────────────

    #[test]
    fn test_demo_stats() {
        let stats = EngagementAggregator::demo_stats(&sample(), "Tour A");
        assert_eq!(stats.total_views, 2);
        assert_eq!(stats.avg_steps_completed, 3.0);
        assert_eq!(stats.avg_percent_complete, 50.0);
        assert_eq!(stats.cta_clicks, 1);
        assert_eq!(stats.countries_breakdown.get("China"), Some(&2));
    }

    #[test]
    fn test_demo_stats_trims_country_and_skips_blank() {
        let stats = EngagementAggregator::demo_stats(&sample(), "Tour B");
        assert_eq!(stats.countries_breakdown.get("United Kingdom"), Some(&1));
        assert_eq!(stats.countries_breakdown.len(), 2);
        assert_eq!(stats.total_views, 3);
    }

    #[test]
    fn test_demo_stats_unknown_demo_is_zero() {
        let stats = EngagementAggregator::demo_stats(&sample(), "Nope");
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.avg_steps_completed, 0.0);
        assert_eq!(stats.avg_percent_complete, 0.0);
        assert!(stats.countries_breakdown.is_empty());
    }

    // ── all_demo_stats ────────────────────────────────────────────────────

    #[test]
    fn test_all_demo_stats_sorted_by_views() {
        let stats = EngagementAggregator::all_demo_stats(&sample());
        let names: Vec<(&str, usize)> = stats
            .iter()
            .map(|s| (s.demo.as_str(), s.total_views))
            .collect();
        assert_eq!(names, vec![("Tour B", 3), ("Tour A", 2), ("Tour C", 1)]);
    }

    #[test]
    fn test_all_demo_stats_empty() {
        assert!(EngagementAggregator::all_demo_stats(&[]).is_empty());
    }

    // ── top_countries ─────────────────────────────────────────────────────

    #[test]
    fn test_top_countries() {
        let top = EngagementAggregator::top_countries(&sample(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].count, 2);
        let names: Vec<&str> = top.iter().map(|c| c.country.as_str()).collect();
        assert!(names.contains(&"China"));
        assert!(names.contains(&"Ireland"));
    }

    // ── demo_names ────────────────────────────────────────────────────────

    #[test]
    fn test_demo_names() {
        assert_eq!(
            EngagementAggregator::demo_names(&sample()),
            vec!["Tour A".to_string(), "Tour B".to_string(), "Tour C".to_string()]
        );
    }
}
