//! Plain-text rendering of a [`DashboardReport`].

use std::fmt::{self, Write};

use training_core::formatting::{format_count, format_minutes, format_number, format_percent, percentage};
use training_core::models::EnrollmentStatus;
use training_data::analysis::DashboardReport;
use training_data::reader::LoadReport;

const RULE_WIDTH: usize = 64;

/// Render `report` as a sectioned text document.
///
/// `loads` are printed as a source summary; `notice` (usually the last load
/// error) is printed above everything else.
pub fn render_text(
    report: &DashboardReport,
    loads: &[&LoadReport],
    notice: Option<&str>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    if let Some(notice) = notice {
        writeln!(out, "! {}", notice)?;
        writeln!(out)?;
    }

    heading(&mut out, "Training Report")?;
    writeln!(out, "Generated: {}", report.metadata.generated_at)?;
    writeln!(
        out,
        "Training records: {} of {}",
        format_count(report.metadata.filtered_training_records),
        format_count(report.metadata.total_training_records)
    )?;
    writeln!(
        out,
        "Demo views:       {} of {}",
        format_count(report.metadata.filtered_engagement_records),
        format_count(report.metadata.total_engagement_records)
    )?;
    for load in loads {
        writeln!(
            out,
            "  {}: {} rows, {} records, {} skipped",
            load.source,
            format_count(load.rows_read),
            format_count(load.records_built),
            format_count(load.rows_skipped)
        )?;
    }

    heading(&mut out, "Completion Rates")?;
    let rates = &report.completion_rates;
    writeln!(out, "{:<16}{:>10}", "Live webinar", format_percent(rates.live_webinar))?;
    writeln!(out, "{:<16}{:>10}", "Recording", format_percent(rates.recording))?;
    writeln!(out, "{:<16}{:>10}", "eLearning", format_percent(rates.e_learning))?;

    heading(&mut out, "Geography")?;
    let geo = report.geography;
    let total = geo.uk + geo.international;
    writeln!(
        out,
        "{:<16}{:>8}  {}",
        "UK",
        format_count(geo.uk),
        format_percent(percentage(geo.uk, total))
    )?;
    writeln!(
        out,
        "{:<16}{:>8}  {}",
        "International",
        format_count(geo.international),
        format_percent(percentage(geo.international, total))
    )?;

    heading(&mut out, "Engagement")?;
    writeln!(out, "Average time spent: {}", format_minutes(report.engagement.time_spent))?;
    writeln!(
        out,
        "Average progress:   {}",
        format_percent(report.engagement.progress_percentage)
    )?;

    if let Some(months) = &report.monthly_breakdown {
        heading(&mut out, "Monthly Breakdown")?;
        writeln!(
            out,
            "{:<16}{:>7}{:>11}{:>13}{:>13}{:>10}",
            "Month", "Total", "Completed", "In progress", "Not started", "Avg"
        )?;
        for m in months {
            writeln!(
                out,
                "{:<16}{:>7}{:>11}{:>13}{:>13}{:>10}",
                m.display_name,
                format_count(m.total),
                format_count(m.completed),
                format_count(m.in_progress),
                format_count(m.not_started),
                format_percent(m.avg_engagement)
            )?;
        }
    }

    heading(&mut out, "Webinar Enrollments")?;
    writeln!(
        out,
        "Total: {}",
        format_count(report.webinar_stats.total_webinar_enrollments)
    )?;
    for detail in &report.webinar_stats.webinar_details {
        writeln!(out, "{:>6}  {}", format_count(detail.count), detail.course)?;
    }

    if let Some(focus) = &report.category_detail {
        heading(&mut out, &format!("{} Detail", focus.category))?;
        let detail = &focus.detail;
        for status in EnrollmentStatus::ALL {
            writeln!(
                out,
                "{:<16}{:>8}",
                status.to_string(),
                format_count(detail.status_counts.get(status))
            )?;
        }
        writeln!(out, "Average time spent: {}", format_minutes(detail.avg_time_spent))?;
        writeln!(out, "Average progress:   {}", format_percent(detail.avg_progress))?;
        writeln!(out, "Average quiz score: {}", format_number(detail.avg_quiz_score, 1))?;
        writeln!(out, "Top courses:")?;
        for course in &detail.top_courses {
            writeln!(out, "{:>6}  {}", format_count(course.count), course.course)?;
        }
    }

    if !report.demo_stats.is_empty() {
        heading(&mut out, "Demo Engagement")?;
        writeln!(
            out,
            "{:<32}{:>7}{:>8}{:>10}{:>6}",
            "Demo", "Views", "Steps", "Complete", "CTA"
        )?;
        for demo in &report.demo_stats {
            writeln!(
                out,
                "{:<32}{:>7}{:>8}{:>10}{:>6}",
                truncate(&demo.demo, 31),
                format_count(demo.total_views),
                format_number(demo.avg_steps_completed, 1),
                format_percent(demo.avg_percent_complete),
                format_count(demo.cta_clicks)
            )?;
        }
    }

    if !report.top_countries.is_empty() {
        heading(&mut out, "Top Countries")?;
        for country in &report.top_countries {
            writeln!(out, "{:>6}  {}", format_count(country.count), country.country)?;
        }
    }

    Ok(out)
}

fn heading(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "─".repeat(RULE_WIDTH))
}

/// Cut `s` to at most `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

// ── Tests ──────────────────────────────────────────────────────────────────────
