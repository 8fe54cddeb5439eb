use crate::analyzer::categorizer::Category;
use crate::db::{DailySummary, DomainTotal};

pub fn render_daily_report(summary: &DailySummary, top_domains: &[DomainTotal]) -> String {
    let productivity_ratio = ratio(summary.productive_time, summary.total_time);

    let category_rows = Category::ALL
        .iter()
        .map(|category| {
            let millis = summary.time_for(*category);
            format!(
                "| {} | {} | {:.0}% |",
                category_label(*category),
                format_duration_ms(millis),
                ratio(millis, summary.total_time)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let domain_rows = if top_domains.is_empty() {
        "- No data".to_string()
    } else {
        top_domains
            .iter()
            .enumerate()
            .map(|(index, metric)| {
                format!(
                    "{}. {} ({}) - {}",
                    index + 1,
                    metric.domain,
                    metric.category,
                    format_duration_ms(metric.total_time)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# Daily Browsing Report - {}\n\n## Summary\n- Total tracked time: {}\n- Productivity ratio: {:.0}%\n\n## Time by Category\n| Category | Time | Ratio |\n|----------|------|-------|\n{}\n\n## Top Domains\n{}\n",
        summary.date,
        format_duration_ms(summary.total_time),
        productivity_ratio,
        category_rows,
        domain_rows
    )
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Productive => "Productive",
        Category::Unproductive => "Unproductive",
        Category::Neutral => "Neutral",
    }
}

fn ratio(part: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        (part.max(0) as f64 / total as f64) * 100.0
    }
}

pub fn format_duration_ms(millis: i64) -> String {
    let seconds = (millis.max(0) / 1000) as u64;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remain_seconds = seconds % 60;

    if hours > 0 {
        if remain_seconds == 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h {minutes}m {remain_seconds}s")
        }
    } else if minutes > 0 {
        if remain_seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {remain_seconds}s")
        }
    } else {
        format!("{remain_seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_duration_ms, render_daily_report};
    use crate::analyzer::categorizer::Category;
    use crate::db::{DailySummary, DomainTotal};

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration_ms(0), "0s");
        assert_eq!(format_duration_ms(45_999), "45s");
        assert_eq!(format_duration_ms(120_000), "2m");
        assert_eq!(format_duration_ms(3_723_000), "1h 2m 3s");
        assert_eq!(format_duration_ms(-10), "0s");
    }

    #[test]
    fn report_lists_categories_and_domains() {
        let summary = DailySummary {
            date: "2024-01-01".to_string(),
            productive_time: 90_000,
            unproductive_time: 30_000,
            neutral_time: 0,
            total_time: 120_000,
        };
        let domains = vec![DomainTotal {
            domain: "github.com".to_string(),
            total_time: 90_000,
            category: Category::Productive,
        }];

        let rendered = render_daily_report(&summary, &domains);

        assert!(rendered.contains("# Daily Browsing Report - 2024-01-01"));
        assert!(rendered.contains("Productivity ratio: 75%"));
        assert!(rendered.contains("| Productive | 1m 30s | 75% |"));
        assert!(rendered.contains("1. github.com (productive) - 1m 30s"));
    }

    #[test]
    fn empty_report_has_no_domains() {
        let rendered = render_daily_report(&DailySummary::empty("2024-01-02"), &[]);

        assert!(rendered.contains("- No data"));
        assert!(rendered.contains("Total tracked time: 0s"));
    }
}
