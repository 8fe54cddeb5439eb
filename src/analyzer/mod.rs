pub mod categorizer;
pub mod report;

use crate::db::{
    DailySummary, Database, DomainTotal, TimeEntryInput, TrendPoint, format_date,
};
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const TOP_DOMAINS_LIMIT: usize = 20;
pub const WEEKLY_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_TOP_DOMAINS_DAYS: u32 = 7;
pub const DEFAULT_TREND_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Inclusive `[today - days, today]` range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Windows reaching past the calendar's start begin at `NaiveDate::MIN`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        Self {
            from: today
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            to: today,
        }
    }

    pub fn bounds(&self) -> (String, String) {
        (format_date(self.from), format_date(self.to))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(|date| *date <= self.to)
    }
}

/// Appends the entry and refreshes its date's summary. A failed refresh is
/// logged and does not fail the write.
pub fn record_entry(database: &Database, entry: &TimeEntryInput) -> Result<i64> {
    let id = database.insert_time_entry(entry)?;
    let date = format_date(entry.date);

    match database.recompute_daily_summary(&date) {
        Ok(()) => debug!(id, date = %date, "daily summary recomputed"),
        Err(error) => warn!(error = %error, date = %date, "failed to recompute daily summary"),
    }

    Ok(id)
}

pub fn daily_stats(database: &Database, date: NaiveDate) -> Result<DailySummary> {
    let key = format_date(date);
    Ok(database
        .daily_summary(&key)?
        .unwrap_or_else(|| DailySummary::empty(&key)))
}

pub fn weekly_stats(
    database: &Database,
    today: NaiveDate,
    fill_missing: bool,
) -> Result<Vec<DailySummary>> {
    let window = DateWindow::trailing(today, WEEKLY_WINDOW_DAYS);
    let (from, to) = window.bounds();
    let summaries = database.summaries_between(&from, &to)?;

    if !fill_missing {
        return Ok(summaries);
    }

    Ok(fill_window(
        &window,
        summaries,
        |summary| summary.date.clone(),
        DailySummary::empty,
    ))
}

pub fn top_domains(database: &Database, today: NaiveDate, days: u32) -> Result<Vec<DomainTotal>> {
    let (from, to) = DateWindow::trailing(today, days).bounds();
    database.top_domains(&from, &to, TOP_DOMAINS_LIMIT)
}

pub fn productivity_trend(
    database: &Database,
    today: NaiveDate,
    days: u32,
    fill_missing: bool,
) -> Result<Vec<TrendPoint>> {
    let window = DateWindow::trailing(today, days);
    let (from, to) = window.bounds();
    let points = database.productivity_trend(&from, &to)?;

    if !fill_missing {
        return Ok(points);
    }

    Ok(fill_window(
        &window,
        points,
        |point| point.date.clone(),
        TrendPoint::empty,
    ))
}

fn fill_window<T>(
    window: &DateWindow,
    rows: Vec<T>,
    key: impl Fn(&T) -> String,
    empty: impl Fn(&str) -> T,
) -> Vec<T> {
    let mut by_date = rows
        .into_iter()
        .map(|row| (key(&row), row))
        .collect::<BTreeMap<_, _>>();

    window
        .dates()
        .map(|date| {
            let date = format_date(date);
            by_date.remove(&date).unwrap_or_else(|| empty(&date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        DateWindow, daily_stats, productivity_trend, record_entry, top_domains, weekly_stats,
    };
    use crate::analyzer::categorizer::Category;
    use crate::db::{Database, TimeEntryInput};
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("temp dir");
        let database = Database::open(&dir.path().join("sitetime.db")).expect("open db");
        (dir, database)
    }

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
    }

    fn record(database: &Database, domain: &str, ms: i64, category: Category, date: NaiveDate) {
        let entry = TimeEntryInput {
            domain: domain.to_string(),
            time_spent_ms: ms,
            category,
            timestamp: format!("{}T09:30:00+00:00", date.format("%Y-%m-%d")),
            date,
        };
        record_entry(database, &entry).expect("record entry");
    }

    #[test]
    fn recorded_entry_shows_up_in_daily_stats() {
        let (_dir, database) = open_temp();
        record(&database, "github.com", 120_000, Category::Productive, day("2024-01-01"));

        let summary = daily_stats(&database, day("2024-01-01")).expect("daily stats");

        assert_eq!(summary.productive_time, 120_000);
        assert_eq!(summary.unproductive_time, 0);
        assert_eq!(summary.neutral_time, 0);
        assert_eq!(summary.total_time, 120_000);
    }

    #[test]
    fn same_category_entries_are_summed() {
        let (_dir, database) = open_temp();
        record(&database, "github.com", 60_000, Category::Productive, day("2024-01-01"));
        record(&database, "notion.so", 40_000, Category::Productive, day("2024-01-01"));

        let summary = daily_stats(&database, day("2024-01-01")).expect("daily stats");

        assert_eq!(summary.productive_time, 100_000);
        assert_eq!(summary.total_time, 100_000);
    }

    #[test]
    fn summary_total_matches_entry_sum() {
        let (_dir, database) = open_temp();
        let date = day("2024-03-10");
        let entries = [
            ("github.com", 1_500, Category::Productive),
            ("reddit.com", 2_500, Category::Unproductive),
            ("example.org", 700, Category::Neutral),
            ("reddit.com", 300, Category::Unproductive),
            ("github.com", 0, Category::Productive),
        ];
        for (domain, ms, category) in entries {
            record(&database, domain, ms, category, date);
        }

        let summary = daily_stats(&database, date).expect("daily stats");
        let expected = entries.iter().map(|(_, ms, _)| ms).sum::<i64>();

        assert_eq!(summary.total_time, expected);
        assert_eq!(
            summary.productive_time + summary.unproductive_time + summary.neutral_time,
            summary.total_time
        );
        assert_eq!(summary.unproductive_time, 2_800);
    }

    #[test]
    fn daily_stats_without_entries_is_zeroed() {
        let (_dir, database) = open_temp();

        let summary = daily_stats(&database, day("2030-05-05")).expect("daily stats");

        assert_eq!(summary.date, "2030-05-05");
        assert_eq!(summary.total_time, 0);
        assert_eq!(summary.productive_time, 0);
    }

    #[test]
    fn weekly_stats_stays_inside_trailing_window() {
        let (_dir, database) = open_temp();
        let today = day("2024-06-15");
        record(&database, "github.com", 1_000, Category::Productive, today);
        record(&database, "github.com", 2_000, Category::Productive, today - Duration::days(7));
        record(&database, "github.com", 4_000, Category::Productive, today - Duration::days(8));
        record(&database, "github.com", 8_000, Category::Productive, today + Duration::days(1));

        let sparse = weekly_stats(&database, today, false).expect("weekly stats");
        let dates = sparse.iter().map(|row| row.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2024-06-08", "2024-06-15"]);

        let filled = weekly_stats(&database, today, true).expect("weekly stats");
        assert_eq!(filled.len(), 8);
        assert_eq!(filled.first().map(|row| row.date.as_str()), Some("2024-06-08"));
        assert_eq!(filled.last().map(|row| row.total_time), Some(1_000));
        assert!(filled.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert_eq!(filled[3].total_time, 0);
    }

    #[test]
    fn top_domains_is_capped_and_sorted() {
        let (_dir, database) = open_temp();
        let today = day("2024-06-15");
        for index in 0..25_i64 {
            let domain = format!("site{index}.example");
            record(&database, &domain, 1_000 * (index % 7 + 1), Category::Neutral, today);
        }
        record(&database, "github.com", 50_000, Category::Productive, today - Duration::days(2));
        record(&database, "github.com", 90_000, Category::Productive, today - Duration::days(30));

        let rows = top_domains(&database, today, 7).expect("top domains");

        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].domain, "github.com");
        assert_eq!(rows[0].total_time, 50_000);
        assert!(rows.windows(2).all(|pair| pair[0].total_time >= pair[1].total_time));
    }

    #[test]
    fn productivity_trend_fills_or_omits_empty_days() {
        let (_dir, database) = open_temp();
        let today = day("2024-06-15");
        record(&database, "github.com", 3_000, Category::Productive, today - Duration::days(2));
        record(&database, "reddit.com", 1_000, Category::Unproductive, today - Duration::days(2));
        record(&database, "example.org", 500, Category::Neutral, today);

        let sparse = productivity_trend(&database, today, 3, false).expect("trend");
        assert_eq!(sparse.len(), 2);
        assert_eq!(sparse[0].date, "2024-06-13");
        assert_eq!(sparse[0].productive, 3_000);
        assert_eq!(sparse[0].unproductive, 1_000);
        assert_eq!(sparse[0].neutral, 0);

        let filled = productivity_trend(&database, today, 3, true).expect("trend");
        let dates = filled.iter().map(|row| row.date.as_str()).collect::<Vec<_>>();
        assert_eq!(dates, vec!["2024-06-12", "2024-06-13", "2024-06-14", "2024-06-15"]);
        assert_eq!(filled[2].productive + filled[2].unproductive + filled[2].neutral, 0);
        assert_eq!(filled[3].neutral, 500);
    }

    #[test]
    fn trailing_window_is_inclusive() {
        let today = day("2024-01-10");

        let window = DateWindow::trailing(today, 7);
        assert_eq!(window.bounds(), ("2024-01-03".to_string(), "2024-01-10".to_string()));
        assert_eq!(window.dates().count(), 8);

        let zero = DateWindow::trailing(today, 0);
        assert_eq!(zero.dates().count(), 1);

        let long = DateWindow::trailing(today, 10_000);
        assert_eq!(long.dates().count(), 10_001);

        let huge = DateWindow::trailing(today, u32::MAX);
        assert_eq!(huge.from, NaiveDate::MIN);
    }

    #[test]
    fn long_windows_keep_old_entries() {
        let (_dir, database) = open_temp();
        let today = day("2024-06-15");
        record(&database, "github.com", 2_000, Category::Productive, today - Duration::days(400));

        let rows = top_domains(&database, today, 500).expect("top domains");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_time, 2_000);

        let trend = productivity_trend(&database, today, 500, false).expect("trend");
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].productive, 2_000);
    }
}
