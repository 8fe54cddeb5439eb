pub mod queries;

use crate::analyzer::categorizer::Category;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct TimeEntryRow {
    pub id: i64,
    pub domain: String,
    pub time_spent: i64,
    pub category: Category,
    pub timestamp: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct TimeEntryInput {
    pub domain: String,
    pub time_spent_ms: i64,
    pub category: Category,
    pub timestamp: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub productive_time: i64,
    pub unproductive_time: i64,
    pub neutral_time: i64,
    pub total_time: i64,
}

impl DailySummary {
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            productive_time: 0,
            unproductive_time: 0,
            neutral_time: 0,
            total_time: 0,
        }
    }

    pub fn time_for(&self, category: Category) -> i64 {
        match category {
            Category::Productive => self.productive_time,
            Category::Unproductive => self.unproductive_time,
            Category::Neutral => self.neutral_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTotal {
    pub domain: String,
    pub total_time: i64,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub productive: i64,
    pub unproductive: i64,
    pub neutral: i64,
}

impl TrendPoint {
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            productive: 0,
            unproductive: 0,
            neutral: 0,
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<Category>()
            .map_err(|error| FromSqlError::Other(error.into()))
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECONDS))
            .context("Failed to set SQLite busy timeout")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn insert_time_entry(&self, entry: &TimeEntryInput) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO time_entries (domain, time_spent, category, timestamp, date) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &entry.domain,
                    entry.time_spent_ms,
                    entry.category,
                    &entry.timestamp,
                    format_date(entry.date)
                ],
            )
            .context("Failed to insert time entry")?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn entries_for_date(&self, date: &str) -> Result<Vec<TimeEntryRow>> {
        let mut statement = self.conn.prepare(
            "SELECT id, domain, time_spent, category, timestamp, date
             FROM time_entries
             WHERE date = ?1
             ORDER BY id ASC",
        )?;

        let rows = statement
            .query_map(params![date], |row| {
                Ok(TimeEntryRow {
                    id: row.get(0)?,
                    domain: row.get(1)?,
                    time_spent: row.get(2)?,
                    category: row.get(3)?,
                    timestamp: row.get(4)?,
                    date: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query time entries")?;

        Ok(rows)
    }

    pub fn entry_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM time_entries", [], |row| row.get(0))
            .context("Failed to count time entries")
    }

    pub fn latest_entry_timestamp(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT timestamp FROM time_entries ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query latest time entry")
    }

    pub fn recompute_daily_summary(&self, date: &str) -> Result<()> {
        self.conn
            .execute(queries::RECOMPUTE_DAILY_SUMMARY, params![date])
            .with_context(|| format!("Failed to recompute daily summary for {date}"))?;

        Ok(())
    }

    /// Recomputes the summary of every date that has entries. Returns the
    /// number of dates rebuilt.
    pub fn rebuild_summaries(&mut self) -> Result<usize> {
        let transaction = self
            .conn
            .transaction()
            .context("Failed to start transaction")?;

        let dates = {
            let mut statement = transaction
                .prepare("SELECT DISTINCT date FROM time_entries ORDER BY date ASC")?;
            let dates = statement
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to list entry dates")?;
            dates
        };

        dates.iter().try_for_each(|date| {
            transaction
                .execute(queries::RECOMPUTE_DAILY_SUMMARY, params![date])
                .with_context(|| format!("Failed to recompute daily summary for {date}"))
                .map(|_| ())
        })?;

        transaction
            .commit()
            .context("Failed to commit rebuilt summaries")?;
        Ok(dates.len())
    }

    pub fn daily_summary(&self, date: &str) -> Result<Option<DailySummary>> {
        self.conn
            .query_row(
                "SELECT date, productive_time, unproductive_time, neutral_time, total_time
                 FROM daily_summaries
                 WHERE date = ?1",
                params![date],
                map_summary,
            )
            .optional()
            .with_context(|| format!("Failed to query daily summary for {date}"))
    }

    pub fn summaries_between(&self, from: &str, to: &str) -> Result<Vec<DailySummary>> {
        let mut statement = self.conn.prepare(
            "SELECT date, productive_time, unproductive_time, neutral_time, total_time
             FROM daily_summaries
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC",
        )?;

        let rows = statement
            .query_map(params![from, to], map_summary)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query daily summaries")?;

        Ok(rows)
    }

    pub fn top_domains(&self, from: &str, to: &str, limit: usize) -> Result<Vec<DomainTotal>> {
        let mut statement = self.conn.prepare(
            "SELECT domain, SUM(time_spent) AS total_time, category
             FROM time_entries
             WHERE date >= ?1 AND date <= ?2
             GROUP BY domain, category
             ORDER BY total_time DESC, domain ASC
             LIMIT ?3",
        )?;

        let rows = statement
            .query_map(params![from, to, limit as i64], |row| {
                Ok(DomainTotal {
                    domain: row.get(0)?,
                    total_time: row.get(1)?,
                    category: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query top domains")?;

        Ok(rows)
    }

    pub fn productivity_trend(&self, from: &str, to: &str) -> Result<Vec<TrendPoint>> {
        let mut statement = self.conn.prepare(
            "SELECT date,
                    SUM(CASE WHEN category = 'productive' THEN time_spent ELSE 0 END),
                    SUM(CASE WHEN category = 'unproductive' THEN time_spent ELSE 0 END),
                    SUM(CASE WHEN category = 'neutral' THEN time_spent ELSE 0 END)
             FROM time_entries
             WHERE date >= ?1 AND date <= ?2
             GROUP BY date
             ORDER BY date ASC",
        )?;

        let rows = statement
            .query_map(params![from, to], |row| {
                Ok(TrendPoint {
                    date: row.get(0)?,
                    productive: row.get(1)?,
                    unproductive: row.get(2)?,
                    neutral: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query productivity trend")?;

        Ok(rows)
    }
}

fn map_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailySummary> {
    Ok(DailySummary {
        date: row.get(0)?,
        productive_time: row.get(1)?,
        unproductive_time: row.get(2)?,
        neutral_time: row.get(3)?,
        total_time: row.get(4)?,
    })
}
