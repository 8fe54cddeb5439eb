pub const CREATE_TIME_ENTRIES: &str = r#"
CREATE TABLE IF NOT EXISTS time_entries (
  id          INTEGER PRIMARY KEY AUTOINCREMENT,
  domain      TEXT NOT NULL,
  time_spent  INTEGER NOT NULL CHECK (time_spent >= 0),
  category    TEXT NOT NULL CHECK (category IN ('productive', 'unproductive', 'neutral')),
  timestamp   TEXT NOT NULL,
  date        TEXT NOT NULL
);
"#;

pub const CREATE_DAILY_SUMMARIES: &str = r#"
CREATE TABLE IF NOT EXISTS daily_summaries (
  id                INTEGER PRIMARY KEY AUTOINCREMENT,
  date              TEXT NOT NULL UNIQUE,
  productive_time   INTEGER NOT NULL DEFAULT 0,
  unproductive_time INTEGER NOT NULL DEFAULT 0,
  neutral_time      INTEGER NOT NULL DEFAULT 0,
  total_time        INTEGER NOT NULL DEFAULT 0
);
"#;

pub const INDEX_TIME_ENTRIES_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_time_entries_date ON time_entries(date);";

pub const INDEX_TIME_ENTRIES_DOMAIN: &str =
    "CREATE INDEX IF NOT EXISTS idx_time_entries_domain ON time_entries(domain, category);";

/// Reads the entries for `?1` and replaces its summary row in one statement.
/// The `WHERE` clause is required for SQLite to parse `ON CONFLICT` after a
/// `SELECT`.
pub const RECOMPUTE_DAILY_SUMMARY: &str = r#"
INSERT INTO daily_summaries (date, productive_time, unproductive_time, neutral_time, total_time)
SELECT ?1,
       COALESCE(SUM(CASE WHEN category = 'productive' THEN time_spent ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN category = 'unproductive' THEN time_spent ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN category = 'neutral' THEN time_spent ELSE 0 END), 0),
       COALESCE(SUM(time_spent), 0)
FROM time_entries
WHERE date = ?1
ON CONFLICT(date)
DO UPDATE SET productive_time=excluded.productive_time,
              unproductive_time=excluded.unproductive_time,
              neutral_time=excluded.neutral_time,
              total_time=excluded.total_time
"#;

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_TIME_ENTRIES,
        CREATE_DAILY_SUMMARIES,
        INDEX_TIME_ENTRIES_DATE,
        INDEX_TIME_ENTRIES_DOMAIN,
    ]
}
