use crate::error::TrialResult;
use crate::session::SessionResult;
use crate::util::{mean, round_to};
use itertools::Itertools;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only store of submitted trial results
pub trait ResultStore {
    fn save(&mut self, result: &SessionResult) -> TrialResult<()>;

    /// Records for one user, or every user when `username` is `None`, newest first.
    fn query_by_user(&self, username: Option<&str>) -> TrialResult<Vec<SessionRecord>>;

    fn best_stats(&self, username: &str) -> TrialResult<BestStats>;
}

/// One persisted row, as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    #[serde(skip)]
    pub id: i64,
    pub username: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub total_chars: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub chars_per_minute: u32,
    pub duration_secs: u64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
}

impl SessionRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SessionRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            wpm: row.get(2)?,
            accuracy: row.get(3)?,
            total_chars: row.get::<_, i64>(4)? as usize,
            correct_chars: row.get::<_, i64>(5)? as usize,
            incorrect_chars: row.get::<_, i64>(6)? as usize,
            chars_per_minute: row.get(7)?,
            duration_secs: row.get::<_, i64>(8)? as u64,
            date: row.get(9)?,
            time: row.get(10)?,
        })
    }
}

/// Personal records for one user; all zero when the user has no results
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BestStats {
    pub best_wpm: u32,
    pub best_accuracy: u32,
    /// Rounded to one decimal place.
    pub avg_wpm: f64,
    pub total_tests: u64,
}

/// Aggregate over an arbitrary list of records (the "all users" view)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverallSummary {
    pub total_tests: usize,
    pub unique_users: usize,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
}

pub fn overall_summary(records: &[SessionRecord]) -> OverallSummary {
    let wpms: Vec<f64> = records.iter().map(|r| r.wpm as f64).collect();
    let accuracies: Vec<f64> = records.iter().map(|r| r.accuracy as f64).collect();

    OverallSummary {
        total_tests: records.len(),
        unique_users: records.iter().map(|r| r.username.as_str()).unique().count(),
        avg_wpm: mean(&wpms).map_or(0.0, |m| round_to(m, 1)),
        avg_accuracy: mean(&accuracies).map_or(0.0, |m| round_to(m, 1)),
    }
}

const CSV_HEADER: [&str; 10] = [
    "username",
    "wpm",
    "accuracy",
    "total_chars",
    "correct_chars",
    "incorrect_chars",
    "chars_per_minute",
    "duration_secs",
    "date",
    "time",
];

/// Write records as CSV, header row first even when there are no records.
pub fn export_csv<W: Write>(records: &[SessionRecord], writer: W) -> TrialResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    Ok(())
}

/// SQLite-backed result store. The connection lives as long as the handle.
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StatsDb {
    /// Open (creating if needed) the database file and its schema
    pub fn open<P: AsRef<Path>>(path: P) -> TrialResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        debug!("opened stats database at {}", path.display());

        Ok(StatsDb {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> TrialResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(StatsDb { conn, path: None })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS user_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                total_chars INTEGER NOT NULL,
                correct_chars INTEGER NOT NULL,
                incorrect_chars INTEGER NOT NULL,
                chars_per_minute INTEGER NOT NULL,
                test_duration INTEGER NOT NULL,
                test_date TEXT NOT NULL,
                test_time TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_user_stats_username ON user_stats(username)",
            [],
        )?;

        Ok(())
    }

    /// The file backing this store, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ResultStore for StatsDb {
    fn save(&mut self, result: &SessionResult) -> TrialResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO user_stats
            (username, wpm, accuracy, total_chars, correct_chars, incorrect_chars,
             chars_per_minute, test_duration, test_date, test_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                result.username,
                result.wpm,
                result.accuracy,
                result.total_chars as i64,
                result.correct_chars as i64,
                result.incorrect_chars as i64,
                result.cpm,
                result.duration_secs as i64,
                result.date(),
                result.time(),
            ],
        )?;

        debug!("saved result for {}", result.username);
        Ok(())
    }

    fn query_by_user(&self, username: Option<&str>) -> TrialResult<Vec<SessionRecord>> {
        const COLUMNS: &str = "SELECT id, username, wpm, accuracy, total_chars, correct_chars, \
             incorrect_chars, chars_per_minute, test_duration, test_date, test_time FROM user_stats";
        const ORDER: &str = "ORDER BY test_date DESC, test_time DESC, id DESC";

        let records = match username {
            Some(name) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{COLUMNS} WHERE username = ?1 {ORDER}"))?;
                let rows = stmt.query_map([name], SessionRecord::from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{COLUMNS} {ORDER}"))?;
                let rows = stmt.query_map([], SessionRecord::from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(records)
    }

    fn best_stats(&self, username: &str) -> TrialResult<BestStats> {
        let mut stmt = self.conn.prepare(
            "SELECT MAX(wpm), MAX(accuracy), AVG(wpm), COUNT(*) FROM user_stats WHERE username = ?1",
        )?;

        let stats = stmt.query_row([username], |row| {
            let best_wpm: Option<u32> = row.get(0)?;
            let best_accuracy: Option<u32> = row.get(1)?;
            let avg_wpm: Option<f64> = row.get(2)?;
            let total_tests: i64 = row.get(3)?;

            Ok(BestStats {
                best_wpm: best_wpm.unwrap_or(0),
                best_accuracy: best_accuracy.unwrap_or(0),
                avg_wpm: avg_wpm.map_or(0.0, |a| round_to(a, 1)),
                total_tests: total_tests as u64,
            })
        })?;

        Ok(stats)
    }
}

impl Drop for StatsDb {
    fn drop(&mut self) {
        debug!("closing stats database");
    }
}
