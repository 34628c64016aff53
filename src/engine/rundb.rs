//! Run database: every trial and the final configuration, in SQLite.
//!
//! One database per program. The coordinator never touches this; the driver
//! records submissions before dispatch and outcomes as reports arrive, so a
//! wound-down run leaves no row in a state the process didn't report.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use crate::space::Candidate;
use crate::types::{RequestHandle, TrialOutcome};

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Schema for trials and runinfo tables.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trials (
    handle INTEGER PRIMARY KEY,
    config TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    millis REAL
);

CREATE TABLE IF NOT EXISTS runinfo (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const INSERT_TRIAL_SQL: &str =
    "INSERT OR REPLACE INTO trials (handle, config, status, millis) VALUES (?1, ?2, 'pending', NULL)";

const INSERT_RUNINFO_SQL: &str = "INSERT OR REPLACE INTO runinfo (key, value) VALUES (?1, ?2)";

/// Enable WAL and apply schema to an open connection (idempotent).
fn apply_wal_and_schema(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .context("enable WAL")?;
    conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(())
}

/// Open or create the run DB and ensure schema + WAL.
pub fn open_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).context("open run database")?;
    apply_wal_and_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory DB with the same schema (no WAL pragmas needed).
pub fn open_db_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory run database")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(conn)
}

/// Record the program name for the run.
pub fn record_program(conn: &Connection, program: &str) -> Result<()> {
    conn.execute(INSERT_RUNINFO_SQL, params!["program", program])
        .context("record program name")?;
    Ok(())
}

/// Record a candidate at submission time, status `pending`.
pub fn record_submitted(conn: &Connection, handle: RequestHandle, candidate: &Candidate) -> Result<()> {
    let config = serde_json::to_string(candidate).context("serialize candidate")?;
    conn.execute(INSERT_TRIAL_SQL, params![handle.0 as i64, config])
        .context("record submitted trial")?;
    Ok(())
}

/// Record the outcome reported for a trial.
pub fn record_outcome(conn: &Connection, handle: RequestHandle, outcome: TrialOutcome) -> Result<()> {
    let (status, millis) = match outcome {
        TrialOutcome::Time(millis) => ("ok", Some(millis)),
        TrialOutcome::Failed => ("failed", None),
        TrialOutcome::Aborted => ("aborted", None),
    };
    let updated = conn
        .execute(
            "UPDATE trials SET status = ?2, millis = ?3 WHERE handle = ?1",
            params![handle.0 as i64, status, millis],
        )
        .context("record trial outcome")?;
    if updated == 0 {
        log::warn!("outcome for handle {} matches no recorded trial", handle);
    }
    Ok(())
}

/// Record the final (best-found) configuration after the evaluator
/// acknowledged it.
pub fn record_final(conn: &Connection, candidate: &Candidate) -> Result<()> {
    let config = serde_json::to_string(candidate).context("serialize final configuration")?;
    conn.execute(INSERT_RUNINFO_SQL, params!["final_config", config])
        .context("record final configuration")?;
    Ok(())
}

/// Best measured trial so far: (candidate, millis), lowest time first.
pub fn best_trial(conn: &Connection) -> Result<Option<(Candidate, f64)>> {
    let row = conn
        .query_row(
            "SELECT config, millis FROM trials WHERE status = 'ok' ORDER BY millis ASC LIMIT 1",
            [],
            |row| {
                let config: String = row.get(0)?;
                let millis: f64 = row.get(1)?;
                Ok((config, millis))
            },
        )
        .optional()
        .context("query best trial")?;
    match row {
        Some((config, millis)) => {
            let candidate: Candidate =
                serde_json::from_str(&config).context("parse stored candidate")?;
            Ok(Some((candidate, millis)))
        }
        None => Ok(None),
    }
}

/// Count trials, optionally restricted to one status.
pub fn count_trials(conn: &Connection, status: Option<&str>) -> Result<u64> {
    let count: i64 = match status {
        Some(status) => conn.query_row(
            "SELECT COUNT(*) FROM trials WHERE status = ?1",
            params![status],
            |row| row.get(0),
        ),
        None => conn.query_row("SELECT COUNT(*) FROM trials", [], |row| row.get(0)),
    }
    .context("count trials")?;
    Ok(count.max(0) as u64)
}
