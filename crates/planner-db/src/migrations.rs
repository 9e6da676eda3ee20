use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: i64 = 1;

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Ordered by version. A migration brings the schema from `version - 1` to `version`.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial schema",
    sql: "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
            event_name  TEXT NOT NULL,
            event_date  TEXT NOT NULL,
            event_time  TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_events_user
            ON events(user_id);
        ",
}];

/// How to bring an outdated schema up to [`SCHEMA_VERSION`].
///
/// `upgrade` runs inside a single transaction opened by [`run`], so a failed
/// upgrade leaves the file as it was.
pub trait MigrationStrategy {
    fn name(&self) -> &'static str;

    fn upgrade(&self, conn: &Connection, from: i64, to: i64) -> Result<()>;
}

/// Applies every pending migration in order. Never drops data.
pub struct Incremental;

impl MigrationStrategy for Incremental {
    fn name(&self) -> &'static str {
        "incremental"
    }

    fn upgrade(&self, conn: &Connection, from: i64, to: i64) -> Result<()> {
        for migration in MIGRATIONS
            .iter()
            .filter(|m| m.version > from && m.version <= to)
        {
            info!("Running migration v{} ({})", migration.version, migration.name);
            conn.execute_batch(migration.sql)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [migration.version],
            )?;
        }
        Ok(())
    }
}

/// Drops `events` and `users` and rebuilds them from scratch.
///
/// Irreversible: every account and event in the file is lost.
pub struct DropAndRecreate;

impl MigrationStrategy for DropAndRecreate {
    fn name(&self) -> &'static str {
        "drop-and-recreate"
    }

    fn upgrade(&self, conn: &Connection, from: i64, to: i64) -> Result<()> {
        let existing = existing_rows(conn)?
            .iter()
            .map(|(table, rows)| format!("{}: {} rows", table, rows))
            .collect::<Vec<_>>();
        warn!(
            "Dropping all accounts and events to move schema v{} -> v{}; this cannot be undone ({})",
            from,
            to,
            if existing.is_empty() {
                "no existing tables".to_string()
            } else {
                existing.join(", ")
            }
        );
        conn.execute_batch(
            "
            DROP TABLE IF EXISTS events;
            DROP TABLE IF EXISTS users;
            DELETE FROM schema_version;
            ",
        )?;
        Incremental.upgrade(conn, 0, to)
    }
}

/// Row counts of the planner tables already present in the file.
fn existing_rows(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::new();
    for table in ["users", "events"] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |r| r.get(0),
        )?;
        if exists {
            let rows: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            counts.push((table, rows));
        }
    }
    Ok(counts)
}

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

pub fn run(conn: &mut Connection, strategy: &dyn MigrationStrategy) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version = current_version(conn)?;
    if version == SCHEMA_VERSION {
        debug!("Schema up to date (v{})", version);
        return Ok(());
    }
    if version > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    strategy.upgrade(&tx, version, SCHEMA_VERSION)?;
    tx.commit()?;

    info!(
        "Database migrations complete (v{} -> v{}, {})",
        version,
        SCHEMA_VERSION,
        strategy.name()
    );
    Ok(())
}
