pub mod error;
pub mod migrations;
pub mod models;
pub mod password;
pub mod queries;

pub use error::{Result, StoreError};
pub use migrations::{DropAndRecreate, Incremental, MigrationStrategy, SCHEMA_VERSION};

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// The planner's single source of truth for accounts and events.
///
/// One connection behind a mutex: every call is serialized, and every
/// mutation is committed before it returns.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &Incremental)
    }

    pub fn open_with(path: &Path, strategy: &dyn MigrationStrategy) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!("journal_mode = {}", mode);

        let db = Self::init(conn, strategy)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, &Incremental)
    }

    fn init(mut conn: Connection, strategy: &dyn MigrationStrategy) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&mut conn, strategy)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn schema_version(&self) -> Result<i64> {
        self.with_conn(migrations::current_version)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }
}
