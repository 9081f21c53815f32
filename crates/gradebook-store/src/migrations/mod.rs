//! Schema migrations, tracked in `PRAGMA user_version`.

use gradebook_core::StoreError;
use rusqlite::Connection;

use crate::error::open_failed;

/// SQL for each migration version
const MIGRATIONS: &[(&str, &str)] = &[("v001_initial", include_str!("v001_initial.sql"))];

/// Runs database migrations
pub(crate) struct Migrator<'a> {
    conn: &'a Connection,
}

impl<'a> Migrator<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub(crate) fn current_version(&self) -> Result<i32, StoreError> {
        self.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| open_failed("reading schema version", e))
    }

    fn set_version(&self, version: i32) -> Result<(), StoreError> {
        self.conn
            .pragma_update(None, "user_version", version)
            .map_err(|e| open_failed("writing schema version", e))
    }

    /// Run all pending migrations
    pub(crate) fn migrate(&self) -> Result<(), StoreError> {
        let current = self.current_version()?;
        let target = Self::target_version();

        if current >= target {
            return Ok(());
        }

        for (idx, (name, sql)) in MIGRATIONS.iter().enumerate() {
            let version = (idx + 1) as i32;
            if version > current {
                tracing::info!("Running migration {}: {}", version, name);
                self.conn
                    .execute_batch(sql)
                    .map_err(|e| open_failed(&format!("migration {name}"), e))?;
                self.set_version(version)?;
            }
        }

        Ok(())
    }

    pub(crate) fn target_version() -> i32 {
        MIGRATIONS.len() as i32
    }
}
