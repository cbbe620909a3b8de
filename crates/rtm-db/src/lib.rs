//! # rtm-db
//!
//! libSQL store for requirement traceability data.
//!
//! Holds projects, components, the Scope → User Story → Tech Spec requirement
//! tree, implementation records, test artifacts, coverage links, API endpoints
//! and the append-only audit trail. On top of the repos sit the three
//! engine entry points: [`service::RtmService::reconcile`],
//! [`service::RtmService::export`] and [`service::RtmService::generate_key`].
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) in local mode.

pub mod error;
pub mod export;
pub mod helpers;
pub mod keygen;
mod migrations;
pub mod reconcile;
pub mod repos;
pub mod service;
pub mod updates;

mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Database handle: one libSQL database and the single connection every
/// operation runs on.
pub struct RtmDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl RtmDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let rtm_db = Self { db, conn };
        rtm_db.run_migrations().await?;
        Ok(rtm_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
