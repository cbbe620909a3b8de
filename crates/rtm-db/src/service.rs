//! Service layer orchestrating store mutations with audit.
//!
//! `RtmService` wraps `RtmDb` (raw database access) and an [`IdAllocator`]
//! (row identifiers). All repo methods are implemented as `impl RtmService`
//! blocks across `repos/`, `reconcile`, `export` and `keygen`.

use std::sync::Arc;

use rtm_core::ids::{IdAllocator, RandomIds};

use crate::RtmDb;
use crate::error::DatabaseError;

/// Orchestrates store mutations with the audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Begin transaction
/// 2. Execute SQL
/// 3. Append audit entries (inside the transaction)
/// 4. Commit, or roll back on the first error
pub struct RtmService {
    db: RtmDb,
    ids: Arc<dyn IdAllocator>,
}

impl RtmService {
    /// Open a local database and allocate random row identifiers.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = RtmDb::open_local(db_path).await?;
        Ok(Self::from_db(db, Arc::new(RandomIds)))
    }

    /// Create from an existing `RtmDb` with a specific allocator.
    #[must_use]
    pub fn from_db(db: RtmDb, ids: Arc<dyn IdAllocator>) -> Self {
        Self { db, ids }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &RtmDb {
        &self.db
    }

    pub(crate) fn new_id(&self, prefix: &str) -> String {
        self.ids.allocate(prefix)
    }

    pub(crate) async fn begin(&self) -> Result<libsql::Transaction, DatabaseError> {
        Ok(self.db.conn().transaction().await?)
    }
}

/// Commit `tx` when `result` is `Ok`, roll it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
pub(crate) async fn finish<T, E>(
    tx: libsql::Transaction,
    result: Result<T, E>,
    on_commit_error: impl FnOnce(DatabaseError) -> E,
) -> Result<T, E> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| on_commit_error(DatabaseError::from(e)))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}
