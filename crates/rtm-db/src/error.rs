//! Database and reconciliation error types for rtm-db.

use std::fmt;

use thiserror::Error;

use rtm_core::enums::RequirementType;
use rtm_core::errors::DocumentError;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A named entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A write would violate a uniqueness rule.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid state encountered (e.g., bad data in DB, illegal parent).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}

/// Step of a reconciliation, reported with storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    Begin,
    Project,
    Purge,
    Component,
    Requirement,
    Attachments,
    Audit,
    ApiEndpoints,
    Commit,
}

impl ReconcileStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Project => "project",
            Self::Purge => "purge",
            Self::Component => "component",
            Self::Requirement => "requirement",
            Self::Attachments => "attachments",
            Self::Audit => "audit",
            Self::ApiEndpoints => "api_endpoints",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a reconciliation was rejected. Nothing is persisted in any case.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Parse or shape problem, found before the transaction began.
    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),

    /// A node names a component the document does not declare and the
    /// project does not already have.
    #[error("Requirement {key} references undeclared component {component}")]
    UnknownComponent { key: String, component: String },

    /// Overwrite imports insert every node, so keys must be unique.
    #[error("Requirement key {0} appears more than once in an overwrite import")]
    DuplicateKey(String),

    /// Update mode cannot move a stored node to another level of the tree.
    #[error("Requirement {key} is stored as {stored} and cannot become {incoming}")]
    TypeChange {
        key: String,
        stored: RequirementType,
        incoming: RequirementType,
    },

    /// The store failed while executing `stage`.
    #[error("Storage error during {stage}{}: {source}", .key.as_deref().map(|k| format!(" ({k})")).unwrap_or_default())]
    Storage {
        stage: ReconcileStage,
        key: Option<String>,
        #[source]
        source: DatabaseError,
    },
}

impl ReconcileError {
    /// Requirement key the error is about, when there is one.
    #[must_use]
    pub fn requirement_key(&self) -> Option<&str> {
        match self {
            Self::Document(e) => e.requirement_key(),
            Self::UnknownComponent { key, .. } | Self::TypeChange { key, .. } => Some(key),
            Self::DuplicateKey(key) => Some(key),
            Self::Storage { key, .. } => key.as_deref(),
        }
    }
}

/// Attach a stage (and optionally a key) to a storage failure.
pub(crate) trait AtStage<T> {
    fn at(self, stage: ReconcileStage, key: Option<&str>) -> Result<T, ReconcileError>;
}

impl<T, E> AtStage<T> for Result<T, E>
where
    E: Into<DatabaseError>,
{
    fn at(self, stage: ReconcileStage, key: Option<&str>) -> Result<T, ReconcileError> {
        self.map_err(|e| ReconcileError::Storage {
            stage,
            key: key.map(str::to_string),
            source: e.into(),
        })
    }
}
