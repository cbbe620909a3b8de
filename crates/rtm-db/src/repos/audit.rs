//! Audit trail repository.
//!
//! Append-only entries recording every requirement create, update and delete,
//! with before/after snapshots. Entries are written on the same connection
//! (and so in the same transaction) as the mutation they describe.

use chrono::Utc;
use rtm_core::entities::AuditEntry;
use rtm_core::enums::ChangeKind;
use rtm_core::ids::PREFIX_AUDIT;
use rtm_core::snapshot::RequirementSnapshot;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json, to_json_text};
use crate::service::RtmService;

const SELECT_COLS: &str =
    "id, project_key, requirement_id, requirement_key, change, old_state, new_state, created_at";

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub project_key: Option<String>,
    pub requirement_key: Option<String>,
    pub requirement_id: Option<String>,
    pub change: Option<ChangeKind>,
    pub limit: Option<u32>,
}

fn row_to_audit(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        id: row.get::<String>(0)?,
        project_key: row.get::<String>(1)?,
        requirement_id: row.get::<String>(2)?,
        requirement_key: row.get::<String>(3)?,
        change: parse_enum(&row.get::<String>(4)?)?,
        old_state: parse_optional_json(get_opt_string(row, 5)?.as_deref())?,
        new_state: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

pub(crate) async fn append_audit(
    conn: &libsql::Connection,
    entry: &AuditEntry,
) -> Result<(), DatabaseError> {
    let old_state = entry.old_state.as_ref().map(to_json_text).transpose()?;
    let new_state = entry.new_state.as_ref().map(to_json_text).transpose()?;
    conn.execute(
        &format!("INSERT INTO audit_entries ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        libsql::params![
            entry.id.as_str(),
            entry.project_key.as_str(),
            entry.requirement_id.as_str(),
            entry.requirement_key.as_str(),
            entry.change.as_str(),
            old_state.as_deref(),
            new_state.as_deref(),
            entry.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

impl RtmService {
    /// Append one audit entry for a node on `conn`.
    ///
    /// The change kind follows from which snapshots are present: only `new`
    /// is a creation, only `old` a deletion, both an update.
    pub(crate) async fn record_change(
        &self,
        conn: &libsql::Connection,
        project_key: &str,
        requirement_id: &str,
        old: Option<&RequirementSnapshot>,
        new: Option<&RequirementSnapshot>,
    ) -> Result<AuditEntry, DatabaseError> {
        let (change, requirement_key) = match (old, new) {
            (None, Some(n)) => (ChangeKind::Created, n.key.clone()),
            (Some(o), None) => (ChangeKind::Deleted, o.key.clone()),
            (Some(_), Some(n)) => (ChangeKind::Updated, n.key.clone()),
            (None, None) => {
                return Err(DatabaseError::InvalidState(format!(
                    "audit entry for {requirement_id} needs a snapshot"
                )));
            }
        };
        let entry = AuditEntry {
            id: self.new_id(PREFIX_AUDIT),
            project_key: project_key.to_string(),
            requirement_id: requirement_id.to_string(),
            requirement_key,
            change,
            old_state: old.map(RequirementSnapshot::to_json),
            new_state: new.map(RequirementSnapshot::to_json),
            created_at: Utc::now(),
        };
        append_audit(conn, &entry).await?;
        tracing::debug!(
            project = project_key,
            key = %entry.requirement_key,
            change = %change,
            "audit entry appended"
        );
        Ok(entry)
    }

    /// Query audit entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref pk) = filter.project_key {
            params.push(libsql::Value::Text(pk.clone()));
            conditions.push(format!("project_key = ?{}", params.len()));
        }
        if let Some(ref key) = filter.requirement_key {
            params.push(libsql::Value::Text(key.clone()));
            conditions.push(format!("requirement_key = ?{}", params.len()));
        }
        if let Some(ref rid) = filter.requirement_id {
            params.push(libsql::Value::Text(rid.clone()));
            conditions.push(format!("requirement_id = ?{}", params.len()));
        }
        if let Some(change) = filter.change {
            params.push(libsql::Value::Text(change.as_str().to_string()));
            conditions.push(format!("change = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_entries {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }

    /// Total number of audit entries for a project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_audit(&self, project_key: &str) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM audit_entries WHERE project_key = ?1",
                [project_key],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        crate::helpers::get_count(&row, 0)
    }
}
