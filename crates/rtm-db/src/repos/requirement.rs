//! Requirement repository: row helpers used by reconciliation, plus manual
//! create / update / delete with key generation and audit.

use chrono::Utc;
use rtm_core::entities::Requirement;
use rtm_core::enums::RequirementType;
use rtm_core::ids::PREFIX_REQUIREMENT;
use rtm_core::responses::DeleteResponse;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_string_list, to_json_text};
use crate::repos::component::find_component;
use crate::repos::nodes::{StoredNode, load_nodes};
use crate::repos::project::require_project;
use crate::service::{RtmService, finish};
use crate::updates::requirement::RequirementUpdate;

const SELECT_COLS: &str = "id, project_id, component_id, parent_id, key, requirement_type, title, \
     description, category, priority, status, acceptance_criteria, position, created_at, updated_at";

fn row_to_requirement(row: &libsql::Row) -> Result<Requirement, DatabaseError> {
    Ok(Requirement {
        id: row.get(0)?,
        project_id: row.get(1)?,
        component_id: row.get(2)?,
        parent_id: get_opt_string(row, 3)?,
        key: row.get(4)?,
        requirement_type: parse_enum(&row.get::<String>(5)?)?,
        title: row.get(6)?,
        description: get_opt_string(row, 7)?,
        category: get_opt_string(row, 8)?,
        priority: get_opt_string(row, 9)?,
        status: get_opt_string(row, 10)?,
        acceptance_criteria: parse_string_list(&row.get::<String>(11)?)?,
        position: row.get(12)?,
        created_at: parse_datetime(&row.get::<String>(13)?)?,
        updated_at: parse_datetime(&row.get::<String>(14)?)?,
    })
}

async fn query_requirements(
    conn: &libsql::Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<Vec<Requirement>, DatabaseError> {
    let mut rows = conn.query(sql, params).await?;
    let mut requirements = Vec::new();
    while let Some(row) = rows.next().await? {
        requirements.push(row_to_requirement(&row)?);
    }
    Ok(requirements)
}

pub(crate) async fn insert_requirement(
    conn: &libsql::Connection,
    r: &Requirement,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO requirements ({SELECT_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        libsql::params![
            r.id.as_str(),
            r.project_id.as_str(),
            r.component_id.as_str(),
            r.parent_id.as_deref(),
            r.key.as_str(),
            r.requirement_type.as_str(),
            r.title.as_str(),
            r.description.as_deref(),
            r.category.as_deref(),
            r.priority.as_deref(),
            r.status.as_deref(),
            to_json_text(&r.acceptance_criteria)?,
            r.position,
            r.created_at.to_rfc3339(),
            r.updated_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

/// Overwrite every mutable column of an existing row, keeping its id and
/// creation time.
pub(crate) async fn update_requirement_row(
    conn: &libsql::Connection,
    r: &Requirement,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE requirements SET component_id = ?1, parent_id = ?2, requirement_type = ?3,
             title = ?4, description = ?5, category = ?6, priority = ?7, status = ?8,
             acceptance_criteria = ?9, position = ?10, updated_at = ?11
         WHERE id = ?12",
        libsql::params![
            r.component_id.as_str(),
            r.parent_id.as_deref(),
            r.requirement_type.as_str(),
            r.title.as_str(),
            r.description.as_deref(),
            r.category.as_deref(),
            r.priority.as_deref(),
            r.status.as_deref(),
            to_json_text(&r.acceptance_criteria)?,
            r.position,
            r.updated_at.to_rfc3339(),
            r.id.as_str()
        ],
    )
    .await?;
    Ok(())
}

pub(crate) async fn find_requirement(
    conn: &libsql::Connection,
    project_id: &str,
    key: &str,
) -> Result<Option<Requirement>, DatabaseError> {
    let mut found = query_requirements(
        conn,
        &format!("SELECT {SELECT_COLS} FROM requirements WHERE project_id = ?1 AND key = ?2"),
        [project_id, key],
    )
    .await?;
    Ok(found.pop())
}

pub(crate) async fn require_requirement(
    conn: &libsql::Connection,
    project_id: &str,
    key: &str,
) -> Result<Requirement, DatabaseError> {
    find_requirement(conn, project_id, key)
        .await?
        .ok_or_else(|| DatabaseError::not_found("requirement", key))
}

pub(crate) async fn key_exists(
    conn: &libsql::Connection,
    project_id: &str,
    key: &str,
) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM requirements WHERE project_id = ?1 AND key = ?2",
            [project_id, key],
        )
        .await?;
    Ok(rows.next().await?.is_some())
}

/// `WHERE` clause and parameters selecting the siblings of a node.
///
/// Children share a parent. Roots share (component, type).
fn sibling_clause(
    project_id: &str,
    component_id: &str,
    parent_id: Option<&str>,
    requirement_type: RequirementType,
) -> (&'static str, Vec<libsql::Value>) {
    let text = |s: &str| libsql::Value::Text(s.to_string());
    match parent_id {
        Some(parent) => (
            "project_id = ?1 AND parent_id = ?2 AND requirement_type = ?3",
            vec![text(project_id), text(parent), text(requirement_type.as_str())],
        ),
        None => (
            "project_id = ?1 AND parent_id IS NULL AND component_id = ?2 AND requirement_type = ?3",
            vec![text(project_id), text(component_id), text(requirement_type.as_str())],
        ),
    }
}

pub(crate) async fn sibling_keys(
    conn: &libsql::Connection,
    project_id: &str,
    component_id: &str,
    parent_id: Option<&str>,
    requirement_type: RequirementType,
) -> Result<Vec<String>, DatabaseError> {
    let (clause, params) = sibling_clause(project_id, component_id, parent_id, requirement_type);
    let mut rows = conn
        .query(
            &format!("SELECT key FROM requirements WHERE {clause}"),
            libsql::params_from_iter(params),
        )
        .await?;
    let mut keys = Vec::new();
    while let Some(row) = rows.next().await? {
        keys.push(row.get::<String>(0)?);
    }
    Ok(keys)
}

async fn next_position(
    conn: &libsql::Connection,
    project_id: &str,
    component_id: &str,
    parent_id: Option<&str>,
    requirement_type: RequirementType,
) -> Result<i64, DatabaseError> {
    let (clause, params) = sibling_clause(project_id, component_id, parent_id, requirement_type);
    let mut rows = conn
        .query(
            &format!("SELECT COALESCE(MAX(position) + 1, 0) FROM requirements WHERE {clause}"),
            libsql::params_from_iter(params),
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<i64>(0)?)
}

/// Ids of `root_id` and all its descendants, parents before children.
pub(crate) async fn subtree_ids(
    conn: &libsql::Connection,
    root_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    let mut rows = conn
        .query(
            "WITH RECURSIVE subtree(id, depth) AS (
                 SELECT id, 0 FROM requirements WHERE id = ?1
                 UNION ALL
                 SELECT r.id, s.depth + 1 FROM requirements r JOIN subtree s ON r.parent_id = s.id
             )
             SELECT s.id FROM subtree s JOIN requirements r ON r.id = s.id
             ORDER BY s.depth, r.position, r.rowid",
            [root_id],
        )
        .await?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(row.get::<String>(0)?);
    }
    Ok(ids)
}

async fn load_one(
    conn: &libsql::Connection,
    project_id: &str,
    id: &str,
) -> Result<StoredNode, DatabaseError> {
    load_nodes(conn, project_id, Some(&[id.to_string()]))
        .await?
        .pop()
        .ok_or(DatabaseError::NoResult)
}

/// Input for manual creation. `key` is generated when absent; `component_key`
/// is inherited from the parent when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequirement {
    pub project_key: String,
    pub requirement_type: RequirementType,
    pub component_key: Option<String>,
    pub parent_key: Option<String>,
    pub key: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub acceptance_criteria: Vec<String>,
}

impl NewRequirement {
    #[must_use]
    pub fn new(
        project_key: impl Into<String>,
        requirement_type: RequirementType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            requirement_type,
            component_key: None,
            parent_key: None,
            key: None,
            title: title.into(),
            description: None,
            category: None,
            priority: None,
            status: None,
            acceptance_criteria: Vec::new(),
        }
    }
}

impl RtmService {
    /// Create one requirement outside of an import.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::NotFound` for an unknown project, component or parent.
    /// - `DatabaseError::InvalidState` when the parent has the wrong type, or a
    ///   root has no component.
    /// - `DatabaseError::Conflict` when an explicit key is already used.
    pub async fn create_requirement(
        &self,
        new: &NewRequirement,
    ) -> Result<Requirement, DatabaseError> {
        let tx = self.begin().await?;
        let result = self.create_requirement_in(&tx, new).await;
        let created = finish(tx, result, |e| e).await?;
        tracing::info!(project = %new.project_key, key = %created.key, "requirement created");
        Ok(created)
    }

    async fn create_requirement_in(
        &self,
        conn: &libsql::Connection,
        new: &NewRequirement,
    ) -> Result<Requirement, DatabaseError> {
        let project = require_project(conn, &new.project_key).await?;

        let parent = match new.parent_key.as_deref() {
            Some(key) => Some(require_requirement(conn, &project.id, key).await?),
            None => None,
        };
        if let Some(ref p) = parent {
            if !new.requirement_type.accepts_parent(Some(p.requirement_type)) {
                return Err(DatabaseError::InvalidState(format!(
                    "a {} cannot be a child of {} ({})",
                    new.requirement_type, p.key, p.requirement_type
                )));
            }
        }

        let component_id = match (new.component_key.as_deref(), parent.as_ref()) {
            (Some(key), _) => {
                find_component(conn, &project.id, key)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("component", key))?
                    .id
            }
            (None, Some(p)) => p.component_id.clone(),
            (None, None) => {
                return Err(DatabaseError::InvalidState(
                    "a requirement without a parent needs a component".into(),
                ));
            }
        };

        let key = match new.key.as_deref() {
            Some(key) => {
                if key_exists(conn, &project.id, key).await? {
                    return Err(DatabaseError::Conflict(format!(
                        "requirement key {key} already exists in {}",
                        project.key
                    )));
                }
                key.to_string()
            }
            None => {
                self.next_free_key(
                    conn,
                    &project.id,
                    &component_id,
                    new.requirement_type,
                    parent.as_ref(),
                )
                .await?
            }
        };

        let parent_id = parent.map(|p| p.id);
        let position = next_position(
            conn,
            &project.id,
            &component_id,
            parent_id.as_deref(),
            new.requirement_type,
        )
        .await?;

        let now = Utc::now();
        let requirement = Requirement {
            id: self.new_id(PREFIX_REQUIREMENT),
            project_id: project.id.clone(),
            component_id,
            parent_id,
            key,
            requirement_type: new.requirement_type,
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            priority: new.priority.clone(),
            status: new.status.clone(),
            acceptance_criteria: new.acceptance_criteria.clone(),
            position,
            created_at: now,
            updated_at: now,
        };
        insert_requirement(conn, &requirement).await?;

        let stored = load_one(conn, &project.id, &requirement.id).await?;
        self.record_change(conn, &project.key, &requirement.id, None, Some(&stored.snapshot))
            .await?;
        Ok(requirement)
    }

    /// Apply a partial update to one requirement.
    ///
    /// An empty update, or one that changes nothing, writes nothing and is
    /// not audited.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project or key.
    pub async fn update_requirement(
        &self,
        project_key: &str,
        key: &str,
        update: &RequirementUpdate,
    ) -> Result<Requirement, DatabaseError> {
        let tx = self.begin().await?;
        let result = self.update_requirement_in(&tx, project_key, key, update).await;
        finish(tx, result, |e| e).await
    }

    async fn update_requirement_in(
        &self,
        conn: &libsql::Connection,
        project_key: &str,
        key: &str,
        update: &RequirementUpdate,
    ) -> Result<Requirement, DatabaseError> {
        let project = require_project(conn, project_key).await?;
        let current = require_requirement(conn, &project.id, key).await?;
        if update.is_empty() {
            return Ok(current);
        }
        let before = load_one(conn, &project.id, &current.id).await?;

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref title) = update.title {
            sets.push(format!("title = ?{idx}"));
            params.push(title.clone().into());
            idx += 1;
        }
        for (column, value) in [
            ("description", &update.description),
            ("category", &update.category),
            ("priority", &update.priority),
            ("status", &update.status),
        ] {
            if let Some(value) = value {
                sets.push(format!("{column} = ?{idx}"));
                params.push(value.clone().map_or(libsql::Value::Null, Into::into));
                idx += 1;
            }
        }
        if let Some(ref criteria) = update.acceptance_criteria {
            sets.push(format!("acceptance_criteria = ?{idx}"));
            params.push(to_json_text(criteria)?.into());
            idx += 1;
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(Utc::now().to_rfc3339().into());
        idx += 1;

        params.push(current.id.clone().into());
        let sql = format!("UPDATE requirements SET {} WHERE id = ?{idx}", sets.join(", "));
        conn.execute(&sql, libsql::params_from_iter(params)).await?;

        let after = load_one(conn, &project.id, &current.id).await?;
        if after.snapshot != before.snapshot {
            self.record_change(
                conn,
                &project.key,
                &current.id,
                Some(&before.snapshot),
                Some(&after.snapshot),
            )
            .await?;
        }
        require_requirement(conn, &project.id, key).await
    }

    /// Delete a requirement and its whole subtree.
    ///
    /// Implementation records and coverage links of removed nodes go with
    /// them; every removed node gets a `deleted` audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project or key.
    pub async fn delete_requirement(
        &self,
        project_key: &str,
        key: &str,
    ) -> Result<DeleteResponse, DatabaseError> {
        let tx = self.begin().await?;
        let result = self.delete_requirement_in(&tx, project_key, key).await;
        let response = finish(tx, result, |e| e).await?;
        tracing::info!(
            project = project_key,
            key,
            removed = response.deleted_keys.len(),
            "requirement deleted"
        );
        Ok(response)
    }

    async fn delete_requirement_in(
        &self,
        conn: &libsql::Connection,
        project_key: &str,
        key: &str,
    ) -> Result<DeleteResponse, DatabaseError> {
        let project = require_project(conn, project_key).await?;
        let root = require_requirement(conn, &project.id, key).await?;
        let ids = subtree_ids(conn, &root.id).await?;
        let mut nodes = load_nodes(conn, &project.id, Some(&ids)).await?;
        nodes.sort_by_key(|n| ids.iter().position(|id| *id == n.id));

        for node in &nodes {
            self.record_change(conn, &project.key, &node.id, Some(&node.snapshot), None)
                .await?;
        }
        conn.execute("DELETE FROM requirements WHERE id = ?1", [root.id.as_str()])
            .await?;
        Ok(DeleteResponse {
            deleted_keys: nodes.into_iter().map(|n| n.snapshot.key).collect(),
        })
    }

    /// Look up one requirement by key.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project or key.
    pub async fn get_requirement(
        &self,
        project_key: &str,
        key: &str,
    ) -> Result<Requirement, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        require_requirement(conn, &project.id, key).await
    }

    /// Requirements of a project in insertion order, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project.
    pub async fn list_requirements(
        &self,
        project_key: &str,
        requirement_type: Option<RequirementType>,
    ) -> Result<Vec<Requirement>, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        match requirement_type {
            Some(t) => {
                query_requirements(
                    conn,
                    &format!(
                        "SELECT {SELECT_COLS} FROM requirements
                         WHERE project_id = ?1 AND requirement_type = ?2 ORDER BY rowid"
                    ),
                    [project.id.as_str(), t.as_str()],
                )
                .await
            }
            None => {
                query_requirements(
                    conn,
                    &format!(
                        "SELECT {SELECT_COLS} FROM requirements WHERE project_id = ?1 ORDER BY rowid"
                    ),
                    [project.id.as_str()],
                )
                .await
            }
        }
    }

    /// Direct children of a requirement in sibling order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project or key.
    pub async fn child_requirements(
        &self,
        project_key: &str,
        key: &str,
    ) -> Result<Vec<Requirement>, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        let parent = require_requirement(conn, &project.id, key).await?;
        query_requirements(
            conn,
            &format!(
                "SELECT {SELECT_COLS} FROM requirements WHERE parent_id = ?1 ORDER BY position, rowid"
            ),
            [parent.id.as_str()],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{seed_project, test_service};
    use crate::updates::requirement::RequirementUpdateBuilder;
    use crate::repos::audit::AuditFilter;
    use rtm_core::enums::ChangeKind;

    fn scope(title: &str) -> NewRequirement {
        NewRequirement {
            component_key: Some("api".into()),
            ..NewRequirement::new("p1", RequirementType::Scope, title)
        }
    }

    fn child(t: RequirementType, parent: &str, title: &str) -> NewRequirement {
        NewRequirement {
            parent_key: Some(parent.into()),
            ..NewRequirement::new("p1", t, title)
        }
    }

    #[tokio::test]
    async fn create_generates_keys_and_positions() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;

        let s1 = svc.create_requirement(&scope("Accounts")).await.unwrap();
        let s2 = svc.create_requirement(&scope("Billing")).await.unwrap();
        assert_eq!(s1.key, "SCOPE-1");
        assert_eq!(s2.key, "SCOPE-2");
        assert_eq!((s1.position, s2.position), (0, 1));

        let us = svc
            .create_requirement(&child(RequirementType::UserStory, "SCOPE-2", "Invoice"))
            .await
            .unwrap();
        assert_eq!(us.key, "SCOPE-2-US-1");
        assert_eq!(us.component_id, s2.component_id, "component is inherited");

        let ts = svc
            .create_requirement(&child(RequirementType::TechSpec, "SCOPE-2-US-1", "PDF"))
            .await
            .unwrap();
        assert_eq!(ts.key, "SCOPE-2-US-1-TS-1");
        assert_eq!(ts.parent_id.as_deref(), Some(us.id.as_str()));

        let audit = svc
            .query_audit(&AuditFilter {
                project_key: Some("p1".into()),
                change: Some(ChangeKind::Created),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(audit.len(), 4);
    }

    #[tokio::test]
    async fn create_rejects_wrong_parent_type() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        svc.create_requirement(&scope("Accounts")).await.unwrap();

        let err = svc
            .create_requirement(&child(RequirementType::TechSpec, "SCOPE-1", "Bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));

        let mut nested_scope = scope("Nested");
        nested_scope.parent_key = Some("SCOPE-1".into());
        assert!(svc.create_requirement(&nested_scope).await.is_err());
    }

    #[tokio::test]
    async fn create_rejects_missing_references_and_duplicate_keys() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;

        let mut unknown_component = scope("X");
        unknown_component.component_key = Some("web".into());
        let err = svc.create_requirement(&unknown_component).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { entity: "component", .. }));

        let err = svc
            .create_requirement(&child(RequirementType::UserStory, "SCOPE-404", "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { entity: "requirement", .. }));

        let mut explicit = scope("Explicit");
        explicit.key = Some("SCOPE-7".into());
        svc.create_requirement(&explicit).await.unwrap();
        let err = svc.create_requirement(&explicit).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        // Generated keys continue after the explicit one.
        assert_eq!(svc.create_requirement(&scope("Next")).await.unwrap().key, "SCOPE-8");
    }

    #[tokio::test]
    async fn generated_key_skips_keys_taken_by_other_components() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api", "web"]).await;
        svc.create_requirement(&scope("Api scope")).await.unwrap();

        let mut web_scope = scope("Web scope");
        web_scope.component_key = Some("web".into());
        let created = svc.create_requirement(&web_scope).await.unwrap();
        assert_eq!(created.key, "SCOPE-2");
    }

    #[tokio::test]
    async fn update_applies_partial_changes_and_audits_once() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        svc.create_requirement(&scope("Accounts")).await.unwrap();

        let update = RequirementUpdateBuilder::new()
            .title("User accounts")
            .priority(Some("high".into()))
            .acceptance_criteria(vec!["can sign in".into()])
            .build();
        let updated = svc.update_requirement("p1", "SCOPE-1", &update).await.unwrap();
        assert_eq!(updated.title, "User accounts");
        assert_eq!(updated.priority.as_deref(), Some("high"));
        assert_eq!(updated.acceptance_criteria, vec!["can sign in"]);

        // Same values again: no write, no audit.
        svc.update_requirement("p1", "SCOPE-1", &update).await.unwrap();
        let updates = svc
            .query_audit(&AuditFilter {
                change: Some(ChangeKind::Updated),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].old_state.as_ref().unwrap()["title"], "Accounts");
        assert_eq!(updates[0].new_state.as_ref().unwrap()["title"], "User accounts");
    }

    #[tokio::test]
    async fn delete_removes_subtree_and_audits_each_node() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        svc.create_requirement(&scope("Accounts")).await.unwrap();
        svc.create_requirement(&scope("Billing")).await.unwrap();
        svc.create_requirement(&child(RequirementType::UserStory, "SCOPE-1", "Sign up"))
            .await
            .unwrap();
        svc.create_requirement(&child(RequirementType::TechSpec, "SCOPE-1-US-1", "Hash"))
            .await
            .unwrap();

        let response = svc.delete_requirement("p1", "SCOPE-1").await.unwrap();
        assert_eq!(
            response.deleted_keys,
            vec!["SCOPE-1", "SCOPE-1-US-1", "SCOPE-1-US-1-TS-1"]
        );

        let remaining: Vec<_> = svc
            .list_requirements("p1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(remaining, vec!["SCOPE-2"]);

        let deletions = svc
            .query_audit(&AuditFilter {
                change: Some(ChangeKind::Deleted),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(deletions.len(), 3);
    }

    #[tokio::test]
    async fn listing_and_children() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        svc.create_requirement(&scope("Accounts")).await.unwrap();
        svc.create_requirement(&child(RequirementType::UserStory, "SCOPE-1", "A"))
            .await
            .unwrap();
        svc.create_requirement(&child(RequirementType::UserStory, "SCOPE-1", "B"))
            .await
            .unwrap();

        let stories = svc
            .list_requirements("p1", Some(RequirementType::UserStory))
            .await
            .unwrap();
        assert_eq!(stories.len(), 2);

        let titles: Vec<_> = svc
            .child_requirements("p1", "SCOPE-1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);

        let fetched = svc.get_requirement("p1", "SCOPE-1-US-2").await.unwrap();
        assert_eq!(fetched.title, "B");
        assert!(svc.get_requirement("p1", "SCOPE-9").await.is_err());
    }
}
