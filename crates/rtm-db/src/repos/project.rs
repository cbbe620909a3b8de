//! Project repository: upsert on import, lookups, summaries and cascading
//! deletion.

use chrono::Utc;
use rtm_core::document::ProjectSpec;
use rtm_core::entities::Project;
use rtm_core::ids::PREFIX_PROJECT;
use rtm_core::responses::{DeleteResponse, ProjectSummary};

use crate::error::DatabaseError;
use crate::helpers::{get_count, get_opt_string, parse_datetime};
use crate::repos::nodes::load_nodes;
use crate::service::{RtmService, finish};

const SELECT_COLS: &str =
    "id, key, name, description, repository, version, status, created_at, updated_at";

pub(crate) const STATUS_ACTIVE: &str = "active";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        description: get_opt_string(row, 3)?,
        repository: get_opt_string(row, 4)?,
        version: get_opt_string(row, 5)?,
        status: row.get(6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

pub(crate) async fn find_project(
    conn: &libsql::Connection,
    key: &str,
) -> Result<Option<Project>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM projects WHERE key = ?1"),
            [key],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_project(&row)?)),
        None => Ok(None),
    }
}

pub(crate) async fn require_project(
    conn: &libsql::Connection,
    key: &str,
) -> Result<Project, DatabaseError> {
    find_project(conn, key)
        .await?
        .ok_or_else(|| DatabaseError::not_found("project", key))
}

fn differs(project: &Project, spec: &ProjectSpec) -> bool {
    project.name != spec.name
        || project.description != spec.description
        || project.repository != spec.repository
        || project.version != spec.version
}

/// Insert the project, or overwrite its mutable fields when they changed.
/// Returns the stored project and whether a row was written.
pub(crate) async fn upsert_project(
    conn: &libsql::Connection,
    new_id: String,
    spec: &ProjectSpec,
) -> Result<(Project, bool), DatabaseError> {
    let now = Utc::now();
    match find_project(conn, &spec.key).await? {
        Some(existing) if !differs(&existing, spec) => Ok((existing, false)),
        Some(existing) => {
            conn.execute(
                "UPDATE projects SET name = ?1, description = ?2, repository = ?3, version = ?4,
                 updated_at = ?5 WHERE id = ?6",
                libsql::params![
                    spec.name.as_str(),
                    spec.description.as_deref(),
                    spec.repository.as_deref(),
                    spec.version.as_deref(),
                    now.to_rfc3339(),
                    existing.id.as_str()
                ],
            )
            .await?;
            Ok((
                Project {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    repository: spec.repository.clone(),
                    version: spec.version.clone(),
                    updated_at: now,
                    ..existing
                },
                true,
            ))
        }
        None => {
            let project = Project {
                id: new_id,
                key: spec.key.clone(),
                name: spec.name.clone(),
                description: spec.description.clone(),
                repository: spec.repository.clone(),
                version: spec.version.clone(),
                status: STATUS_ACTIVE.to_string(),
                created_at: now,
                updated_at: now,
            };
            conn.execute(
                &format!(
                    "INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                libsql::params![
                    project.id.as_str(),
                    project.key.as_str(),
                    project.name.as_str(),
                    project.description.as_deref(),
                    project.repository.as_deref(),
                    project.version.as_deref(),
                    project.status.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            Ok((project, true))
        }
    }
}

async fn summarize(
    conn: &libsql::Connection,
    project: Project,
) -> Result<ProjectSummary, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT
                (SELECT COUNT(*) FROM components WHERE project_id = ?1),
                (SELECT COUNT(*) FROM requirements WHERE project_id = ?1 AND requirement_type = 'SCOPE'),
                (SELECT COUNT(*) FROM requirements WHERE project_id = ?1 AND requirement_type = 'USER_STORY'),
                (SELECT COUNT(*) FROM requirements WHERE project_id = ?1 AND requirement_type = 'TECH_SPEC'),
                (SELECT COUNT(*) FROM implementations i
                    JOIN requirements r ON r.id = i.requirement_id WHERE r.project_id = ?1),
                (SELECT COUNT(*) FROM test_cases c
                    JOIN test_files f ON f.id = c.test_file_id WHERE f.project_id = ?1),
                (SELECT COUNT(*) FROM coverage_links l
                    JOIN requirements r ON r.id = l.requirement_id WHERE r.project_id = ?1)",
            [project.id.as_str()],
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(ProjectSummary {
        components: get_count(&row, 0)?,
        scopes: get_count(&row, 1)?,
        user_stories: get_count(&row, 2)?,
        tech_specs: get_count(&row, 3)?,
        implementations: get_count(&row, 4)?,
        test_cases: get_count(&row, 5)?,
        coverage_links: get_count(&row, 6)?,
        project,
    })
}

impl RtmService {
    /// Look up a project by key.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no project has this key.
    pub async fn get_project(&self, key: &str) -> Result<Project, DatabaseError> {
        require_project(self.db().conn(), key).await
    }

    /// Every project with its row counts, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, DatabaseError> {
        let conn = self.db().conn();
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects ORDER BY key"),
                (),
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        let mut summaries = Vec::with_capacity(projects.len());
        for project in projects {
            summaries.push(summarize(conn, project).await?);
        }
        Ok(summaries)
    }

    /// Row counts for one project.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no project has this key.
    pub async fn project_summary(&self, key: &str) -> Result<ProjectSummary, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, key).await?;
        summarize(conn, project).await
    }

    /// Delete a project and everything under it.
    ///
    /// Every removed requirement gets a `deleted` audit entry; audit entries
    /// themselves are kept.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no project has this key, or any
    /// storage error (in which case nothing is deleted).
    pub async fn delete_project(&self, key: &str) -> Result<DeleteResponse, DatabaseError> {
        let tx = self.begin().await?;
        let result = self.delete_project_in(&tx, key).await;
        let response = finish(tx, result, |e| e).await?;
        tracing::info!(
            project = key,
            requirements = response.deleted_keys.len(),
            "project deleted"
        );
        Ok(response)
    }

    async fn delete_project_in(
        &self,
        conn: &libsql::Connection,
        key: &str,
    ) -> Result<DeleteResponse, DatabaseError> {
        let project = require_project(conn, key).await?;
        let nodes = load_nodes(conn, &project.id, None).await?;
        for node in &nodes {
            self.record_change(conn, &project.key, &node.id, Some(&node.snapshot), None)
                .await?;
        }
        conn.execute("DELETE FROM projects WHERE id = ?1", [project.id.as_str()])
            .await?;
        Ok(DeleteResponse {
            deleted_keys: nodes.into_iter().map(|n| n.snapshot.key).collect(),
        })
    }

    pub(crate) fn new_project_id(&self) -> String {
        self.new_id(PREFIX_PROJECT)
    }
}
