//! Component repository. Components are inserted on first reference and
//! never updated by reconciliation: the first declaration of a key wins.

use std::collections::HashMap;

use chrono::Utc;
use rtm_core::document::ComponentSpec;
use rtm_core::entities::Component;
use rtm_core::ids::PREFIX_COMPONENT;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::repos::project::require_project;
use crate::service::RtmService;

const SELECT_COLS: &str =
    "id, project_id, key, name, component_type, technology, description, created_at";

fn row_to_component(row: &libsql::Row) -> Result<Component, DatabaseError> {
    Ok(Component {
        id: row.get(0)?,
        project_id: row.get(1)?,
        key: row.get(2)?,
        name: row.get(3)?,
        component_type: row.get(4)?,
        technology: get_opt_string(row, 5)?,
        description: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

/// Insert the component unless the project already has one with this key.
/// Returns whether a row was inserted.
pub(crate) async fn insert_component_if_missing(
    conn: &libsql::Connection,
    new_id: &str,
    project_id: &str,
    spec: &ComponentSpec,
) -> Result<bool, DatabaseError> {
    let inserted = conn
        .execute(
            &format!(
                "INSERT INTO components ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(project_id, key) DO NOTHING"
            ),
            libsql::params![
                new_id,
                project_id,
                spec.key.as_str(),
                spec.name.as_str(),
                spec.component_type.as_str(),
                spec.technology.as_deref(),
                spec.description.as_deref(),
                Utc::now().to_rfc3339()
            ],
        )
        .await?;
    Ok(inserted > 0)
}

/// Components of a project in declaration order.
pub(crate) async fn list_components_in(
    conn: &libsql::Connection,
    project_id: &str,
) -> Result<Vec<Component>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM components WHERE project_id = ?1 ORDER BY rowid"),
            [project_id],
        )
        .await?;
    let mut components = Vec::new();
    while let Some(row) = rows.next().await? {
        components.push(row_to_component(&row)?);
    }
    Ok(components)
}

/// Component key → id for a project.
pub(crate) async fn component_ids(
    conn: &libsql::Connection,
    project_id: &str,
) -> Result<HashMap<String, String>, DatabaseError> {
    Ok(list_components_in(conn, project_id)
        .await?
        .into_iter()
        .map(|c| (c.key, c.id))
        .collect())
}

pub(crate) async fn find_component(
    conn: &libsql::Connection,
    project_id: &str,
    key: &str,
) -> Result<Option<Component>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM components WHERE project_id = ?1 AND key = ?2"),
            [project_id, key],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_component(&row)?)),
        None => Ok(None),
    }
}

impl RtmService {
    /// Components of a project in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the project does not exist.
    pub async fn list_components(&self, project_key: &str) -> Result<Vec<Component>, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        list_components_in(conn, &project.id).await
    }

    pub(crate) fn new_component_id(&self) -> String {
        self.new_id(PREFIX_COMPONENT)
    }
}
