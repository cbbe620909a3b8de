//! API endpoint repository. An endpoint is identified by (method, path) within
//! a project; re-importing an existing one leaves it untouched.

use rtm_core::document::ApiEndpointSpec;
use rtm_core::entities::ApiEndpoint;
use rtm_core::ids::PREFIX_API_ENDPOINT;

use crate::error::DatabaseError;
use crate::helpers::get_opt_string;
use crate::repos::project::require_project;
use crate::service::RtmService;

const SELECT_COLS: &str = "id, project_id, method, path, handler, description";

fn row_to_api_endpoint(row: &libsql::Row) -> Result<ApiEndpoint, DatabaseError> {
    Ok(ApiEndpoint {
        id: row.get(0)?,
        project_id: row.get(1)?,
        method: row.get(2)?,
        path: row.get(3)?,
        handler: get_opt_string(row, 4)?,
        description: get_opt_string(row, 5)?,
    })
}

/// Endpoints of a project in declaration order.
pub(crate) async fn list_api_endpoints_in(
    conn: &libsql::Connection,
    project_id: &str,
) -> Result<Vec<ApiEndpoint>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM api_endpoints WHERE project_id = ?1 ORDER BY rowid"),
            [project_id],
        )
        .await?;
    let mut endpoints = Vec::new();
    while let Some(row) = rows.next().await? {
        endpoints.push(row_to_api_endpoint(&row)?);
    }
    Ok(endpoints)
}

impl RtmService {
    /// Insert an endpoint unless (method, path) is already stored for the
    /// project. Returns whether a row was inserted.
    pub(crate) async fn insert_api_endpoint(
        &self,
        conn: &libsql::Connection,
        project_id: &str,
        spec: &ApiEndpointSpec,
    ) -> Result<bool, DatabaseError> {
        let inserted = conn
            .execute(
                &format!(
                    "INSERT INTO api_endpoints ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(project_id, method, path) DO NOTHING"
                ),
                libsql::params![
                    self.new_id(PREFIX_API_ENDPOINT),
                    project_id,
                    spec.method.as_str(),
                    spec.path.as_str(),
                    spec.handler.as_deref(),
                    spec.description.as_deref()
                ],
            )
            .await?;
        Ok(inserted > 0)
    }

    /// Endpoints of a project in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the project does not exist.
    pub async fn list_api_endpoints(
        &self,
        project_key: &str,
    ) -> Result<Vec<ApiEndpoint>, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        list_api_endpoints_in(conn, &project.id).await
    }
}
