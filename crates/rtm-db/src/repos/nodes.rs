//! Loads stored requirement nodes as [`RequirementSnapshot`]s.
//!
//! Three queries per call (nodes, implementations, coverage) joined in memory
//! by requirement id. Snapshots carry component and parent *keys*, so they
//! compare directly against snapshots built from an incoming document.

use std::collections::HashMap;

use rtm_core::document::tree::{ImplementationRef, TestCaseRef};
use rtm_core::snapshot::RequirementSnapshot;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_enum, parse_string_list, placeholders};

/// A stored node with its row identifiers and comparable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub snapshot: RequirementSnapshot,
}

/// `AND <column> IN (...)` with parameters numbered after `?1`.
fn id_filter(column: &str, only: Option<&[String]>) -> (String, Vec<libsql::Value>) {
    match only {
        Some(ids) => (
            format!(" AND {column} IN ({})", placeholders(2, ids.len())),
            ids.iter().cloned().map(libsql::Value::Text).collect(),
        ),
        None => (String::new(), Vec::new()),
    }
}

fn params(project_id: &str, extra: &[libsql::Value]) -> Vec<libsql::Value> {
    let mut params = Vec::with_capacity(extra.len() + 1);
    params.push(libsql::Value::Text(project_id.to_string()));
    params.extend_from_slice(extra);
    params
}

/// Load nodes of a project in insertion order, optionally restricted to `only`.
pub(crate) async fn load_nodes(
    conn: &libsql::Connection,
    project_id: &str,
    only: Option<&[String]>,
) -> Result<Vec<StoredNode>, DatabaseError> {
    if only.is_some_and(<[String]>::is_empty) {
        return Ok(Vec::new());
    }

    let (filter, extra) = id_filter("r.id", only);
    let mut rows = conn
        .query(
            &format!(
                "SELECT r.id, r.parent_id, r.key, r.requirement_type, c.key, p.key, r.title,
                        r.description, r.category, r.priority, r.status,
                        r.acceptance_criteria, r.position
                 FROM requirements r
                 JOIN components c ON c.id = r.component_id
                 LEFT JOIN requirements p ON p.id = r.parent_id
                 WHERE r.project_id = ?1{filter}
                 ORDER BY r.rowid"
            ),
            libsql::params_from_iter(params(project_id, &extra)),
        )
        .await?;

    let mut nodes = Vec::new();
    while let Some(row) = rows.next().await? {
        nodes.push(StoredNode {
            id: row.get(0)?,
            parent_id: get_opt_string(&row, 1)?,
            snapshot: RequirementSnapshot {
                key: row.get(2)?,
                requirement_type: parse_enum(&row.get::<String>(3)?)?,
                component_key: row.get(4)?,
                parent_key: get_opt_string(&row, 5)?,
                title: row.get(6)?,
                description: get_opt_string(&row, 7)?,
                category: get_opt_string(&row, 8)?,
                priority: get_opt_string(&row, 9)?,
                status: get_opt_string(&row, 10)?,
                acceptance_criteria: parse_string_list(&row.get::<String>(11)?)?,
                position: row.get(12)?,
                implementations: Vec::new(),
                tests: Vec::new(),
            },
        });
    }

    let mut implementations = load_implementations(conn, project_id, only).await?;
    let mut tests = load_tests(conn, project_id, only).await?;
    for node in &mut nodes {
        node.snapshot.implementations = implementations.remove(&node.id).unwrap_or_default();
        node.snapshot.tests = tests.remove(&node.id).unwrap_or_default();
    }
    Ok(nodes)
}

async fn load_implementations(
    conn: &libsql::Connection,
    project_id: &str,
    only: Option<&[String]>,
) -> Result<HashMap<String, Vec<ImplementationRef>>, DatabaseError> {
    let (filter, extra) = id_filter("i.requirement_id", only);
    let mut rows = conn
        .query(
            &format!(
                "SELECT i.requirement_id, i.layer, i.file_path, i.functions
                 FROM implementations i
                 JOIN requirements r ON r.id = i.requirement_id
                 WHERE r.project_id = ?1{filter}
                 ORDER BY i.position, i.rowid"
            ),
            libsql::params_from_iter(params(project_id, &extra)),
        )
        .await?;

    let mut by_node: HashMap<String, Vec<ImplementationRef>> = HashMap::new();
    while let Some(row) = rows.next().await? {
        by_node
            .entry(row.get::<String>(0)?)
            .or_default()
            .push(ImplementationRef {
                layer: parse_enum(&row.get::<String>(1)?)?,
                file_path: row.get(2)?,
                functions: parse_string_list(&row.get::<String>(3)?)?,
            });
    }
    Ok(by_node)
}

async fn load_tests(
    conn: &libsql::Connection,
    project_id: &str,
    only: Option<&[String]>,
) -> Result<HashMap<String, Vec<TestCaseRef>>, DatabaseError> {
    let (filter, extra) = id_filter("l.requirement_id", only);
    let mut rows = conn
        .query(
            &format!(
                "SELECT l.requirement_id, f.layer, f.file_path, f.test_type, c.name
                 FROM coverage_links l
                 JOIN test_cases c ON c.id = l.test_case_id
                 JOIN test_files f ON f.id = c.test_file_id
                 JOIN requirements r ON r.id = l.requirement_id
                 WHERE r.project_id = ?1{filter}
                 ORDER BY l.position, l.rowid"
            ),
            libsql::params_from_iter(params(project_id, &extra)),
        )
        .await?;

    let mut by_node: HashMap<String, Vec<TestCaseRef>> = HashMap::new();
    while let Some(row) = rows.next().await? {
        by_node
            .entry(row.get::<String>(0)?)
            .or_default()
            .push(TestCaseRef {
                layer: parse_enum(&row.get::<String>(1)?)?,
                file: row.get(2)?,
                test_type: parse_enum(&row.get::<String>(3)?)?,
                name: row.get(4)?,
            });
    }
    Ok(by_node)
}
