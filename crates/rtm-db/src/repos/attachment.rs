//! Implementation records and test coverage attached to requirement nodes.
//!
//! Attachments are always written as a whole: clear, then insert in the order
//! the node lists them. Test files and test cases are shared project-wide, so
//! they are upserted and only the coverage links belong to a node.

use rtm_core::document::tree::{ImplementationRef, NodeSpec, TestCaseRef};
use rtm_core::entities::{ImplementationRecord, TestCase, TestFile};
use rtm_core::ids::{PREFIX_IMPLEMENTATION, PREFIX_TEST_CASE, PREFIX_TEST_FILE};

use crate::error::DatabaseError;
use crate::helpers::{parse_enum, parse_string_list, to_json_text};
use crate::repos::project::require_project;
use crate::repos::requirement::require_requirement;
use crate::service::RtmService;

/// Remove implementation records and coverage links of one node.
pub(crate) async fn clear_attachments(
    conn: &libsql::Connection,
    requirement_id: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM implementations WHERE requirement_id = ?1",
        [requirement_id],
    )
    .await?;
    conn.execute(
        "DELETE FROM coverage_links WHERE requirement_id = ?1",
        [requirement_id],
    )
    .await?;
    Ok(())
}

async fn returned_id(mut rows: libsql::Rows) -> Result<String, DatabaseError> {
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<String>(0)?)
}

impl RtmService {
    /// Write the attachments of `node` for `requirement_id`.
    ///
    /// Returns the number of implementation records and coverage links written.
    pub(crate) async fn write_attachments(
        &self,
        conn: &libsql::Connection,
        project_id: &str,
        requirement_id: &str,
        node: &NodeSpec,
    ) -> Result<(u32, u32), DatabaseError> {
        let mut implementations = 0;
        for (position, imp) in (0_i64..).zip(&node.implementations) {
            self.insert_implementation(conn, requirement_id, imp, position)
                .await?;
            implementations += 1;
        }

        let mut links = 0;
        for (position, test) in (0_i64..).zip(&node.tests) {
            let test_case_id = self.upsert_test_case(conn, project_id, test).await?;
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO coverage_links (requirement_id, test_case_id, position)
                     VALUES (?1, ?2, ?3)",
                    libsql::params![requirement_id, test_case_id.as_str(), position],
                )
                .await?;
            links += u32::try_from(inserted).unwrap_or(0);
        }
        Ok((implementations, links))
    }

    async fn insert_implementation(
        &self,
        conn: &libsql::Connection,
        requirement_id: &str,
        imp: &ImplementationRef,
        position: i64,
    ) -> Result<(), DatabaseError> {
        conn.execute(
            "INSERT INTO implementations (id, requirement_id, layer, file_path, functions, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                self.new_id(PREFIX_IMPLEMENTATION),
                requirement_id,
                imp.layer.as_str(),
                imp.file_path.as_str(),
                to_json_text(&imp.functions)?,
                position
            ],
        )
        .await?;
        Ok(())
    }

    /// Upsert the test file and test case behind `test`, returning the case id.
    ///
    /// A file path identifies one test file per project; the most recent
    /// writer decides its layer and type.
    async fn upsert_test_case(
        &self,
        conn: &libsql::Connection,
        project_id: &str,
        test: &TestCaseRef,
    ) -> Result<String, DatabaseError> {
        let file_rows = conn
            .query(
                "INSERT INTO test_files (id, project_id, file_path, layer, test_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(project_id, file_path)
                 DO UPDATE SET layer = excluded.layer, test_type = excluded.test_type
                 RETURNING id",
                libsql::params![
                    self.new_id(PREFIX_TEST_FILE),
                    project_id,
                    test.file.as_str(),
                    test.layer.as_str(),
                    test.test_type.as_str()
                ],
            )
            .await?;
        let test_file_id = returned_id(file_rows).await?;

        let case_rows = conn
            .query(
                "INSERT INTO test_cases (id, test_file_id, name, test_type)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(test_file_id, name) DO UPDATE SET test_type = excluded.test_type
                 RETURNING id",
                libsql::params![
                    self.new_id(PREFIX_TEST_CASE),
                    test_file_id.as_str(),
                    test.name.as_str(),
                    test.test_type.as_str()
                ],
            )
            .await?;
        returned_id(case_rows).await
    }

    /// Implementation records of one requirement in attachment order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project or key.
    pub async fn list_implementations(
        &self,
        project_key: &str,
        key: &str,
    ) -> Result<Vec<ImplementationRecord>, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        let requirement = require_requirement(conn, &project.id, key).await?;
        let mut rows = conn
            .query(
                "SELECT id, requirement_id, layer, file_path, functions, position
                 FROM implementations WHERE requirement_id = ?1 ORDER BY position, rowid",
                [requirement.id.as_str()],
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(ImplementationRecord {
                id: row.get(0)?,
                requirement_id: row.get(1)?,
                layer: parse_enum(&row.get::<String>(2)?)?,
                file_path: row.get(3)?,
                functions: parse_string_list(&row.get::<String>(4)?)?,
                position: row.get(5)?,
            });
        }
        Ok(records)
    }

    /// Test files of a project with their cases, ordered by file path.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project.
    pub async fn list_test_files(
        &self,
        project_key: &str,
    ) -> Result<Vec<(TestFile, Vec<TestCase>)>, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;
        let mut rows = conn
            .query(
                "SELECT f.id, f.project_id, f.file_path, f.layer, f.test_type,
                        c.id, c.test_file_id, c.name, c.test_type
                 FROM test_files f
                 LEFT JOIN test_cases c ON c.test_file_id = f.id
                 WHERE f.project_id = ?1
                 ORDER BY f.file_path, c.rowid",
                [project.id.as_str()],
            )
            .await?;

        let mut files: Vec<(TestFile, Vec<TestCase>)> = Vec::new();
        while let Some(row) = rows.next().await? {
            let file_id: String = row.get(0)?;
            if files.last().is_none_or(|(f, _)| f.id != file_id) {
                files.push((
                    TestFile {
                        id: file_id,
                        project_id: row.get(1)?,
                        file_path: row.get(2)?,
                        layer: parse_enum(&row.get::<String>(3)?)?,
                        test_type: parse_enum(&row.get::<String>(4)?)?,
                    },
                    Vec::new(),
                ));
            }
            if let Some(case_id) = row.get::<Option<String>>(5)? {
                if let Some((_, cases)) = files.last_mut() {
                    cases.push(TestCase {
                        id: case_id,
                        test_file_id: row.get(6)?,
                        name: row.get(7)?,
                        test_type: parse_enum(&row.get::<String>(8)?)?,
                    });
                }
            }
        }
        Ok(files)
    }
}
