//! Shared fixtures for rtm-db integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rtm_core::document::{DocumentFormat, RtmDocument};
use rtm_core::ids::SequentialIds;
use rtm_db::RtmDb;
use rtm_db::service::RtmService;

pub async fn test_service() -> RtmService {
    let db = RtmDb::open_local(":memory:").await.unwrap();
    RtmService::from_db(db, Arc::new(SequentialIds::default()))
}

pub fn json(text: &str) -> RtmDocument {
    RtmDocument::parse(text, DocumentFormat::Json).unwrap()
}

pub fn yaml(text: &str) -> RtmDocument {
    RtmDocument::parse(text, DocumentFormat::Yaml).unwrap()
}

/// Row counts of every table, in schema order.
pub async fn table_counts(svc: &RtmService) -> Vec<(&'static str, i64)> {
    let tables = [
        "projects",
        "components",
        "requirements",
        "implementations",
        "test_files",
        "test_cases",
        "coverage_links",
        "api_endpoints",
        "audit_entries",
    ];
    let mut counts = Vec::new();
    for table in tables {
        let mut rows = svc
            .db()
            .conn()
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        counts.push((table, row.get::<i64>(0).unwrap()));
    }
    counts
}

/// Every column of every requirement row, ordered by key.
pub async fn requirement_rows(svc: &RtmService) -> Vec<Vec<String>> {
    let mut rows = svc
        .db()
        .conn()
        .query(
            "SELECT id, key, requirement_type, COALESCE(parent_id, ''), component_id, title,
                    COALESCE(description, ''), acceptance_criteria, position, updated_at
             FROM requirements ORDER BY key",
            (),
        )
        .await
        .unwrap();
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.unwrap() {
        let mut cols = Vec::new();
        for i in 0..10 {
            let value = match row.get_value(i).unwrap() {
                libsql::Value::Integer(n) => n.to_string(),
                libsql::Value::Text(s) => s,
                other => format!("{other:?}"),
            };
            cols.push(value);
        }
        out.push(cols);
    }
    out
}

/// The scenario document: one component, a three-level chain with
/// implementation and coverage at each level, and two API endpoints.
pub const SHOP: &str = r#"{
    "metadata": {"generated_by": "hand", "project": {"key": "p1", "name": "Project One"}},
    "components": [
        {"key": "api", "name": "API", "type": "service", "technology": "rust"}
    ],
    "requirements": [
        {
            "key": "SCOPE-1", "type": "SCOPE", "component_key": "api",
            "title": "Accounts", "priority": "high",
            "acceptance_criteria": ["users can register", "users can sign in"],
            "children": [
                {
                    "key": "SCOPE-1-US-1", "type": "USER_STORY", "title": "Registration",
                    "implementation": {
                        "backend": {"files": [{"path": "src/register.rs", "functions": ["register"]}]},
                        "database": {"files": [{"path": "migrations/001_users.sql", "functions": []}]}
                    },
                    "test_coverage": {
                        "backend": [
                            {"file": "tests/register.rs", "functions": ["registers", "rejects_duplicates"], "type": "integration"}
                        ]
                    },
                    "children": [
                        {
                            "key": "SCOPE-1-US-1-TS-1", "type": "TECH_SPEC", "title": "Hash passwords",
                            "implementation": {"backend": {"files": [{"path": "src/hash.rs", "functions": ["hash", "verify"]}]}},
                            "tests": {"backend": [{"file": "src/hash.rs", "functions": ["hash_roundtrip"]}]}
                        }
                    ]
                }
            ]
        }
    ],
    "api_endpoints": [
        {"method": "POST", "path": "/users", "handler": "register"},
        {"method": "POST", "path": "/sessions", "handler": "sign_in"}
    ]
}"#;
