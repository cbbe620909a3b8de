//! Store-level properties across operations
//!
//! - Overwrite leaves only the new document's tree
//! - Update leaves nodes absent from the document alone
//! - Generated keys increase without gaps
//! - Subtree deletion cascades but keeps audit history
//! - Rejected imports leave no trace

mod common;

use pretty_assertions::assert_eq;

use common::{SHOP, json, table_counts, test_service};
use rtm_core::enums::{ChangeKind, ReconcileMode, RequirementType};
use rtm_core::keys::numeric_suffix;
use rtm_db::error::ReconcileError;
use rtm_db::repos::audit::AuditFilter;
use rtm_db::repos::requirement::NewRequirement;

const OTHER: &str = r#"{
    "project": {"key": "p1", "name": "Project One"},
    "components": [{"key": "web", "name": "Web", "type": "frontend"}],
    "requirements": [
        {"key": "SCOPE-9", "type": "SCOPE", "component_key": "web", "title": "Checkout"},
        {"key": "SCOPE-9-US-1", "type": "USER_STORY", "parent": "SCOPE-9", "title": "Pay"}
    ]
}"#;

async fn keys(svc: &rtm_db::service::RtmService) -> Vec<String> {
    svc.list_requirements("p1", None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.key)
        .collect()
}

// ---------------------------------------------------------------------------
// Overwrite / update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overwrite_keeps_only_the_new_tree() {
    let svc = test_service().await;
    svc.reconcile(&json(SHOP), None, ReconcileMode::Update)
        .await
        .unwrap();
    let summary = svc
        .reconcile(&json(OTHER), None, ReconcileMode::Overwrite)
        .await
        .unwrap();
    assert_eq!((summary.deleted, summary.created), (3, 2));

    assert_eq!(keys(&svc).await, vec!["SCOPE-9", "SCOPE-9-US-1"]);
    let components: Vec<_> = svc
        .list_components("p1")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.key)
        .collect();
    assert_eq!(components, vec!["web"]);
    assert!(svc.list_api_endpoints("p1").await.unwrap().is_empty());
    assert!(svc.list_test_files("p1").await.unwrap().is_empty());

    let deleted = svc
        .query_audit(&AuditFilter {
            change: Some(ChangeKind::Deleted),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(deleted.len(), 3);
    assert!(deleted.iter().all(|e| e.new_state.is_none() && e.old_state.is_some()));
}

#[tokio::test]
async fn update_leaves_absent_nodes_alone() {
    let svc = test_service().await;
    svc.reconcile(&json(SHOP), None, ReconcileMode::Update)
        .await
        .unwrap();
    let before = svc.get_requirement("p1", "SCOPE-1-US-1").await.unwrap();

    let summary = svc
        .reconcile(&json(OTHER), None, ReconcileMode::Update)
        .await
        .unwrap();
    assert_eq!((summary.created, summary.deleted), (2, 0));

    assert_eq!(keys(&svc).await.len(), 5);
    let after = svc.get_requirement("p1", "SCOPE-1-US-1").await.unwrap();
    assert_eq!(after, before);
    assert_eq!(
        svc.list_implementations("p1", "SCOPE-1-US-1").await.unwrap().len(),
        2
    );
    assert_eq!(svc.list_components("p1").await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generated_scope_keys_are_gapless() {
    let svc = test_service().await;
    svc.reconcile(&json(SHOP), None, ReconcileMode::Update)
        .await
        .unwrap();

    let mut numbers = Vec::new();
    for i in 0..11 {
        let new = NewRequirement {
            component_key: Some("api".into()),
            ..NewRequirement::new("p1", RequirementType::Scope, format!("scope {i}"))
        };
        let created = svc.create_requirement(&new).await.unwrap();
        numbers.push(numeric_suffix(&created.key).unwrap());
    }
    assert_eq!(numbers, (2..=12).collect::<Vec<u64>>());

    let next = svc
        .generate_key("p1", Some("api"), RequirementType::Scope, None)
        .await
        .unwrap();
    assert_eq!(next.key, "SCOPE-13");
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleting_a_scope_cascades_and_keeps_audit() {
    let svc = test_service().await;
    svc.reconcile(&json(SHOP), None, ReconcileMode::Update)
        .await
        .unwrap();
    let audit_before = svc.count_audit("p1").await.unwrap();

    let response = svc.delete_requirement("p1", "SCOPE-1").await.unwrap();
    assert_eq!(response.deleted_keys.len(), 3);

    let counts = table_counts(&svc).await;
    let count = |table: &str| counts.iter().find(|(t, _)| *t == table).unwrap().1;
    assert_eq!(count("requirements"), 0);
    assert_eq!(count("implementations"), 0);
    assert_eq!(count("coverage_links"), 0);
    assert_eq!(count("components"), 1, "components are not owned by nodes");
    assert_eq!(
        i64::from(svc.count_audit("p1").await.unwrap()),
        i64::from(audit_before) + 3
    );

    let history = svc
        .query_audit(&AuditFilter {
            requirement_key: Some("SCOPE-1-US-1-TS-1".into()),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    let changes: Vec<_> = history.iter().map(|e| e.change).collect();
    assert_eq!(changes, vec![ChangeKind::Deleted, ChangeKind::Created]);
}

#[tokio::test]
async fn deleting_a_project_removes_everything_but_audit() {
    let svc = test_service().await;
    svc.reconcile(&json(SHOP), None, ReconcileMode::Update)
        .await
        .unwrap();
    svc.delete_project("p1").await.unwrap();

    for (table, count) in table_counts(&svc).await {
        if table == "audit_entries" {
            assert_eq!(count, 6);
        } else {
            assert_eq!(count, 0, "{table} should be empty");
        }
    }
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undeclared_component_leaves_store_untouched() {
    let svc = test_service().await;
    svc.reconcile(&json(SHOP), None, ReconcileMode::Update)
        .await
        .unwrap();
    let counts = table_counts(&svc).await;

    let bad = SHOP
        .replace("\"title\": \"Registration\"", "\"title\": \"Sign up\"")
        .replace(
            "\"key\": \"SCOPE-1-US-1-TS-1\",",
            "\"key\": \"SCOPE-1-US-1-TS-1\", \"component_key\": \"db\",",
        );
    for mode in [ReconcileMode::Update, ReconcileMode::Overwrite] {
        let err = svc.reconcile(&json(&bad), None, mode).await.unwrap_err();
        assert!(
            matches!(err, ReconcileError::UnknownComponent { ref component, .. } if component == "db"),
            "{err}"
        );
        assert_eq!(err.requirement_key(), Some("SCOPE-1-US-1-TS-1"));
        assert_eq!(table_counts(&svc).await, counts, "{mode} import must roll back");
    }
    assert_eq!(
        svc.get_requirement("p1", "SCOPE-1-US-1").await.unwrap().title,
        "Registration"
    );
}
