//! Store-backed key generation.
//!
//! [`rtm_core::keys::next_key`] does the numbering; this module supplies the
//! sibling set from the store and skips any candidate already used elsewhere in
//! the project, since keys are unique per project while numbering is per
//! sibling group.

use rtm_core::entities::Requirement;
use rtm_core::enums::RequirementType;
use rtm_core::keys::{key_prefix, next_key};
use rtm_core::responses::NextKeyResponse;

use crate::error::DatabaseError;
use crate::repos::component::find_component;
use crate::repos::project::require_project;
use crate::repos::requirement::{key_exists, require_requirement, sibling_keys};
use crate::service::RtmService;

/// Candidates tried before giving up on a sibling group whose next numbers are
/// all taken elsewhere in the project.
const MAX_KEY_ATTEMPTS: usize = 1024;

impl RtmService {
    /// Next free key for a new node, without creating it.
    ///
    /// A `Scope` is numbered within `component_key`; a `UserStory` or
    /// `TechSpec` within `parent_key`, whose type must match.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::NotFound` for an unknown project, component or parent.
    /// - `DatabaseError::InvalidState` when a scope has no component, a child
    ///   type has no parent, the parent has the wrong type, or the sibling
    ///   numbering has no free key left.
    pub async fn generate_key(
        &self,
        project_key: &str,
        component_key: Option<&str>,
        requirement_type: RequirementType,
        parent_key: Option<&str>,
    ) -> Result<NextKeyResponse, DatabaseError> {
        let conn = self.db().conn();
        let project = require_project(conn, project_key).await?;

        let parent = match parent_key {
            Some(key) => Some(require_requirement(conn, &project.id, key).await?),
            None => None,
        };
        if let Some(ref p) = parent {
            if !requirement_type.accepts_parent(Some(p.requirement_type)) {
                return Err(DatabaseError::InvalidState(format!(
                    "a {requirement_type} cannot be a child of {} ({})",
                    p.key, p.requirement_type
                )));
            }
        }

        let component_id = match (component_key, parent.as_ref()) {
            (_, Some(p)) => p.component_id.clone(),
            (Some(key), None) => {
                find_component(conn, &project.id, key)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("component", key))?
                    .id
            }
            (None, None) => {
                return Err(DatabaseError::InvalidState(format!(
                    "a component is required to generate a {requirement_type} key"
                )));
            }
        };

        let key = self
            .next_free_key(conn, &project.id, &component_id, requirement_type, parent.as_ref())
            .await?;
        Ok(NextKeyResponse {
            project_key: project.key,
            requirement_type,
            parent_key: parent.map(|p| p.key),
            key,
        })
    }

    pub(crate) async fn next_free_key(
        &self,
        conn: &libsql::Connection,
        project_id: &str,
        component_id: &str,
        requirement_type: RequirementType,
        parent: Option<&Requirement>,
    ) -> Result<String, DatabaseError> {
        let prefix = key_prefix(requirement_type, parent.map(|p| p.key.as_str()))
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
        let mut taken = sibling_keys(
            conn,
            project_id,
            component_id,
            parent.map(|p| p.id.as_str()),
            requirement_type,
        )
        .await?;
        for _ in 0..MAX_KEY_ATTEMPTS {
            let candidate = next_key(&prefix, &taken)
                .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
            if !key_exists(conn, project_id, &candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(key = %candidate, "generated key already taken, skipping");
            taken.push(candidate);
        }
        Err(DatabaseError::InvalidState(format!(
            "no free key under '{prefix}' after {MAX_KEY_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::requirement::NewRequirement;
    use crate::test_support::helpers::{seed_project, test_service};
    use rstest::rstest;

    async fn create(svc: &RtmService, t: RequirementType, parent: Option<&str>, key: &str) {
        let new = NewRequirement {
            component_key: Some("api".into()),
            parent_key: parent.map(str::to_string),
            key: Some(key.into()),
            ..NewRequirement::new("p1", t, key)
        };
        svc.create_requirement(&new).await.unwrap();
    }

    #[rstest]
    #[case(&[], "SCOPE-1")]
    #[case(&["SCOPE-1", "SCOPE-2"], "SCOPE-3")]
    #[case(&["SCOPE-2", "SCOPE-10", "SCOPE-9"], "SCOPE-11")]
    #[case(&["SCOPE-A", "SCOPE-4"], "SCOPE-5")]
    #[tokio::test]
    async fn scope_keys_follow_numeric_maximum(#[case] existing: &[&str], #[case] expected: &str) {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        for key in existing {
            create(&svc, RequirementType::Scope, None, key).await;
        }
        let next = svc
            .generate_key("p1", Some("api"), RequirementType::Scope, None)
            .await
            .unwrap();
        assert_eq!(next.key, expected);
    }

    #[tokio::test]
    async fn child_keys_are_numbered_per_parent() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        create(&svc, RequirementType::Scope, None, "SCOPE-1").await;
        create(&svc, RequirementType::Scope, None, "SCOPE-2").await;
        create(&svc, RequirementType::UserStory, Some("SCOPE-1"), "SCOPE-1-US-1").await;
        create(&svc, RequirementType::UserStory, Some("SCOPE-1"), "SCOPE-1-US-2").await;

        let story = svc
            .generate_key("p1", None, RequirementType::UserStory, Some("SCOPE-1"))
            .await
            .unwrap();
        assert_eq!(story.key, "SCOPE-1-US-3");
        assert_eq!(story.parent_key.as_deref(), Some("SCOPE-1"));

        let other = svc
            .generate_key("p1", None, RequirementType::UserStory, Some("SCOPE-2"))
            .await
            .unwrap();
        assert_eq!(other.key, "SCOPE-2-US-1");

        let spec = svc
            .generate_key("p1", None, RequirementType::TechSpec, Some("SCOPE-1-US-2"))
            .await
            .unwrap();
        assert_eq!(spec.key, "SCOPE-1-US-2-TS-1");
    }

    #[tokio::test]
    async fn keys_keep_increasing_past_nine() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        let mut previous = 0;
        for _ in 0..12 {
            let new = NewRequirement {
                component_key: Some("api".into()),
                ..NewRequirement::new("p1", RequirementType::Scope, "s")
            };
            let created = svc.create_requirement(&new).await.unwrap();
            let n = rtm_core::keys::numeric_suffix(&created.key).unwrap();
            assert!(n > previous, "{} should be above {previous}", created.key);
            previous = n;
        }
        assert_eq!(previous, 12);
    }

    #[tokio::test]
    async fn exhausted_numbering_is_an_error() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        create(&svc, RequirementType::Scope, None, "SCOPE-18446744073709551615").await;

        let next = svc
            .generate_key("p1", Some("api"), RequirementType::Scope, None)
            .await;
        assert!(matches!(
            next,
            Err(DatabaseError::InvalidState(ref m)) if m.contains("exhausted")
        ));

        let new = NewRequirement {
            component_key: Some("api".into()),
            ..NewRequirement::new("p1", RequirementType::Scope, "s")
        };
        assert!(matches!(
            svc.create_requirement(&new).await,
            Err(DatabaseError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let svc = test_service().await;
        seed_project(&svc, "p1", &["api"]).await;
        create(&svc, RequirementType::Scope, None, "SCOPE-1").await;

        let no_parent = svc
            .generate_key("p1", Some("api"), RequirementType::UserStory, None)
            .await;
        assert!(matches!(no_parent, Err(DatabaseError::InvalidState(_))));

        let wrong_parent = svc
            .generate_key("p1", None, RequirementType::TechSpec, Some("SCOPE-1"))
            .await;
        assert!(matches!(wrong_parent, Err(DatabaseError::InvalidState(_))));

        let no_component = svc
            .generate_key("p1", None, RequirementType::Scope, None)
            .await;
        assert!(matches!(no_component, Err(DatabaseError::InvalidState(_))));

        let unknown_project = svc
            .generate_key("nope", Some("api"), RequirementType::Scope, None)
            .await;
        assert!(matches!(
            unknown_project,
            Err(DatabaseError::NotFound { entity: "project", .. })
        ));
    }
}
