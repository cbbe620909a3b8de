//! Result types returned as JSON by `rtm` commands.
//!
//! These structs define the shape of JSON output for `rtm import`,
//! `rtm projects`, `rtm status`, `rtm delete` and `rtm next-key`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Project;
use crate::enums::{ReconcileMode, RequirementType};

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub project_key: String,
    pub mode: ReconcileMode,
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    /// Nodes purged by overwrite mode.
    pub deleted: u32,
    pub components_created: u32,
    pub implementations: u32,
    pub coverage_links: u32,
    pub api_endpoints: u32,
}

impl ReconcileSummary {
    #[must_use]
    pub fn new(project_key: impl Into<String>, mode: ReconcileMode) -> Self {
        Self {
            project_key: project_key.into(),
            mode,
            ..Self::default()
        }
    }

    /// True when the run changed no requirement node.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// A project with row counts, as listed by `rtm projects` / `rtm status`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project: Project,
    pub components: u32,
    pub scopes: u32,
    pub user_stories: u32,
    pub tech_specs: u32,
    pub implementations: u32,
    pub test_cases: u32,
    pub coverage_links: u32,
}

impl ProjectSummary {
    #[must_use]
    pub const fn requirement_count(&self, requirement_type: RequirementType) -> u32 {
        match requirement_type {
            RequirementType::Scope => self.scopes,
            RequirementType::UserStory => self.user_stories,
            RequirementType::TechSpec => self.tech_specs,
        }
    }

    #[must_use]
    pub const fn total_requirements(&self) -> u32 {
        self.scopes + self.user_stories + self.tech_specs
    }
}

/// Response from `rtm delete` and `rtm delete-project`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeleteResponse {
    /// Keys of every removed node, parents before children.
    pub deleted_keys: Vec<String>,
}

/// Response from `rtm next-key`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NextKeyResponse {
    pub project_key: String,
    pub requirement_type: RequirementType,
    pub parent_key: Option<String>,
    pub key: String,
}
