use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RequirementType;

/// A persisted requirement node: one row of the Scope → UserStory → TechSpec tree.
///
/// `parent_id` is the only structural link; `position` orders siblings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Requirement {
    pub id: String,
    pub project_id: String,
    pub component_id: String,
    pub parent_id: Option<String>,
    pub key: String,
    pub requirement_type: RequirementType,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub acceptance_criteria: Vec<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
