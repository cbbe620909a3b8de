use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A deployable unit of a project. Requirements are filed under exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Component {
    pub id: String,
    pub project_id: String,
    pub key: String,
    pub name: String,
    pub component_type: String,
    pub technology: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
