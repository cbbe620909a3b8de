use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An HTTP endpoint exposed by the project, unique per (method, path).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub id: String,
    pub project_id: String,
    pub method: String,
    pub path: String,
    pub handler: Option<String>,
    pub description: Option<String>,
}
