use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ChangeKind;

/// An append-only record of one requirement mutation.
///
/// `old_state` is `None` on creation and `new_state` is `None` on deletion.
/// Entries carry keys rather than foreign keys so they outlive the node.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    pub project_key: String,
    pub requirement_id: String,
    pub requirement_key: String,
    pub change: ChangeKind,
    pub old_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
