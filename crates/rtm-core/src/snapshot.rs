//! Comparable state of one requirement node.
//!
//! A snapshot is what the audit trail stores as `old_state` / `new_state`, and
//! equality of two snapshots is what decides whether an update-mode import
//! touches a node at all.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::tree::{ImplementationRef, NodeSpec, TestCaseRef, TreeEntry};
use crate::enums::RequirementType;

/// Everything about a node that a document can express, keyed by human keys
/// only (no row identifiers), so a document and a stored node compare directly.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RequirementSnapshot {
    pub key: String,
    pub requirement_type: RequirementType,
    pub component_key: String,
    pub parent_key: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub acceptance_criteria: Vec<String>,
    pub position: i64,
    pub implementations: Vec<ImplementationRef>,
    pub tests: Vec<TestCaseRef>,
}

impl RequirementSnapshot {
    /// Snapshot of a node as the incoming document describes it.
    #[must_use]
    pub fn from_tree_entry(entry: &TreeEntry<'_>) -> Self {
        let node = entry.node;
        Self {
            key: node.key.clone(),
            requirement_type: entry.requirement_type,
            component_key: node.component_key.clone(),
            parent_key: entry.parent_key.map(str::to_string),
            title: node.title.clone(),
            description: node.description.clone(),
            category: node.category.clone(),
            priority: node.priority.clone(),
            status: node.status.clone(),
            acceptance_criteria: node.acceptance_criteria.clone(),
            position: entry.position,
            implementations: node.implementations.clone(),
            tests: node.tests.clone(),
        }
    }

    /// Whether only the node's own row differs, attachments being equal.
    #[must_use]
    pub fn same_attachments(&self, other: &Self) -> bool {
        self.implementations == other.implementations && self.tests == other.tests
    }

    /// The node attributes, dropping structural fields (type, parent, position).
    #[must_use]
    pub fn into_node_spec(self) -> NodeSpec {
        NodeSpec {
            key: self.key,
            component_key: self.component_key,
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority,
            status: self.status,
            acceptance_criteria: self.acceptance_criteria,
            implementations: self.implementations,
            tests: self.tests,
        }
    }

    /// JSON form stored in audit entries.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
