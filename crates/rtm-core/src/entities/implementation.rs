use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ImplementationLayer;

/// A source file (and the symbols in it) that implements a requirement.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImplementationRecord {
    pub id: String,
    pub requirement_id: String,
    pub layer: ImplementationLayer,
    pub file_path: String,
    pub functions: Vec<String>,
    pub position: i64,
}
