use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{TestLayer, TestType};

/// A test file, unique per project by path.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TestFile {
    pub id: String,
    pub project_id: String,
    pub file_path: String,
    pub layer: TestLayer,
    pub test_type: TestType,
}

/// A named test inside a test file, unique per file by name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TestCase {
    pub id: String,
    pub test_file_id: String,
    pub name: String,
    pub test_type: TestType,
}

/// Many-to-many link between a requirement and a test case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CoverageLink {
    pub requirement_id: String,
    pub test_case_id: String,
    pub position: i64,
}
