//! The serialized RTM document: what importers read and the exporter writes.
//!
//! Two requirement shapes are accepted side by side:
//!
//! - `requirements`: generic nodes carrying a `type`. Children are nested via
//!   `children`, or listed flat at the top level with a `parent` key.
//! - `scopes`: typed nesting, `scopes[].user_stories[].tech_specs[]`.
//!
//! Both are folded into one [`tree::NormalizedDocument`] before anything
//! touches the store. Field aliases (`id`, `name`, `component_id`, `tests`)
//! keep older files readable.

pub mod tree;

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ImplementationLayer, TestLayer, TestType};
use crate::errors::DocumentError;

/// Top-level RTM document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RtmDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,

    #[serde(default)]
    pub project: ProjectSpec,

    #[serde(default, alias = "system_components")]
    pub components: Vec<ComponentSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<RequirementEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<ScopeEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_endpoints: Vec<ApiEndpointSpec>,
}

/// Generator stamp. `metadata.project`, when it carries a key, wins over the
/// top-level `project`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectSpec {
    #[serde(default, alias = "id")]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ComponentSpec {
    #[serde(alias = "id")]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Attributes shared by every requirement level, in both shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NodeFields {
    #[serde(default, alias = "id")]
    pub key: String,
    #[serde(default, alias = "component_id", skip_serializing_if = "Option::is_none")]
    pub component_key: Option<String>,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<ImplementationSpec>,
    #[serde(default, alias = "tests", skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<TestCoverageSpec>,
}

/// Generic requirement node (`requirements` shape).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RequirementEntry {
    /// `SCOPE`, `USER_STORY` or `TECH_SPEC`, case-insensitive.
    #[serde(rename = "type")]
    pub requirement_type: String,

    #[serde(flatten)]
    pub fields: NodeFields,

    /// Parent key for flat lists. Only honoured on top-level entries; nested
    /// entries may repeat their enclosing key but nothing else.
    #[serde(default, alias = "parent_key", skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RequirementEntry>,
}

/// Typed nesting, level 1 (`scopes` shape).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScopeEntry {
    #[serde(flatten)]
    pub fields: NodeFields,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_stories: Vec<UserStoryEntry>,
}

/// Typed nesting, level 2.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserStoryEntry {
    #[serde(flatten)]
    pub fields: NodeFields,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_specs: Vec<TechSpecEntry>,
}

/// Typed nesting, level 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TechSpecEntry {
    #[serde(flatten)]
    pub fields: NodeFields,
}

/// Implementation files grouped by layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImplementationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<LayerFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<LayerFiles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<LayerFiles>,
}

impl ImplementationSpec {
    /// Files declared for `layer`, if the layer is present.
    #[must_use]
    pub const fn layer(&self, layer: ImplementationLayer) -> Option<&LayerFiles> {
        match layer {
            ImplementationLayer::Backend => self.backend.as_ref(),
            ImplementationLayer::Frontend => self.frontend.as_ref(),
            ImplementationLayer::Database => self.database.as_ref(),
        }
    }

    pub const fn layer_mut(&mut self, layer: ImplementationLayer) -> &mut Option<LayerFiles> {
        match layer {
            ImplementationLayer::Backend => &mut self.backend,
            ImplementationLayer::Frontend => &mut self.frontend,
            ImplementationLayer::Database => &mut self.database,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LayerFiles {
    #[serde(default)]
    pub files: Vec<FileImpl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FileImpl {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<String>,
}

/// Test files grouped by layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TestCoverageSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend: Vec<TestFileSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frontend: Vec<TestFileSpec>,
}

impl TestCoverageSpec {
    /// Test files declared for `layer`.
    #[must_use]
    pub fn layer(&self, layer: TestLayer) -> &[TestFileSpec] {
        match layer {
            TestLayer::Backend => &self.backend,
            TestLayer::Frontend => &self.frontend,
        }
    }

    pub const fn layer_mut(&mut self, layer: TestLayer) -> &mut Vec<TestFileSpec> {
        match layer {
            TestLayer::Backend => &mut self.backend,
            TestLayer::Frontend => &mut self.frontend,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TestFileSpec {
    pub file: String,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "TestType::is_unit")]
    pub test_type: TestType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ApiEndpointSpec {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Serialization formats the document can be read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension (`.json`, `.yaml`, `.yml`).
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnsupportedFormat` for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(DocumentError::UnsupportedFormat(ext)),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl RtmDocument {
    /// Decode a document from `text` in the given format.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Parse` when the text is not a valid document.
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        let parse_error = |message: String| DocumentError::Parse {
            format: format.as_str(),
            message,
        };
        match format {
            DocumentFormat::Json => {
                serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))
            }
        }
    }

    /// Encode the document in the given format.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Parse` if serialization fails.
    pub fn render(&self, format: DocumentFormat) -> Result<String, DocumentError> {
        let render_error = |message: String| DocumentError::Parse {
            format: format.as_str(),
            message,
        };
        match format {
            DocumentFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| render_error(e.to_string()))
            }
            DocumentFormat::Yaml => {
                serde_yaml::to_string(self).map_err(|e| render_error(e.to_string()))
            }
        }
    }

    /// The project descriptor in effect: `metadata.project` when it has a key,
    /// the top-level `project` otherwise.
    #[must_use]
    pub fn effective_project(&self) -> &ProjectSpec {
        self.metadata
            .as_ref()
            .and_then(|m| m.project.as_ref())
            .filter(|p| !p.key.is_empty())
            .unwrap_or(&self.project)
    }
}
