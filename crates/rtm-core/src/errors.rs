//! Cross-cutting error types for the RTM engine.
//!
//! `CoreError` covers lookups and validation that any crate can raise.
//! `DocumentError` is the parse/shape taxonomy: everything that can be wrong
//! with an incoming document before a transaction is opened. Storage errors live
//! in `rtm-db`.

use thiserror::Error;

use crate::enums::RequirementType;

/// Errors that can be raised by any RTM crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Malformed or structurally invalid RTM documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The raw bytes could not be decoded as the given format.
    #[error("Failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// File extension is not one of `.json`, `.yaml`, `.yml`.
    #[error("Unsupported document format '{0}' (use .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// Neither the document nor the caller supplied a project key.
    #[error("Document has no project key and no override was given")]
    MissingProjectKey,

    /// A requirement entry has an empty key.
    #[error("Requirement at {path} has no key")]
    MissingKey { path: String },

    /// A root requirement names no component and has no parent to inherit one from.
    #[error("Requirement {key} has no component_key")]
    MissingComponent { key: String },

    /// A requirement entry carries a type string outside the hierarchy.
    #[error("Requirement {key}: unknown requirement type '{value}'")]
    UnknownType { key: String, value: String },

    /// A requirement sits under a parent of the wrong level.
    #[error(
        "Requirement {key} ({node_type}) cannot be a child of {parent_key} ({parent_type})"
    )]
    IllegalParent {
        key: String,
        node_type: RequirementType,
        parent_key: String,
        parent_type: RequirementType,
    },

    /// A flat requirement names a parent key that is not in the document.
    #[error("Requirement {key} references unknown parent {parent}")]
    DanglingParent { key: String, parent: String },

    /// Two flat entries share a key, so parent links are ambiguous.
    #[error("Requirement key {0} appears more than once in a flat requirement list")]
    DuplicateKey(String),

    /// Flat parent links form a loop; none of these nodes reaches a root.
    #[error("Requirement parent links form a cycle through: {}", .0.join(", "))]
    Cycle(Vec<String>),

    /// A child declared both nested `children` and a conflicting `parent` link.
    #[error("Requirement {key} is nested under {nested_parent} but declares parent {declared}")]
    ConflictingParent {
        key: String,
        nested_parent: String,
        declared: String,
    },

    /// One test file is declared with two different layers or test types.
    /// Test files are shared across a project, so only one declaration can hold.
    #[error(
        "Requirement {key} declares test file {file} as {declared}, but {first_key} declares it as {first}"
    )]
    ConflictingTestFile {
        key: String,
        file: String,
        declared: String,
        first_key: String,
        first: String,
    },
}

impl DocumentError {
    /// Key of the requirement that caused the error, when there is one.
    #[must_use]
    pub fn requirement_key(&self) -> Option<&str> {
        match self {
            Self::UnknownType { key, .. }
            | Self::MissingComponent { key }
            | Self::IllegalParent { key, .. }
            | Self::DanglingParent { key, .. }
            | Self::ConflictingParent { key, .. }
            | Self::ConflictingTestFile { key, .. } => Some(key),
            Self::DuplicateKey(key) => Some(key),
            Self::Cycle(keys) => keys.first().map(String::as_str),
            Self::Parse { .. }
            | Self::UnsupportedFormat(_)
            | Self::MissingProjectKey
            | Self::MissingKey { .. } => None,
        }
    }
}
