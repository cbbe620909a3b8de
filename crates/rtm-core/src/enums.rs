//! Requirement levels, layers, change kinds and reconciliation modes.
//!
//! Storage strings are the `as_str()` values. Requirement types are stored and
//! serialized in SCREAMING_SNAKE_CASE (`SCOPE`, `USER_STORY`, `TECH_SPEC`); every
//! other enum uses `snake_case`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// RequirementType
// ---------------------------------------------------------------------------

/// The three fixed levels of the requirement hierarchy, coarse to fine.
///
/// ```text
/// SCOPE → USER_STORY → TECH_SPEC
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementType {
    #[serde(alias = "scope")]
    Scope,
    #[serde(alias = "user_story")]
    UserStory,
    #[serde(alias = "tech_spec")]
    TechSpec,
}

impl RequirementType {
    pub const ALL: [Self; 3] = [Self::Scope, Self::UserStory, Self::TechSpec];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scope => "SCOPE",
            Self::UserStory => "USER_STORY",
            Self::TechSpec => "TECH_SPEC",
        }
    }

    /// The only type a node of this type may hang under. `None` for roots.
    #[must_use]
    pub const fn parent_type(self) -> Option<Self> {
        match self {
            Self::Scope => None,
            Self::UserStory => Some(Self::Scope),
            Self::TechSpec => Some(Self::UserStory),
        }
    }

    /// The only type a node of this type may contain. `None` for leaves.
    #[must_use]
    pub const fn child_type(self) -> Option<Self> {
        match self {
            Self::Scope => Some(Self::UserStory),
            Self::UserStory => Some(Self::TechSpec),
            Self::TechSpec => None,
        }
    }

    /// Whether a node of this type may sit under a parent of `parent` type.
    /// A missing parent is always accepted.
    #[must_use]
    pub fn accepts_parent(self, parent: Option<Self>) -> bool {
        match parent {
            None => true,
            Some(p) => self.parent_type() == Some(p),
        }
    }
}

impl FromStr for RequirementType {
    type Err = CoreError;

    /// Case-insensitive; accepts both `USER_STORY` and `user_story` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::Validation(format!("unknown requirement type '{s}'")))
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChangeKind
// ---------------------------------------------------------------------------

/// Kind of mutation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ImplementationLayer
// ---------------------------------------------------------------------------

/// Source layer an implementation record belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationLayer {
    Backend,
    Frontend,
    Database,
}

impl ImplementationLayer {
    pub const ALL: [Self; 3] = [Self::Backend, Self::Frontend, Self::Database];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for ImplementationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TestLayer
// ---------------------------------------------------------------------------

/// Layer a test file exercises.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TestLayer {
    Backend,
    Frontend,
}

impl TestLayer {
    pub const ALL: [Self; 2] = [Self::Backend, Self::Frontend];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl fmt::Display for TestLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TestType
// ---------------------------------------------------------------------------

/// Granularity tag of a test file.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    #[default]
    Unit,
    Integration,
    E2e,
}

impl TestType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::E2e => "e2e",
        }
    }

    /// Whether this is the implicit default, so documents can omit it.
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReconcileMode
// ---------------------------------------------------------------------------

/// How an incoming document is merged into persisted state.
///
/// - `Update`: upsert by requirement key, leave everything else alone.
/// - `Overwrite`: purge the project's data, then insert the document fresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    #[default]
    Update,
    Overwrite,
}

impl ReconcileMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NodeOutcome
// ---------------------------------------------------------------------------

/// What reconciliation did with a single requirement node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeOutcome {
    Created,
    Updated,
    Unchanged,
}

impl NodeOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for NodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Serde roundtrip tests ---

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
            }
        };
    }

    test_serde_roundtrip!(type_scope, RequirementType, RequirementType::Scope, "SCOPE");
    test_serde_roundtrip!(
        type_user_story,
        RequirementType,
        RequirementType::UserStory,
        "USER_STORY"
    );
    test_serde_roundtrip!(change_deleted, ChangeKind, ChangeKind::Deleted, "deleted");
    test_serde_roundtrip!(
        layer_database,
        ImplementationLayer,
        ImplementationLayer::Database,
        "database"
    );
    test_serde_roundtrip!(test_type_e2e, TestType, TestType::E2e, "e2e");
    test_serde_roundtrip!(
        mode_overwrite,
        ReconcileMode,
        ReconcileMode::Overwrite,
        "overwrite"
    );

    #[test]
    fn lowercase_requirement_type_deserializes() {
        let t: RequirementType = serde_json::from_str("\"tech_spec\"").unwrap();
        assert_eq!(t, RequirementType::TechSpec);
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!(
            "user_story".parse::<RequirementType>().unwrap(),
            RequirementType::UserStory
        );
        assert_eq!(
            " Tech_Spec ".parse::<RequirementType>().unwrap(),
            RequirementType::TechSpec
        );
        assert!("epic".parse::<RequirementType>().is_err());
    }

    // --- Hierarchy rules ---

    #[test]
    fn parent_rules() {
        assert!(RequirementType::Scope.accepts_parent(None));
        assert!(!RequirementType::Scope.accepts_parent(Some(RequirementType::Scope)));
        assert!(RequirementType::UserStory.accepts_parent(Some(RequirementType::Scope)));
        assert!(RequirementType::UserStory.accepts_parent(None));
        assert!(!RequirementType::TechSpec.accepts_parent(Some(RequirementType::Scope)));
        assert!(RequirementType::TechSpec.accepts_parent(Some(RequirementType::UserStory)));
    }

    #[test]
    fn child_type_mirrors_parent_type() {
        for t in RequirementType::ALL {
            if let Some(child) = t.child_type() {
                assert_eq!(child.parent_type(), Some(t));
            }
        }
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", RequirementType::TechSpec), "TECH_SPEC");
        assert_eq!(format!("{}", ChangeKind::Updated), "updated");
        assert_eq!(format!("{}", ImplementationLayer::Frontend), "frontend");
        assert_eq!(format!("{}", TestLayer::Backend), "backend");
        assert_eq!(format!("{}", TestType::Integration), "integration");
        assert_eq!(format!("{}", ReconcileMode::Update), "update");
        assert_eq!(format!("{}", NodeOutcome::Unchanged), "unchanged");
    }
}
