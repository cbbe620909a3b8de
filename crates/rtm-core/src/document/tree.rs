//! Typed requirement tree.
//!
//! [`NormalizedDocument::from_document`] folds both input shapes into one tree
//! whose node types make illegal nesting unrepresentable:
//!
//! ```text
//! RootNode::Scope(ScopeNode { user_stories: [UserStoryNode { tech_specs: [TechSpecNode] }] })
//! RootNode::UserStory(..)   orphan user story
//! RootNode::TechSpec(..)    orphan tech spec
//! ```
//!
//! Every shape problem is reported here, before any store is touched.

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    ApiEndpointSpec, ComponentSpec, FileImpl, ImplementationSpec, LayerFiles, NodeFields,
    ProjectSpec, RequirementEntry, RtmDocument, TestCoverageSpec, TestFileSpec,
};
use crate::enums::{ImplementationLayer, RequirementType, TestLayer, TestType};
use crate::errors::DocumentError;

/// A document that passed every shape check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    /// Project descriptor with the key already resolved.
    pub project: ProjectSpec,
    pub components: Vec<ComponentSpec>,
    pub roots: Vec<RootNode>,
    pub api_endpoints: Vec<ApiEndpointSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootNode {
    Scope(ScopeNode),
    UserStory(UserStoryNode),
    TechSpec(TechSpecNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeNode {
    pub node: NodeSpec,
    pub user_stories: Vec<UserStoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStoryNode {
    pub node: NodeSpec,
    pub tech_specs: Vec<TechSpecNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechSpecNode {
    pub node: NodeSpec,
}

/// Node attributes after normalization: component resolved, attachments flat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub key: String,
    pub component_key: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub acceptance_criteria: Vec<String>,
    /// Ordered backend, frontend, database; file order kept within a layer.
    pub implementations: Vec<ImplementationRef>,
    /// Grouped by layer then by file; one entry per (file, function).
    pub tests: Vec<TestCaseRef>,
}

/// One implementation file attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ImplementationRef {
    pub layer: ImplementationLayer,
    pub file_path: String,
    pub functions: Vec<String>,
}

/// One covered test function attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct TestCaseRef {
    pub layer: TestLayer,
    pub file: String,
    pub test_type: TestType,
    pub name: String,
}

/// A node as seen during a pre-order walk of the tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry<'a> {
    pub requirement_type: RequirementType,
    pub node: &'a NodeSpec,
    pub parent_key: Option<&'a str>,
    /// Ordinal among siblings. Roots are numbered per (component, type).
    pub position: i64,
}

impl RootNode {
    #[must_use]
    pub const fn node(&self) -> &NodeSpec {
        match self {
            Self::Scope(s) => &s.node,
            Self::UserStory(u) => &u.node,
            Self::TechSpec(t) => &t.node,
        }
    }

    #[must_use]
    pub const fn requirement_type(&self) -> RequirementType {
        match self {
            Self::Scope(_) => RequirementType::Scope,
            Self::UserStory(_) => RequirementType::UserStory,
            Self::TechSpec(_) => RequirementType::TechSpec,
        }
    }

    fn to_entry(&self) -> RequirementEntry {
        match self {
            Self::Scope(s) => s.to_entry(),
            Self::UserStory(u) => u.to_entry(),
            Self::TechSpec(t) => t.to_entry(),
        }
    }
}

impl ScopeNode {
    fn to_entry(&self) -> RequirementEntry {
        RequirementEntry {
            requirement_type: RequirementType::Scope.as_str().to_string(),
            fields: self.node.to_fields(),
            parent: None,
            children: self.user_stories.iter().map(UserStoryNode::to_entry).collect(),
        }
    }
}

impl UserStoryNode {
    fn to_entry(&self) -> RequirementEntry {
        RequirementEntry {
            requirement_type: RequirementType::UserStory.as_str().to_string(),
            fields: self.node.to_fields(),
            parent: None,
            children: self.tech_specs.iter().map(TechSpecNode::to_entry).collect(),
        }
    }
}

impl TechSpecNode {
    fn to_entry(&self) -> RequirementEntry {
        RequirementEntry {
            requirement_type: RequirementType::TechSpec.as_str().to_string(),
            fields: self.node.to_fields(),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl NodeSpec {
    /// Render back to document fields, regrouping attachments by layer.
    #[must_use]
    pub fn to_fields(&self) -> NodeFields {
        NodeFields {
            key: self.key.clone(),
            component_key: Some(self.component_key.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            priority: self.priority.clone(),
            status: self.status.clone(),
            acceptance_criteria: self.acceptance_criteria.clone(),
            implementation: self.implementation_spec(),
            test_coverage: self.test_coverage_spec(),
        }
    }

    fn implementation_spec(&self) -> Option<ImplementationSpec> {
        if self.implementations.is_empty() {
            return None;
        }
        let mut spec = ImplementationSpec::default();
        for imp in &self.implementations {
            spec.layer_mut(imp.layer)
                .get_or_insert_with(LayerFiles::default)
                .files
                .push(FileImpl {
                    path: imp.file_path.clone(),
                    functions: imp.functions.clone(),
                });
        }
        Some(spec)
    }

    fn test_coverage_spec(&self) -> Option<TestCoverageSpec> {
        if self.tests.is_empty() {
            return None;
        }
        let mut spec = TestCoverageSpec::default();
        for test in &self.tests {
            let files = spec.layer_mut(test.layer);
            match files.iter_mut().find(|f| f.file == test.file) {
                Some(file) => file.functions.push(test.name.clone()),
                None => files.push(TestFileSpec {
                    file: test.file.clone(),
                    functions: vec![test.name.clone()],
                    test_type: test.test_type,
                }),
            }
        }
        Some(spec)
    }
}

impl NormalizedDocument {
    /// Validate and normalize a parsed document.
    ///
    /// The project key is taken from `project_override`, then
    /// `metadata.project`, then the top-level `project`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DocumentError`] found: missing project key, missing
    /// or unknown node data, dangling/ambiguous/cyclic parent links, a node
    /// placed under a parent of the wrong type, or a test file declared with
    /// two different layers or types.
    pub fn from_document(
        doc: &RtmDocument,
        project_override: Option<&str>,
    ) -> Result<Self, DocumentError> {
        let mut project = doc.effective_project().clone();
        if let Some(key) = project_override.map(str::trim).filter(|k| !k.is_empty()) {
            project.key = key.to_string();
        }
        if project.key.trim().is_empty() {
            return Err(DocumentError::MissingProjectKey);
        }
        if project.name.trim().is_empty() {
            project.name.clone_from(&project.key);
        }

        let mut arena = Arena::default();
        for (i, scope) in doc.scopes.iter().enumerate() {
            let path = format!("scopes[{i}]");
            let scope_idx = arena.push(RequirementType::Scope, &scope.fields, None, &path)?;
            for (j, story) in scope.user_stories.iter().enumerate() {
                let path = format!("{path}.user_stories[{j}]");
                let story_idx =
                    arena.push(RequirementType::UserStory, &story.fields, Some(scope_idx), &path)?;
                for (k, spec) in story.tech_specs.iter().enumerate() {
                    let path = format!("{path}.tech_specs[{k}]");
                    arena.push(RequirementType::TechSpec, &spec.fields, Some(story_idx), &path)?;
                }
            }
        }
        for (i, entry) in doc.requirements.iter().enumerate() {
            arena.push_entry(entry, None, &format!("requirements[{i}]"))?;
        }
        arena.link_declared_parents()?;
        arena.check_reachable()?;

        let roots = arena
            .root_indices()
            .map(|idx| arena.build_root(idx))
            .collect::<Result<Vec<_>, _>>()?;

        let normalized = Self {
            project,
            components: doc.components.clone(),
            roots,
            api_endpoints: doc.api_endpoints.clone(),
        };
        normalized.check_test_files()?;
        Ok(normalized)
    }

    /// Every mention of a test file must agree on its layer and test type.
    fn check_test_files(&self) -> Result<(), DocumentError> {
        let mut declared: HashMap<&str, (&str, TestLayer, TestType)> = HashMap::new();
        for entry in self.depth_first() {
            for test in &entry.node.tests {
                let (first_key, layer, test_type) = *declared
                    .entry(test.file.as_str())
                    .or_insert((entry.node.key.as_str(), test.layer, test.test_type));
                if (layer, test_type) != (test.layer, test.test_type) {
                    return Err(DocumentError::ConflictingTestFile {
                        key: entry.node.key.clone(),
                        file: test.file.clone(),
                        declared: format!("{} {}", test.layer, test.test_type),
                        first_key: first_key.to_string(),
                        first: format!("{layer} {test_type}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render as a document in the nested `requirements`/`children` shape.
    #[must_use]
    pub fn to_document(&self) -> RtmDocument {
        RtmDocument {
            metadata: None,
            project: self.project.clone(),
            components: self.components.clone(),
            requirements: self.roots.iter().map(RootNode::to_entry).collect(),
            scopes: Vec::new(),
            api_endpoints: self.api_endpoints.clone(),
        }
    }

    /// Every node, parents before children, in document order.
    #[must_use]
    pub fn depth_first(&self) -> Vec<TreeEntry<'_>> {
        let mut out = Vec::new();
        let mut root_counters: HashMap<(&str, RequirementType), i64> = HashMap::new();
        for root in &self.roots {
            let node = root.node();
            let counter = root_counters
                .entry((node.component_key.as_str(), root.requirement_type()))
                .or_insert(0);
            let position = *counter;
            *counter += 1;
            out.push(TreeEntry {
                requirement_type: root.requirement_type(),
                node,
                parent_key: None,
                position,
            });
            match root {
                RootNode::Scope(scope) => push_user_stories(&mut out, scope),
                RootNode::UserStory(story) => push_tech_specs(&mut out, story),
                RootNode::TechSpec(_) => {}
            }
        }
        out
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.depth_first().len()
    }
}

fn push_user_stories<'a>(out: &mut Vec<TreeEntry<'a>>, scope: &'a ScopeNode) {
    for (position, story) in (0_i64..).zip(&scope.user_stories) {
        out.push(TreeEntry {
            requirement_type: RequirementType::UserStory,
            node: &story.node,
            parent_key: Some(&scope.node.key),
            position,
        });
        push_tech_specs(out, story);
    }
}

fn push_tech_specs<'a>(out: &mut Vec<TreeEntry<'a>>, story: &'a UserStoryNode) {
    for (position, spec) in (0_i64..).zip(&story.tech_specs) {
        out.push(TreeEntry {
            requirement_type: RequirementType::TechSpec,
            node: &spec.node,
            parent_key: Some(&story.node.key),
            position,
        });
    }
}

// ---------------------------------------------------------------------------
// Arena used while normalizing
// ---------------------------------------------------------------------------

struct Slot<'a> {
    requirement_type: RequirementType,
    key: &'a str,
    fields: &'a NodeFields,
    /// `parent` key of a top-level flat entry, resolved by `link_declared_parents`.
    declared_parent: Option<&'a str>,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Default)]
struct Arena<'a> {
    slots: Vec<Slot<'a>>,
}

impl<'a> Arena<'a> {
    fn push(
        &mut self,
        requirement_type: RequirementType,
        fields: &'a NodeFields,
        parent: Option<usize>,
        path: &str,
    ) -> Result<usize, DocumentError> {
        let key = fields.key.trim();
        if key.is_empty() {
            return Err(DocumentError::MissingKey {
                path: path.to_string(),
            });
        }
        let idx = self.slots.len();
        self.slots.push(Slot {
            requirement_type,
            key,
            fields,
            declared_parent: None,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.slots[p].children.push(idx);
        }
        Ok(idx)
    }

    fn push_entry(
        &mut self,
        entry: &'a RequirementEntry,
        parent: Option<usize>,
        path: &str,
    ) -> Result<(), DocumentError> {
        let key = entry.fields.key.trim();
        let requirement_type: RequirementType = entry.requirement_type.parse().map_err(|_| {
            DocumentError::UnknownType {
                key: if key.is_empty() { path.to_string() } else { key.to_string() },
                value: entry.requirement_type.clone(),
            }
        })?;
        let declared = entry
            .parent
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        if let (Some(p), Some(declared)) = (parent, declared) {
            if declared != self.slots[p].key {
                return Err(DocumentError::ConflictingParent {
                    key: key.to_string(),
                    nested_parent: self.slots[p].key.to_string(),
                    declared: declared.to_string(),
                });
            }
        }

        let idx = self.push(requirement_type, &entry.fields, parent, path)?;
        if parent.is_none() {
            self.slots[idx].declared_parent = declared;
        }
        for (i, child) in entry.children.iter().enumerate() {
            self.push_entry(child, Some(idx), &format!("{path}.children[{i}]"))?;
        }
        Ok(())
    }

    fn link_declared_parents(&mut self) -> Result<(), DocumentError> {
        let mut index: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (i, slot) in self.slots.iter().enumerate() {
            index.entry(slot.key).or_default().push(i);
        }
        for idx in 0..self.slots.len() {
            let Some(declared) = self.slots[idx].declared_parent else {
                continue;
            };
            let parent = match index.get(declared).map(Vec::as_slice) {
                Some([only]) => *only,
                Some([_, _, ..]) => return Err(DocumentError::DuplicateKey(declared.to_string())),
                _ => {
                    return Err(DocumentError::DanglingParent {
                        key: self.slots[idx].key.to_string(),
                        parent: declared.to_string(),
                    });
                }
            };
            self.slots[idx].parent = Some(parent);
            self.slots[parent].children.push(idx);
        }
        Ok(())
    }

    fn root_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.parent.is_none())
            .map(|(i, _)| i)
    }

    fn check_reachable(&self) -> Result<(), DocumentError> {
        let mut reached = vec![false; self.slots.len()];
        let mut stack: Vec<usize> = self.root_indices().collect();
        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut reached[idx], true) {
                continue;
            }
            stack.extend(&self.slots[idx].children);
        }
        let stranded: Vec<String> = self
            .slots
            .iter()
            .zip(&reached)
            .filter(|(_, reached)| !**reached)
            .map(|(slot, _)| slot.key.to_string())
            .collect();
        if stranded.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::Cycle(stranded))
        }
    }

    fn check_child(&self, parent: usize, child: usize) -> Result<(), DocumentError> {
        let p = &self.slots[parent];
        let c = &self.slots[child];
        if c.requirement_type.accepts_parent(Some(p.requirement_type)) {
            Ok(())
        } else {
            Err(DocumentError::IllegalParent {
                key: c.key.to_string(),
                node_type: c.requirement_type,
                parent_key: p.key.to_string(),
                parent_type: p.requirement_type,
            })
        }
    }

    fn build_root(&self, idx: usize) -> Result<RootNode, DocumentError> {
        Ok(match self.slots[idx].requirement_type {
            RequirementType::Scope => RootNode::Scope(self.build_scope(idx)?),
            RequirementType::UserStory => RootNode::UserStory(self.build_user_story(idx, None)?),
            RequirementType::TechSpec => RootNode::TechSpec(self.build_tech_spec(idx, None)?),
        })
    }

    fn build_scope(&self, idx: usize) -> Result<ScopeNode, DocumentError> {
        let node = self.node_spec(idx, None)?;
        let mut user_stories = Vec::with_capacity(self.slots[idx].children.len());
        for &child in &self.slots[idx].children {
            self.check_child(idx, child)?;
            user_stories.push(self.build_user_story(child, Some(&node.component_key))?);
        }
        Ok(ScopeNode { node, user_stories })
    }

    fn build_user_story(
        &self,
        idx: usize,
        inherited: Option<&str>,
    ) -> Result<UserStoryNode, DocumentError> {
        let node = self.node_spec(idx, inherited)?;
        let mut tech_specs = Vec::with_capacity(self.slots[idx].children.len());
        for &child in &self.slots[idx].children {
            self.check_child(idx, child)?;
            tech_specs.push(self.build_tech_spec(child, Some(&node.component_key))?);
        }
        Ok(UserStoryNode { node, tech_specs })
    }

    fn build_tech_spec(
        &self,
        idx: usize,
        inherited: Option<&str>,
    ) -> Result<TechSpecNode, DocumentError> {
        if let Some(&child) = self.slots[idx].children.first() {
            self.check_child(idx, child)?;
        }
        Ok(TechSpecNode {
            node: self.node_spec(idx, inherited)?,
        })
    }

    fn node_spec(&self, idx: usize, inherited: Option<&str>) -> Result<NodeSpec, DocumentError> {
        let slot = &self.slots[idx];
        let fields = slot.fields;
        let component_key = fields
            .component_key
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or(inherited)
            .ok_or_else(|| DocumentError::MissingComponent {
                key: slot.key.to_string(),
            })?
            .to_string();

        Ok(NodeSpec {
            key: slot.key.to_string(),
            component_key,
            title: fields.title.clone(),
            description: fields.description.clone(),
            category: fields.category.clone(),
            priority: fields.priority.clone(),
            status: fields.status.clone(),
            acceptance_criteria: fields.acceptance_criteria.clone(),
            implementations: flatten_implementations(fields.implementation.as_ref()),
            tests: flatten_tests(fields.test_coverage.as_ref()),
        })
    }
}

fn flatten_implementations(spec: Option<&ImplementationSpec>) -> Vec<ImplementationRef> {
    let Some(spec) = spec else {
        return Vec::new();
    };
    ImplementationLayer::ALL
        .into_iter()
        .filter_map(|layer| spec.layer(layer).map(|files| (layer, files)))
        .flat_map(|(layer, files)| {
            files.files.iter().map(move |f| ImplementationRef {
                layer,
                file_path: f.path.clone(),
                functions: f.functions.clone(),
            })
        })
        .collect()
}

/// Group by layer, merge repeated files within a layer, and drop repeated
/// (file, function) pairs. Files with no functions produce no coverage.
fn flatten_tests(spec: Option<&TestCoverageSpec>) -> Vec<TestCaseRef> {
    let Some(spec) = spec else {
        return Vec::new();
    };
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut out = Vec::new();
    for layer in TestLayer::ALL {
        let mut groups: Vec<(&TestFileSpec, Vec<&str>)> = Vec::new();
        for file in spec.layer(layer) {
            let names = file.functions.iter().map(String::as_str);
            match groups.iter_mut().find(|(f, _)| f.file == file.file) {
                Some((_, existing)) => existing.extend(names),
                None => groups.push((file, names.collect())),
            }
        }
        for (file, names) in groups {
            for name in names {
                if seen.insert((file.file.as_str(), name)) {
                    out.push(TestCaseRef {
                        layer,
                        file: file.file.clone(),
                        test_type: file.test_type,
                        name: name.to_string(),
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, ScopeEntry, TechSpecEntry, UserStoryEntry};
    use pretty_assertions::assert_eq;

    fn fields(key: &str) -> NodeFields {
        NodeFields {
            key: key.into(),
            title: format!("title of {key}"),
            ..NodeFields::default()
        }
    }

    fn entry(t: &str, key: &str, children: Vec<RequirementEntry>) -> RequirementEntry {
        RequirementEntry {
            requirement_type: t.into(),
            fields: fields(key),
            parent: None,
            children,
        }
    }

    fn flat(t: &str, key: &str, parent: Option<&str>) -> RequirementEntry {
        RequirementEntry {
            parent: parent.map(str::to_string),
            ..entry(t, key, Vec::new())
        }
    }

    fn doc(requirements: Vec<RequirementEntry>) -> RtmDocument {
        let mut requirements = requirements;
        for r in &mut requirements {
            r.fields.component_key = Some("api".into());
        }
        RtmDocument {
            project: ProjectSpec {
                key: "p1".into(),
                name: "Project One".into(),
                ..ProjectSpec::default()
            },
            components: vec![ComponentSpec {
                key: "api".into(),
                name: "API".into(),
                component_type: "service".into(),
                ..ComponentSpec::default()
            }],
            requirements,
            ..RtmDocument::default()
        }
    }

    fn keys(doc: &NormalizedDocument) -> Vec<(RequirementType, String, Option<String>)> {
        doc.depth_first()
            .into_iter()
            .map(|e| {
                (
                    e.requirement_type,
                    e.node.key.clone(),
                    e.parent_key.map(str::to_string),
                )
            })
            .collect()
    }

    #[test]
    fn nested_children_normalize() {
        let d = doc(vec![entry(
            "SCOPE",
            "SCOPE-1",
            vec![entry(
                "user_story",
                "SCOPE-1-US-1",
                vec![entry("tech_spec", "SCOPE-1-US-1-TS-1", vec![])],
            )],
        )]);
        let n = NormalizedDocument::from_document(&d, None).unwrap();
        assert_eq!(
            keys(&n),
            vec![
                (RequirementType::Scope, "SCOPE-1".into(), None),
                (
                    RequirementType::UserStory,
                    "SCOPE-1-US-1".into(),
                    Some("SCOPE-1".into())
                ),
                (
                    RequirementType::TechSpec,
                    "SCOPE-1-US-1-TS-1".into(),
                    Some("SCOPE-1-US-1".into())
                ),
            ]
        );
    }

    #[test]
    fn children_inherit_component() {
        let d = doc(vec![entry(
            "SCOPE",
            "SCOPE-1",
            vec![entry("USER_STORY", "SCOPE-1-US-1", vec![])],
        )]);
        let n = NormalizedDocument::from_document(&d, None).unwrap();
        let RootNode::Scope(scope) = &n.roots[0] else {
            panic!("expected scope root");
        };
        assert_eq!(scope.user_stories[0].node.component_key, "api");
    }

    #[test]
    fn flat_list_matches_nested_shape() {
        let nested = doc(vec![entry(
            "SCOPE",
            "SCOPE-1",
            vec![entry(
                "USER_STORY",
                "SCOPE-1-US-1",
                vec![entry("TECH_SPEC", "SCOPE-1-US-1-TS-1", vec![])],
            )],
        )]);
        // Children listed before their parent is fine.
        let flat_doc = doc(vec![
            flat("TECH_SPEC", "SCOPE-1-US-1-TS-1", Some("SCOPE-1-US-1")),
            flat("SCOPE", "SCOPE-1", None),
            flat("USER_STORY", "SCOPE-1-US-1", Some("SCOPE-1")),
        ]);
        let a = NormalizedDocument::from_document(&nested, None).unwrap();
        let b = NormalizedDocument::from_document(&flat_doc, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn scopes_shape_matches_requirements_shape() {
        let mut typed = doc(vec![]);
        typed.scopes = vec![ScopeEntry {
            fields: NodeFields {
                component_key: Some("api".into()),
                ..fields("SCOPE-1")
            },
            user_stories: vec![UserStoryEntry {
                fields: fields("SCOPE-1-US-1"),
                tech_specs: vec![TechSpecEntry {
                    fields: fields("SCOPE-1-US-1-TS-1"),
                }],
            }],
        }];
        let generic = doc(vec![entry(
            "SCOPE",
            "SCOPE-1",
            vec![entry(
                "USER_STORY",
                "SCOPE-1-US-1",
                vec![entry("TECH_SPEC", "SCOPE-1-US-1-TS-1", vec![])],
            )],
        )]);
        assert_eq!(
            NormalizedDocument::from_document(&typed, None).unwrap(),
            NormalizedDocument::from_document(&generic, None).unwrap()
        );
    }

    #[test]
    fn orphan_roots_are_allowed() {
        let d = doc(vec![
            entry("USER_STORY", "US-ORPHAN", vec![]),
            entry("TECH_SPEC", "TS-ORPHAN", vec![]),
        ]);
        let n = NormalizedDocument::from_document(&d, None).unwrap();
        assert_eq!(n.roots.len(), 2);
        assert_eq!(n.roots[0].requirement_type(), RequirementType::UserStory);
        assert_eq!(n.roots[1].requirement_type(), RequirementType::TechSpec);
    }

    #[test]
    fn tech_spec_under_scope_is_rejected() {
        let d = doc(vec![entry(
            "SCOPE",
            "SCOPE-1",
            vec![entry("TECH_SPEC", "SCOPE-1-TS-1", vec![])],
        )]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::IllegalParent {
                ref key,
                node_type: RequirementType::TechSpec,
                parent_type: RequirementType::Scope,
                ..
            } if key == "SCOPE-1-TS-1"
        ));
    }

    #[test]
    fn children_under_tech_spec_are_rejected() {
        let d = doc(vec![
            flat("TECH_SPEC", "TS-1", None),
            flat("TECH_SPEC", "TS-2", Some("TS-1")),
        ]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::IllegalParent { ref key, .. } if key == "TS-2"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let d = doc(vec![entry("EPIC", "E-1", vec![])]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(
            matches!(err, DocumentError::UnknownType { ref key, ref value } if key == "E-1" && value == "EPIC")
        );
    }

    #[test]
    fn dangling_parent_is_rejected() {
        let d = doc(vec![flat("USER_STORY", "US-1", Some("SCOPE-404"))]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(
            matches!(err, DocumentError::DanglingParent { ref key, ref parent } if key == "US-1" && parent == "SCOPE-404")
        );
    }

    #[test]
    fn ambiguous_parent_is_rejected() {
        let d = doc(vec![
            flat("SCOPE", "SCOPE-1", None),
            flat("SCOPE", "SCOPE-1", None),
            flat("USER_STORY", "SCOPE-1-US-1", Some("SCOPE-1")),
        ]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateKey(ref k) if k == "SCOPE-1"));
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let d = doc(vec![
            flat("USER_STORY", "A", Some("B")),
            flat("USER_STORY", "B", Some("A")),
            flat("SCOPE", "SCOPE-1", None),
        ]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::Cycle(ref keys) if keys == &["A", "B"]));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let d = doc(vec![flat("SCOPE", "SCOPE-1", Some("SCOPE-1"))]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::Cycle(_)));
    }

    #[test]
    fn nested_child_with_conflicting_parent_is_rejected() {
        let mut child = entry("USER_STORY", "SCOPE-1-US-1", vec![]);
        child.parent = Some("SCOPE-2".into());
        let d = doc(vec![entry("SCOPE", "SCOPE-1", vec![child])]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::ConflictingParent { .. }));
    }

    #[test]
    fn missing_key_reports_path() {
        let d = doc(vec![entry("SCOPE", "SCOPE-1", vec![entry("USER_STORY", " ", vec![])])]);
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(
            matches!(err, DocumentError::MissingKey { ref path } if path == "requirements[0].children[0]")
        );
    }

    #[test]
    fn root_without_component_is_rejected() {
        let mut d = doc(vec![entry("SCOPE", "SCOPE-1", vec![])]);
        d.requirements[0].fields.component_key = None;
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::MissingComponent { ref key } if key == "SCOPE-1"));
    }

    #[test]
    fn project_key_resolution() {
        let mut d = doc(vec![]);
        let n = NormalizedDocument::from_document(&d, Some("override")).unwrap();
        assert_eq!(n.project.key, "override");
        assert_eq!(n.project.name, "Project One");

        d.project.key = String::new();
        let err = NormalizedDocument::from_document(&d, None).unwrap_err();
        assert!(matches!(err, DocumentError::MissingProjectKey));
    }

    #[test]
    fn tests_are_grouped_and_deduplicated() {
        let mut d = doc(vec![entry("SCOPE", "SCOPE-1", vec![])]);
        d.requirements[0].fields.test_coverage = Some(TestCoverageSpec {
            backend: vec![
                TestFileSpec {
                    file: "a_test.go".into(),
                    functions: vec!["TestA1".into()],
                    test_type: TestType::Unit,
                },
                TestFileSpec {
                    file: "b_test.go".into(),
                    functions: vec!["TestB".into()],
                    test_type: TestType::Integration,
                },
                TestFileSpec {
                    file: "a_test.go".into(),
                    functions: vec!["TestA2".into(), "TestA1".into()],
                    test_type: TestType::Unit,
                },
            ],
            frontend: vec![TestFileSpec {
                file: "empty.spec.ts".into(),
                functions: vec![],
                test_type: TestType::E2e,
            }],
        });
        let n = NormalizedDocument::from_document(&d, None).unwrap();
        let names: Vec<_> = n.roots[0]
            .node()
            .tests
            .iter()
            .map(|t| (t.file.as_str(), t.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a_test.go", "TestA1"),
                ("a_test.go", "TestA2"),
                ("b_test.go", "TestB"),
            ]
        );
    }

    #[test]
    fn root_positions_count_per_component_and_type() {
        let mut d = doc(vec![
            entry("SCOPE", "SCOPE-1", vec![]),
            entry("TECH_SPEC", "TS-1", vec![]),
            entry("SCOPE", "SCOPE-2", vec![]),
        ]);
        d.requirements[2].fields.component_key = Some("web".into());
        let n = NormalizedDocument::from_document(&d, None).unwrap();
        let positions: Vec<_> = n
            .depth_first()
            .into_iter()
            .map(|e| (e.node.key.clone(), e.position))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("SCOPE-1".to_string(), 0),
                ("TS-1".to_string(), 0),
                ("SCOPE-2".to_string(), 0),
            ]
        );
    }

    #[test]
    fn rendered_document_normalizes_to_itself() {
        let yaml = r"
project: { key: p1, name: P1 }
components: [{ key: api, name: API, type: service }]
scopes:
  - key: SCOPE-1
    component_key: api
    title: Accounts
    acceptance_criteria: [works]
    implementation:
      database: { files: [{ path: db/001.sql }] }
      backend: { files: [{ path: api/accounts.go, functions: [Create, Delete] }] }
    user_stories:
      - key: SCOPE-1-US-1
        title: Sign up
        test_coverage:
          backend:
            - { file: api/signup_test.go, functions: [TestSignup], type: integration }
";
        let parsed = RtmDocument::parse(yaml, DocumentFormat::Yaml).unwrap();
        let first = NormalizedDocument::from_document(&parsed, None).unwrap();
        let rendered = first.to_document();
        let second = NormalizedDocument::from_document(&rendered, None).unwrap();
        assert_eq!(first, second);

        let layers: Vec<_> = first.roots[0]
            .node()
            .implementations
            .iter()
            .map(|i| i.layer)
            .collect();
        assert_eq!(
            layers,
            vec![ImplementationLayer::Backend, ImplementationLayer::Database]
        );
    }

    #[test]
    fn test_file_must_keep_one_layer_and_type() {
        let yaml = r"
project: { key: p1, name: P1 }
requirements:
  - key: SCOPE-1
    type: SCOPE
    component_key: api
    title: One
    test_coverage:
      backend: [{ file: tests/x.rs, functions: [a], type: unit }]
  - key: SCOPE-2
    type: SCOPE
    component_key: api
    title: Two
    test_coverage:
      backend: [{ file: tests/x.rs, functions: [b], type: integration }]
";
        let parsed = RtmDocument::parse(yaml, DocumentFormat::Yaml).unwrap();
        let err = NormalizedDocument::from_document(&parsed, None).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::ConflictingTestFile { ref key, ref file, ref first_key, .. }
                if key == "SCOPE-2" && file == "tests/x.rs" && first_key == "SCOPE-1"
        ));
        assert_eq!(err.requirement_key(), Some("SCOPE-2"));

        let agreeing = yaml.replace("type: integration", "type: unit");
        let parsed = RtmDocument::parse(&agreeing, DocumentFormat::Yaml).unwrap();
        assert!(NormalizedDocument::from_document(&parsed, None).is_ok());
    }
}
