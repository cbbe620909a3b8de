//! Store → document export.
//!
//! Reads every node of a project in one pass, indexes children by parent id and
//! rebuilds the typed tree top-down. Roots are ordered by component declaration
//! order, then level (scopes first), then stored position, so a re-import of
//! the export reproduces the same snapshots.

use std::collections::HashMap;

use chrono::Utc;
use rtm_core::document::tree::{
    NormalizedDocument, RootNode, ScopeNode, TechSpecNode, UserStoryNode,
};
use rtm_core::document::{ApiEndpointSpec, ComponentSpec, DocumentMetadata, ProjectSpec, RtmDocument};
use rtm_core::entities::Component;
use rtm_core::enums::RequirementType;

use crate::error::DatabaseError;
use crate::repos::api_endpoint::list_api_endpoints_in;
use crate::repos::component::list_components_in;
use crate::repos::nodes::{StoredNode, load_nodes};
use crate::repos::project::require_project;
use crate::service::{RtmService, finish};

const GENERATOR: &str = concat!("rtm ", env!("CARGO_PKG_VERSION"));

fn type_rank(t: RequirementType) -> usize {
    RequirementType::ALL.iter().position(|x| *x == t).unwrap_or(usize::MAX)
}

/// Stored nodes indexed for top-down assembly.
struct Forest {
    children: HashMap<String, Vec<StoredNode>>,
}

impl Forest {
    fn take_children(&mut self, parent_id: &str, t: RequirementType) -> Vec<StoredNode> {
        let mut children: Vec<StoredNode> = self
            .children
            .remove(parent_id)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| n.snapshot.requirement_type == t)
            .collect();
        children.sort_by(|a, b| {
            (a.snapshot.position, &a.snapshot.key).cmp(&(b.snapshot.position, &b.snapshot.key))
        });
        children
    }

    fn scope(&mut self, node: StoredNode) -> ScopeNode {
        let user_stories = self
            .take_children(&node.id, RequirementType::UserStory)
            .into_iter()
            .map(|n| self.user_story(n))
            .collect();
        ScopeNode {
            node: node.snapshot.into_node_spec(),
            user_stories,
        }
    }

    fn user_story(&mut self, node: StoredNode) -> UserStoryNode {
        let tech_specs = self
            .take_children(&node.id, RequirementType::TechSpec)
            .into_iter()
            .map(|n| TechSpecNode {
                node: n.snapshot.into_node_spec(),
            })
            .collect();
        UserStoryNode {
            node: node.snapshot.into_node_spec(),
            tech_specs,
        }
    }
}

fn assemble(components: &[Component], nodes: Vec<StoredNode>) -> Vec<RootNode> {
    let total = nodes.len();
    let component_rank: HashMap<&str, usize> = components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.key.as_str(), i))
        .collect();

    let mut roots = Vec::new();
    let mut children: HashMap<String, Vec<StoredNode>> = HashMap::new();
    for node in nodes {
        match node.parent_id.clone() {
            Some(parent) => children.entry(parent).or_default().push(node),
            None => roots.push(node),
        }
    }
    roots.sort_by_key(|n| {
        (
            component_rank
                .get(n.snapshot.component_key.as_str())
                .copied()
                .unwrap_or(usize::MAX),
            type_rank(n.snapshot.requirement_type),
            n.snapshot.position,
            n.snapshot.key.clone(),
        )
    });

    let mut forest = Forest { children };
    let tree: Vec<RootNode> = roots
        .into_iter()
        .map(|n| match n.snapshot.requirement_type {
            RequirementType::Scope => RootNode::Scope(forest.scope(n)),
            RequirementType::UserStory => RootNode::UserStory(forest.user_story(n)),
            RequirementType::TechSpec => RootNode::TechSpec(TechSpecNode {
                node: n.snapshot.into_node_spec(),
            }),
        })
        .collect();

    let left_over: usize = forest.children.values().map(Vec::len).sum();
    if left_over > 0 {
        tracing::warn!(
            total,
            left_over,
            "stored nodes under a parent of the wrong type were not exported"
        );
    }
    tree
}

impl RtmService {
    /// Export a project as a document that re-imports to the same state.
    ///
    /// The document uses the nested `requirements`/`children` shape and
    /// carries a `metadata` stamp with the generation time.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the project does not exist.
    pub async fn export(&self, project_key: &str) -> Result<RtmDocument, DatabaseError> {
        let tx = self.begin().await?;
        let result = Self::export_in(&tx, project_key).await;
        let document = finish(tx, result, |e| e).await?;
        tracing::info!(project = project_key, "project exported");
        Ok(document)
    }

    async fn export_in(
        conn: &libsql::Connection,
        project_key: &str,
    ) -> Result<RtmDocument, DatabaseError> {
        let project = require_project(conn, project_key).await?;
        let components = list_components_in(conn, &project.id).await?;
        let nodes = load_nodes(conn, &project.id, None).await?;
        let endpoints = list_api_endpoints_in(conn, &project.id).await?;

        let normalized = NormalizedDocument {
            project: ProjectSpec {
                key: project.key,
                name: project.name,
                description: project.description,
                repository: project.repository,
                version: project.version,
            },
            roots: assemble(&components, nodes),
            components: components
                .into_iter()
                .map(|c| ComponentSpec {
                    key: c.key,
                    name: c.name,
                    component_type: c.component_type,
                    technology: c.technology,
                    description: c.description,
                })
                .collect(),
            api_endpoints: endpoints
                .into_iter()
                .map(|e| ApiEndpointSpec {
                    method: e.method,
                    path: e.path,
                    handler: e.handler,
                    description: e.description,
                })
                .collect(),
        };

        let mut document = normalized.to_document();
        document.metadata = Some(DocumentMetadata {
            generated_at: Some(Utc::now().to_rfc3339()),
            generated_by: Some(GENERATOR.to_string()),
            project: None,
        });
        Ok(document)
    }
}
