//! Document → store reconciliation.
//!
//! One call is one transaction:
//!
//! 1. upsert the project (identifier preserved)
//! 2. overwrite mode only: purge everything the project owns, auditing each node
//! 3. insert missing components
//! 4. walk the tree parents-first, inserting or updating each node and its
//!    attachments, auditing every node that changed
//! 5. insert missing API endpoints
//!
//! A stored node keeps its position while the document lists it after the
//! siblings that precede it in this run. Otherwise, and for new nodes, it is
//! placed after every position already used in its sibling group. Positions
//! therefore only move when the document reorders siblings, whatever subset of
//! the tree it carries.
//!
//! The document is normalized before the transaction begins, so shape errors
//! never touch the store.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rtm_core::document::RtmDocument;
use rtm_core::document::tree::{NormalizedDocument, TreeEntry};
use rtm_core::entities::{Project, Requirement};
use rtm_core::enums::{ReconcileMode, RequirementType};
use rtm_core::ids::PREFIX_REQUIREMENT;
use rtm_core::responses::ReconcileSummary;
use rtm_core::snapshot::RequirementSnapshot;

use crate::error::{AtStage, DatabaseError, ReconcileError, ReconcileStage};
use crate::repos::attachment::clear_attachments;
use crate::repos::component::{component_ids, insert_component_if_missing};
use crate::repos::nodes::{StoredNode, load_nodes};
use crate::repos::project::upsert_project;
use crate::repos::requirement::{insert_requirement, update_requirement_row};
use crate::service::{RtmService, finish};

/// Nodes whose positions are ordered against each other: roots per
/// (component, type), everything else per parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SiblingGroup {
    Root(String, RequirementType),
    Children(String),
}

impl SiblingGroup {
    fn of(snapshot: &RequirementSnapshot) -> Self {
        match &snapshot.parent_key {
            Some(parent) => Self::Children(parent.clone()),
            None => Self::Root(snapshot.component_key.clone(), snapshot.requirement_type),
        }
    }
}

/// Position bookkeeping for one run.
#[derive(Debug, Default)]
struct Positions {
    /// Position given to the previous document node of each group.
    tail: HashMap<SiblingGroup, i64>,
    /// Highest position in use per group, stored or assigned.
    high: HashMap<SiblingGroup, i64>,
}

impl Positions {
    fn from_stored<'a>(nodes: impl IntoIterator<Item = &'a StoredNode>) -> Self {
        let mut positions = Self::default();
        for node in nodes {
            positions.raise(SiblingGroup::of(&node.snapshot), node.snapshot.position);
        }
        positions
    }

    fn raise(&mut self, group: SiblingGroup, position: i64) {
        let high = self.high.entry(group).or_insert(position);
        *high = (*high).max(position);
    }

    /// Position for `incoming`, keeping the stored one when it still sorts
    /// after the node placed before it.
    fn place(
        &mut self,
        incoming: &RequirementSnapshot,
        stored: Option<&RequirementSnapshot>,
    ) -> i64 {
        let group = SiblingGroup::of(incoming);
        let tail = self.tail.get(&group).copied();
        let position = stored
            .filter(|s| SiblingGroup::of(s) == group)
            .map(|s| s.position)
            .filter(|p| tail.is_none_or(|t| *p > t))
            .unwrap_or_else(|| self.high.get(&group).map_or(0, |h| h + 1));
        self.tail.insert(group.clone(), position);
        self.raise(group, position);
        position
    }
}

/// Per-run state of the tree walk.
struct Walk<'a> {
    project: &'a Project,
    mode: ReconcileMode,
    components: HashMap<String, String>,
    /// Stored nodes by key. Kept current as nodes are written.
    existing: HashMap<String, StoredNode>,
    positions: Positions,
    seen: HashSet<String>,
    now: DateTime<Utc>,
}

impl Walk<'_> {
    fn requirement(
        &self,
        id: String,
        entry: &TreeEntry<'_>,
        position: i64,
        component_id: String,
        parent_id: Option<String>,
    ) -> Requirement {
        let node = entry.node;
        Requirement {
            id,
            project_id: self.project.id.clone(),
            component_id,
            parent_id,
            key: node.key.clone(),
            requirement_type: entry.requirement_type,
            title: node.title.clone(),
            description: node.description.clone(),
            category: node.category.clone(),
            priority: node.priority.clone(),
            status: node.status.clone(),
            acceptance_criteria: node.acceptance_criteria.clone(),
            position,
            created_at: self.now,
            updated_at: self.now,
        }
    }
}

impl RtmService {
    /// Reconcile a parsed document into the store.
    ///
    /// `project_override` replaces the document's project key. In
    /// [`ReconcileMode::Update`] nodes are matched by key and unchanged nodes
    /// are left alone; in [`ReconcileMode::Overwrite`] the project's stored
    /// data is replaced wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] on a malformed document, an undeclared
    /// component, a duplicate key (overwrite mode), a node changing type
    /// (update mode) or any storage failure. Nothing is persisted on error.
    pub async fn reconcile(
        &self,
        document: &RtmDocument,
        project_override: Option<&str>,
        mode: ReconcileMode,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let normalized = NormalizedDocument::from_document(document, project_override)?;
        self.reconcile_normalized(&normalized, mode).await
    }

    /// Reconcile an already normalized document.
    ///
    /// # Errors
    ///
    /// Same as [`RtmService::reconcile`], minus document shape errors.
    pub async fn reconcile_normalized(
        &self,
        document: &NormalizedDocument,
        mode: ReconcileMode,
    ) -> Result<ReconcileSummary, ReconcileError> {
        tracing::debug!(
            project = %document.project.key,
            mode = %mode,
            nodes = document.node_count(),
            "reconcile started"
        );
        let tx = self.begin().await.at(ReconcileStage::Begin, None)?;
        let result = self.reconcile_in(&tx, document, mode).await;
        let summary = finish(tx, result, |source| ReconcileError::Storage {
            stage: ReconcileStage::Commit,
            key: None,
            source,
        })
        .await?;

        tracing::info!(
            project = %summary.project_key,
            mode = %mode,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            deleted = summary.deleted,
            "reconcile committed"
        );
        Ok(summary)
    }

    async fn reconcile_in(
        &self,
        conn: &libsql::Connection,
        document: &NormalizedDocument,
        mode: ReconcileMode,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let mut summary = ReconcileSummary::new(document.project.key.clone(), mode);

        let (project, _) = upsert_project(conn, self.new_project_id(), &document.project)
            .await
            .at(ReconcileStage::Project, None)?;

        if mode == ReconcileMode::Overwrite {
            summary.deleted = self
                .purge_project(conn, &project)
                .await
                .at(ReconcileStage::Purge, None)?;
        }

        for component in &document.components {
            let inserted =
                insert_component_if_missing(conn, &self.new_component_id(), &project.id, component)
                    .await
                    .at(ReconcileStage::Component, Some(&component.key))?;
            if inserted {
                summary.components_created += 1;
            }
        }

        let existing: HashMap<String, StoredNode> = match mode {
            ReconcileMode::Update => load_nodes(conn, &project.id, None)
                .await
                .at(ReconcileStage::Requirement, None)?
                .into_iter()
                .map(|n| (n.snapshot.key.clone(), n))
                .collect(),
            ReconcileMode::Overwrite => HashMap::new(),
        };
        let positions = Positions::from_stored(existing.values());
        let mut walk = Walk {
            project: &project,
            mode,
            components: component_ids(conn, &project.id)
                .await
                .at(ReconcileStage::Component, None)?,
            existing,
            positions,
            seen: HashSet::new(),
            now: Utc::now(),
        };

        for entry in document.depth_first() {
            self.reconcile_node(conn, &mut walk, &entry, &mut summary)
                .await?;
        }

        for endpoint in &document.api_endpoints {
            let inserted = self
                .insert_api_endpoint(conn, &project.id, endpoint)
                .await
                .at(ReconcileStage::ApiEndpoints, None)?;
            if inserted {
                summary.api_endpoints += 1;
            }
        }
        Ok(summary)
    }

    async fn reconcile_node(
        &self,
        conn: &libsql::Connection,
        walk: &mut Walk<'_>,
        entry: &TreeEntry<'_>,
        summary: &mut ReconcileSummary,
    ) -> Result<(), ReconcileError> {
        let node = entry.node;
        let key = node.key.as_str();

        if walk.mode == ReconcileMode::Overwrite && !walk.seen.insert(node.key.clone()) {
            return Err(ReconcileError::DuplicateKey(node.key.clone()));
        }

        let component_id = walk
            .components
            .get(&node.component_key)
            .cloned()
            .ok_or_else(|| ReconcileError::UnknownComponent {
                key: node.key.clone(),
                component: node.component_key.clone(),
            })?;
        let parent_id = match entry.parent_key {
            Some(parent) => Some(
                walk.existing
                    .get(parent)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| DatabaseError::not_found("requirement", parent))
                    .at(ReconcileStage::Requirement, Some(key))?,
            ),
            None => None,
        };
        let mut incoming = RequirementSnapshot::from_tree_entry(entry);
        if let Some(stored) = walk.existing.get(key) {
            if stored.snapshot.requirement_type != entry.requirement_type {
                return Err(ReconcileError::TypeChange {
                    key: node.key.clone(),
                    stored: stored.snapshot.requirement_type,
                    incoming: entry.requirement_type,
                });
            }
        }
        incoming.position = walk
            .positions
            .place(&incoming, walk.existing.get(key).map(|s| &s.snapshot));
        let position = incoming.position;

        match walk.existing.get(key) {
            None => {
                let requirement = walk.requirement(
                    self.new_id(PREFIX_REQUIREMENT),
                    entry,
                    position,
                    component_id,
                    parent_id,
                );
                insert_requirement(conn, &requirement)
                    .await
                    .at(ReconcileStage::Requirement, Some(key))?;
                let (implementations, links) = self
                    .write_attachments(conn, &walk.project.id, &requirement.id, node)
                    .await
                    .at(ReconcileStage::Attachments, Some(key))?;
                summary.implementations += implementations;
                summary.coverage_links += links;

                self.record_change(conn, &walk.project.key, &requirement.id, None, Some(&incoming))
                    .await
                    .at(ReconcileStage::Audit, Some(key))?;
                summary.created += 1;
                walk.existing.insert(
                    node.key.clone(),
                    StoredNode {
                        id: requirement.id,
                        parent_id: requirement.parent_id,
                        snapshot: incoming,
                    },
                );
            }
            Some(stored) if stored.snapshot == incoming => {
                summary.unchanged += 1;
            }
            Some(stored) => {
                let id = stored.id.clone();
                let previous = stored.snapshot.clone();
                let requirement =
                    walk.requirement(id.clone(), entry, position, component_id, parent_id);
                update_requirement_row(conn, &requirement)
                    .await
                    .at(ReconcileStage::Requirement, Some(key))?;

                if !previous.same_attachments(&incoming) {
                    clear_attachments(conn, &id)
                        .await
                        .at(ReconcileStage::Attachments, Some(key))?;
                    let (implementations, links) = self
                        .write_attachments(conn, &walk.project.id, &id, node)
                        .await
                        .at(ReconcileStage::Attachments, Some(key))?;
                    summary.implementations += implementations;
                    summary.coverage_links += links;
                }

                self.record_change(conn, &walk.project.key, &id, Some(&previous), Some(&incoming))
                    .await
                    .at(ReconcileStage::Audit, Some(key))?;
                summary.updated += 1;
                walk.existing.insert(
                    node.key.clone(),
                    StoredNode {
                        id,
                        parent_id: requirement.parent_id,
                        snapshot: incoming,
                    },
                );
            }
        }
        Ok(())
    }

    /// Delete everything a project owns except the project row itself.
    /// Returns the number of requirement nodes removed.
    async fn purge_project(
        &self,
        conn: &libsql::Connection,
        project: &Project,
    ) -> Result<u32, DatabaseError> {
        let nodes = load_nodes(conn, &project.id, None).await?;
        for node in &nodes {
            self.record_change(conn, &project.key, &node.id, Some(&node.snapshot), None)
                .await?;
        }

        let statements = [
            "DELETE FROM coverage_links
             WHERE requirement_id IN (SELECT id FROM requirements WHERE project_id = ?1)",
            "DELETE FROM test_cases
             WHERE test_file_id IN (SELECT id FROM test_files WHERE project_id = ?1)",
            "DELETE FROM test_files WHERE project_id = ?1",
            "DELETE FROM implementations
             WHERE requirement_id IN (SELECT id FROM requirements WHERE project_id = ?1)",
            "DELETE FROM requirements WHERE project_id = ?1",
            "DELETE FROM api_endpoints WHERE project_id = ?1",
            "DELETE FROM components WHERE project_id = ?1",
        ];
        for sql in statements {
            conn.execute(sql, [project.id.as_str()]).await?;
        }

        tracing::debug!(project = %project.key, nodes = nodes.len(), "project purged");
        Ok(u32::try_from(nodes.len()).unwrap_or(u32::MAX))
    }
}
