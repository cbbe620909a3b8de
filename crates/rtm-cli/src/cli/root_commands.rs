use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Reconcile a JSON or YAML document into the store.
    Import(ImportArgs),
    /// Write a project back out as a document.
    Export(ExportArgs),
    /// List projects with requirement counts.
    Projects,
    /// Counts for one project.
    Status(StatusArgs),
    /// Audit trail of requirement changes.
    Audit(AuditArgs),
    /// Show the key the next requirement would get.
    #[command(name = "next-key")]
    NextKey(NextKeyArgs),
    /// Create one requirement.
    Create(CreateArgs),
    /// Change fields of one requirement.
    Update(UpdateArgs),
    /// List requirements of a project, or the children of one requirement.
    List(ListArgs),
    /// Show one requirement with its implementation records.
    Show(ShowArgs),
    /// Delete a requirement and its subtree.
    Delete(DeleteArgs),
    /// Delete a project and everything under it.
    #[command(name = "delete-project")]
    DeleteProject(DeleteProjectArgs),
    /// Print the JSON schema of a document or response type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// Document to import (`.json`, `.yaml` or `.yml`).
    pub file: PathBuf,
    /// Project key, overriding the one in the document.
    #[arg(long)]
    pub project: Option<String>,
    /// Replace all stored data of the project.
    #[arg(long, conflicts_with = "update")]
    pub overwrite: bool,
    /// Upsert by requirement key (default unless configured otherwise).
    #[arg(long)]
    pub update: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    pub project: String,
    /// Write to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Emit YAML (implied by a `.yaml`/`.yml` output file).
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Clone, Debug, Args)]
pub struct StatusArgs {
    pub project: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    pub project: String,
    /// Only entries for this requirement key.
    #[arg(long)]
    pub key: Option<String>,
    /// Only entries of this change kind (created, updated, deleted).
    #[arg(long)]
    pub change: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct NextKeyArgs {
    pub project: String,
    /// scope, user-story or tech-spec.
    #[arg(long = "type")]
    pub requirement_type: String,
    /// Component of a scope.
    #[arg(long)]
    pub component: Option<String>,
    /// Parent of a user story or tech spec.
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    pub project: String,
    /// scope, user-story or tech-spec.
    #[arg(long = "type")]
    pub requirement_type: String,
    #[arg(long)]
    pub title: String,
    /// Required for roots; inherited from the parent otherwise.
    #[arg(long)]
    pub component: Option<String>,
    #[arg(long)]
    pub parent: Option<String>,
    /// Explicit key; generated when omitted.
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// Acceptance criterion; repeat for several.
    #[arg(long = "criterion")]
    pub acceptance_criteria: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArgs {
    pub project: String,
    pub key: String,
    #[arg(long)]
    pub title: Option<String>,
    /// New description; an empty value clears it.
    #[arg(long)]
    pub description: Option<String>,
    /// New category; an empty value clears it.
    #[arg(long)]
    pub category: Option<String>,
    /// New priority; an empty value clears it.
    #[arg(long)]
    pub priority: Option<String>,
    /// New status; an empty value clears it.
    #[arg(long)]
    pub status: Option<String>,
    /// Replacement acceptance criterion; repeat for several.
    #[arg(long = "criterion")]
    pub acceptance_criteria: Vec<String>,
    /// Remove all acceptance criteria.
    #[arg(long, conflicts_with = "acceptance_criteria")]
    pub clear_criteria: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ListArgs {
    pub project: String,
    /// Only requirements of this type.
    #[arg(long = "type")]
    pub requirement_type: Option<String>,
    /// Only direct children of this requirement.
    #[arg(long, conflicts_with = "requirement_type")]
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ShowArgs {
    pub project: String,
    pub key: String,
}

#[derive(Clone, Debug, Args)]
pub struct DeleteArgs {
    pub project: String,
    pub key: String,
}

#[derive(Clone, Debug, Args)]
pub struct DeleteProjectArgs {
    pub project: String,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// document, summary, project-summary, audit-entry, requirement, snapshot
    #[arg(default_value = "document")]
    pub type_name: String,
}
