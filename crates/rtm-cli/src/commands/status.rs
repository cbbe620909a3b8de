use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::StatusArgs;
use crate::commands::projects::ProjectRow;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    project: ProjectRow,
    description: Option<String>,
    repository: Option<String>,
    api_endpoints: usize,
    test_files: usize,
    audit_entries: u32,
    store: String,
}

/// Handle `rtm status`.
pub async fn handle(args: &StatusArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let summary = ctx.service.project_summary(&args.project).await?;
    let description = summary.project.description.clone();
    let repository = summary.project.repository.clone();
    let api_endpoints = ctx.service.list_api_endpoints(&args.project).await?.len();
    let test_files = ctx.service.list_test_files(&args.project).await?.len();
    let audit_entries = ctx.service.count_audit(&args.project).await?;

    output(
        &StatusResponse {
            project: ProjectRow::from(summary),
            description,
            repository,
            api_endpoints,
            test_files,
            audit_entries,
            store: ctx.db_path.display().to_string(),
        },
        flags.format,
    )
}
