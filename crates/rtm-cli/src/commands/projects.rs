use rtm_core::responses::ProjectSummary;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// One flattened line of `rtm projects`.
#[derive(Debug, Serialize)]
pub struct ProjectRow {
    pub key: String,
    pub name: String,
    pub version: Option<String>,
    pub components: u32,
    pub scopes: u32,
    pub user_stories: u32,
    pub tech_specs: u32,
    pub implementations: u32,
    pub test_cases: u32,
    pub coverage_links: u32,
}

impl From<ProjectSummary> for ProjectRow {
    fn from(summary: ProjectSummary) -> Self {
        Self {
            key: summary.project.key,
            name: summary.project.name,
            version: summary.project.version,
            components: summary.components,
            scopes: summary.scopes,
            user_stories: summary.user_stories,
            tech_specs: summary.tech_specs,
            implementations: summary.implementations,
            test_cases: summary.test_cases,
            coverage_links: summary.coverage_links,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProjectListResponse {
    projects: Vec<ProjectRow>,
}

/// Handle `rtm projects`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let projects = ctx
        .service
        .list_projects()
        .await?
        .into_iter()
        .map(ProjectRow::from)
        .collect();
    output(&ProjectListResponse { projects }, flags.format)
}
