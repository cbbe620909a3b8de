use rtm_core::entities::{ImplementationRecord, Requirement};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ShowArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ShowResponse {
    requirement: Requirement,
    children: Vec<String>,
    implementations: Vec<ImplementationRecord>,
}

/// Handle `rtm show`.
pub async fn handle(args: &ShowArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let requirement = ctx
        .service
        .get_requirement(&args.project, &args.key)
        .await?;
    let children = ctx
        .service
        .child_requirements(&args.project, &args.key)
        .await?
        .into_iter()
        .map(|child| child.key)
        .collect();
    let implementations = ctx
        .service
        .list_implementations(&args.project, &args.key)
        .await?;

    output(
        &ShowResponse {
            requirement,
            children,
            implementations,
        },
        flags.format,
    )
}
