use crate::cli::GlobalFlags;
use crate::cli::root_commands::DeleteProjectArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm delete-project`. The audit trail of the project is kept.
pub async fn handle(
    args: &DeleteProjectArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let response = ctx.service.delete_project(&args.project).await?;
    output(&response, flags.format)
}
