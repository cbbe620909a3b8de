use crate::cli::GlobalFlags;
use crate::cli::root_commands::DeleteArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm delete`. Removes the node and its whole subtree.
pub async fn handle(args: &DeleteArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = ctx
        .service
        .delete_requirement(&args.project, &args.key)
        .await?;
    output(&response, flags.format)
}
