use crate::cli::GlobalFlags;
use crate::cli::root_commands::NextKeyArgs;
use crate::commands::shared::parse::parse_requirement_type;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm next-key`.
pub async fn handle(args: &NextKeyArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let requirement_type = parse_requirement_type(&args.requirement_type)?;
    let next = ctx
        .service
        .generate_key(
            &args.project,
            args.component.as_deref(),
            requirement_type,
            args.parent.as_deref(),
        )
        .await?;
    output(&next, flags.format)
}
