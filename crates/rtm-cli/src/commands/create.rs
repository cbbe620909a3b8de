use rtm_db::repos::requirement::NewRequirement;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CreateArgs;
use crate::commands::shared::parse::parse_requirement_type;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm create`.
pub async fn handle(args: &CreateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let new = to_new_requirement(args)?;
    let requirement = ctx.service.create_requirement(&new).await?;
    output(&requirement, flags.format)
}

fn to_new_requirement(args: &CreateArgs) -> anyhow::Result<NewRequirement> {
    let requirement_type = parse_requirement_type(&args.requirement_type)?;
    let title = args.title.trim();
    if title.is_empty() {
        anyhow::bail!("--title must not be empty");
    }
    Ok(NewRequirement {
        component_key: args.component.clone(),
        parent_key: args.parent.clone(),
        key: args.key.clone(),
        description: args.description.clone(),
        category: args.category.clone(),
        priority: args.priority.clone(),
        status: args.status.clone(),
        acceptance_criteria: args.acceptance_criteria.clone(),
        ..NewRequirement::new(args.project.as_str(), requirement_type, title)
    })
}
