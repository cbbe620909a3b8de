use rtm_db::updates::requirement::{RequirementUpdate, RequirementUpdateBuilder};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::UpdateArgs;
use crate::commands::shared::parse::clearable;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm update`.
pub async fn handle(args: &UpdateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let update = to_update(args)?;
    let requirement = ctx
        .service
        .update_requirement(&args.project, &args.key, &update)
        .await?;
    output(&requirement, flags.format)
}

fn to_update(args: &UpdateArgs) -> anyhow::Result<RequirementUpdate> {
    let mut builder = RequirementUpdateBuilder::new();
    if let Some(title) = args.title.as_deref() {
        let title = title.trim();
        if title.is_empty() {
            anyhow::bail!("--title must not be empty");
        }
        builder = builder.title(title);
    }
    if let Some(description) = clearable(args.description.as_deref()) {
        builder = builder.description(description);
    }
    if let Some(category) = clearable(args.category.as_deref()) {
        builder = builder.category(category);
    }
    if let Some(priority) = clearable(args.priority.as_deref()) {
        builder = builder.priority(priority);
    }
    if let Some(status) = clearable(args.status.as_deref()) {
        builder = builder.status(status);
    }
    if args.clear_criteria {
        builder = builder.acceptance_criteria(Vec::new());
    } else if !args.acceptance_criteria.is_empty() {
        builder = builder.acceptance_criteria(args.acceptance_criteria.clone());
    }

    let update = builder.build();
    if update.is_empty() {
        anyhow::bail!("nothing to update: pass at least one field flag");
    }
    Ok(update)
}
