use rtm_core::entities::Requirement;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ListArgs;
use crate::commands::shared::parse::parse_requirement_type;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct RequirementListResponse {
    requirements: Vec<Requirement>,
}

/// Handle `rtm list`.
///
/// Lists are complete unless `--limit` is passed; `general.default_limit`
/// does not apply here.
pub async fn handle(args: &ListArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut requirements = if let Some(parent) = args.parent.as_deref() {
        ctx.service
            .child_requirements(&args.project, parent)
            .await?
    } else {
        let requirement_type = args
            .requirement_type
            .as_deref()
            .map(parse_requirement_type)
            .transpose()?;
        ctx.service
            .list_requirements(&args.project, requirement_type)
            .await?
    };

    if let Some(limit) = flags.limit {
        requirements.truncate(usize::try_from(limit)?);
    }
    output(&RequirementListResponse { requirements }, flags.format)
}
