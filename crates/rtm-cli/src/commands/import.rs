use anyhow::Context;
use rtm_core::document::{DocumentFormat, RtmDocument};
use rtm_core::enums::ReconcileMode;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm import`.
pub async fn handle(args: &ImportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let format = DocumentFormat::from_path(&args.file)?;
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let document = RtmDocument::parse(&text, format)?;

    let mode = resolve_mode(args, ctx.config.import.default_mode);
    let summary = ctx
        .service
        .reconcile(&document, args.project.as_deref(), mode)
        .await
        .with_context(|| format!("import of {} failed", args.file.display()))?;

    if summary.is_noop() {
        tracing::info!(project = %summary.project_key, "import changed no requirements");
    }
    output(&summary, flags.format)
}

const fn resolve_mode(args: &ImportArgs, configured: ReconcileMode) -> ReconcileMode {
    if args.overwrite {
        ReconcileMode::Overwrite
    } else if args.update {
        ReconcileMode::Update
    } else {
        configured
    }
}
