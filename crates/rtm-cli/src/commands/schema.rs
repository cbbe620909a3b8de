use anyhow::bail;
use rtm_core::document::RtmDocument;
use rtm_core::entities::{AuditEntry, Requirement};
use rtm_core::responses::{ProjectSummary, ReconcileSummary};
use rtm_core::snapshot::RequirementSnapshot;
use schemars::schema_for;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Type names accepted by `rtm schema`.
pub const SCHEMA_TYPES: [&str; 6] = [
    "document",
    "summary",
    "project-summary",
    "audit-entry",
    "requirement",
    "snapshot",
];

/// Handle `rtm schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_value(&args.type_name)?;
    output(&schema, flags.format)
}

fn schema_value(type_name: &str) -> anyhow::Result<serde_json::Value> {
    let schema = match type_name.replace('_', "-").as_str() {
        "document" => schema_for!(RtmDocument),
        "summary" => schema_for!(ReconcileSummary),
        "project-summary" => schema_for!(ProjectSummary),
        "audit-entry" => schema_for!(AuditEntry),
        "requirement" => schema_for!(Requirement),
        "snapshot" => schema_for!(RequirementSnapshot),
        _ => bail!(
            "unknown schema type '{type_name}'; expected one of: {}",
            SCHEMA_TYPES.join(", ")
        ),
    };
    Ok(serde_json::to_value(schema)?)
}
