use rtm_core::entities::AuditEntry;
use rtm_core::enums::ChangeKind;
use rtm_db::repos::audit::AuditFilter;
use serde::Serialize;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct AuditResponse {
    entries: Vec<AuditEntry>,
}

/// Compact audit line for table output; snapshots stay in JSON output.
#[derive(Debug, Serialize)]
struct AuditRow {
    requirement_key: String,
    change: ChangeKind,
    title: Option<String>,
    at: String,
}

#[derive(Debug, Serialize)]
struct AuditTable {
    entries: Vec<AuditRow>,
}

/// Handle `rtm audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    // Unknown projects fail here rather than printing an empty trail.
    ctx.service.get_project(&args.project).await?;

    let change = args
        .change
        .as_deref()
        .map(|value| parse_enum::<ChangeKind>(value, "change"))
        .transpose()?;
    let filter = AuditFilter {
        project_key: Some(args.project.clone()),
        requirement_key: args.key.clone(),
        change,
        limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
        ..Default::default()
    };
    let entries = ctx.service.query_audit(&filter).await?;

    if flags.format == OutputFormat::Table {
        let entries = entries.into_iter().map(to_row).collect();
        return output(&AuditTable { entries }, flags.format);
    }
    output(&AuditResponse { entries }, flags.format)
}

fn to_row(entry: AuditEntry) -> AuditRow {
    let title = entry
        .new_state
        .as_ref()
        .or(entry.old_state.as_ref())
        .and_then(|state| state.get("title"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);
    AuditRow {
        requirement_key: entry.requirement_key,
        change: entry.change,
        title,
        at: entry.created_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rtm_core::entities::AuditEntry;
    use rtm_core::enums::ChangeKind;
    use serde_json::json;

    use super::to_row;

    #[test]
    fn deleted_entries_take_title_from_old_state() {
        let entry = AuditEntry {
            id: "aud-1".into(),
            project_key: "p1".into(),
            requirement_id: "req-1".into(),
            requirement_key: "SCOPE-1".into(),
            change: ChangeKind::Deleted,
            old_state: Some(json!({"title": "Accounts"})),
            new_state: None,
            created_at: Utc::now(),
        };
        let row = to_row(entry);
        assert_eq!(row.title.as_deref(), Some("Accounts"));
        assert_eq!(row.change, ChangeKind::Deleted);
    }
}
