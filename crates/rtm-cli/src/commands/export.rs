use std::path::Path;

use anyhow::Context;
use rtm_core::document::DocumentFormat;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rtm export`.
///
/// Without `--output` the document itself goes to stdout, regardless of
/// `--format`; with it, a short receipt is printed instead.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let document = ctx.service.export(&args.project).await?;
    let format = target_format(args.yaml, args.output.as_deref());
    let text = document.render(format)?;

    let Some(path) = args.output.as_deref() else {
        println!("{}", text.trim_end());
        return Ok(());
    };

    std::fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
    if flags.quiet {
        return Ok(());
    }
    output(
        &json!({
            "project_key": args.project,
            "path": path.display().to_string(),
            "format": format.as_str(),
            "requirements": document.requirements.len(),
        }),
        flags.format,
    )
}

fn target_format(yaml: bool, output: Option<&Path>) -> DocumentFormat {
    if yaml {
        return DocumentFormat::Yaml;
    }
    output
        .and_then(|path| DocumentFormat::from_path(path).ok())
        .unwrap_or(DocumentFormat::Json)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rtm_core::document::DocumentFormat;

    use super::target_format;

    #[test]
    fn yaml_flag_or_extension_selects_yaml() {
        assert_eq!(target_format(true, None), DocumentFormat::Yaml);
        assert_eq!(
            target_format(false, Some(Path::new("out/rtm.yml"))),
            DocumentFormat::Yaml
        );
    }

    #[test]
    fn json_is_the_default() {
        assert_eq!(target_format(false, None), DocumentFormat::Json);
        assert_eq!(
            target_format(false, Some(Path::new("rtm.txt"))),
            DocumentFormat::Json
        );
    }
}
