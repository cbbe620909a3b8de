use rtm_config::{ENV_PREFIX, RtmConfig};

/// Config sections reachable through `RTM_<SECTION>__<FIELD>`.
const SECTIONS: [&str; 3] = ["DATABASE", "IMPORT", "GENERAL"];

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &RtmConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &RtmConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();
    for section in SECTIONS {
        let prefix = format!("{ENV_PREFIX}{section}");
        let nested = format!("{prefix}__");
        let mistyped = env_keys
            .iter()
            .any(|key| key.starts_with(&prefix) && !key.starts_with(&nested));
        if !mistyped {
            continue;
        }
        if section == "DATABASE" && !config.database.path.is_empty() {
            continue;
        }
        warnings.push(format!(
            "{prefix}* env vars exist without a double underscore and are ignored. Use {nested}<FIELD> (example: {ENV_PREFIX}DATABASE__PATH)."
        ));
    }
    warnings
}
