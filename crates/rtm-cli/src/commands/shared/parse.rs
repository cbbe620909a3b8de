use rtm_core::enums::RequirementType;
use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse `scope`, `user-story`, `TECH_SPEC` and similar spellings.
pub fn parse_requirement_type(raw: &str) -> anyhow::Result<RequirementType> {
    raw.replace('-', "_")
        .parse::<RequirementType>()
        .map_err(|_| {
            anyhow::anyhow!("invalid type '{raw}': expected scope, user-story or tech-spec")
        })
}

/// `Some("")` means "clear the field"; `None` leaves it unchanged.
#[must_use]
pub fn clearable(raw: Option<&str>) -> Option<Option<String>> {
    raw.map(|value| {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}
