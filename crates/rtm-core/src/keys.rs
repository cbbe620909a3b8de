//! Human-facing requirement key conventions.
//!
//! ```text
//! SCOPE-<n>                 numbered per (project, component)
//! <scope key>-US-<n>        numbered per parent scope
//! <user story key>-TS-<n>   numbered per parent user story
//! ```
//!
//! The number of an existing key is its run of trailing ASCII digits. A new key
//! takes the largest number found among its siblings plus one; siblings without
//! a trailing number are ignored, and no numbered siblings yields `1`. A sibling
//! already numbered `u64::MAX` leaves no next key.

use crate::enums::RequirementType;
use crate::errors::CoreError;

pub const SCOPE_PREFIX: &str = "SCOPE-";
pub const USER_STORY_INFIX: &str = "-US-";
pub const TECH_SPEC_INFIX: &str = "-TS-";

/// Trailing decimal number of `key`, e.g. `SCOPE-1-US-12` → `12`.
///
/// Returns `None` when the key does not end in a digit or the number does not
/// fit in a `u64`.
#[must_use]
pub fn numeric_suffix(key: &str) -> Option<u64> {
    let digits_start = key
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    key[digits_start..].parse().ok()
}

/// Next key after `siblings` under `prefix`.
///
/// ```
/// use rtm_core::keys::next_key;
///
/// assert_eq!(next_key("SCOPE-", Vec::<&str>::new()).unwrap(), "SCOPE-1");
/// assert_eq!(next_key("SCOPE-", ["SCOPE-2", "SCOPE-10", "SCOPE-9"]).unwrap(), "SCOPE-11");
/// ```
///
/// # Errors
///
/// Returns `CoreError::Validation` when the largest sibling number is
/// `u64::MAX`.
pub fn next_key<I, S>(prefix: &str, siblings: I) -> Result<String, CoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max = siblings
        .into_iter()
        .filter_map(|k| numeric_suffix(k.as_ref()))
        .max()
        .unwrap_or(0);
    let next = max.checked_add(1).ok_or_else(|| {
        CoreError::Validation(format!("key numbering under '{prefix}' is exhausted"))
    })?;
    Ok(format!("{prefix}{next}"))
}

/// Key prefix for a new node of type `requirement_type`.
///
/// # Errors
///
/// Returns `CoreError::Validation` when a `UserStory` or `TechSpec` is given no
/// parent key.
pub fn key_prefix(
    requirement_type: RequirementType,
    parent_key: Option<&str>,
) -> Result<String, CoreError> {
    match (requirement_type, parent_key) {
        (RequirementType::Scope, _) => Ok(SCOPE_PREFIX.to_string()),
        (RequirementType::UserStory, Some(parent)) => Ok(format!("{parent}{USER_STORY_INFIX}")),
        (RequirementType::TechSpec, Some(parent)) => Ok(format!("{parent}{TECH_SPEC_INFIX}")),
        (t, None) => Err(CoreError::Validation(format!(
            "a parent requirement is required to generate a {t} key"
        ))),
    }
}
