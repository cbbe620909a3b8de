//! Import defaults.

use rtm_core::enums::ReconcileMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Mode used by `rtm import` when neither `--overwrite` nor `--update` is
    /// given.
    #[serde(default)]
    pub default_mode: ReconcileMode,
}
