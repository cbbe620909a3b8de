use anyhow::Context;
use rtm_config::RtmConfig;

/// Load `.env` from the working directory, then the layered configuration.
pub fn load_config() -> anyhow::Result<RtmConfig> {
    RtmConfig::load_with_dotenv().context("failed to load rtm configuration")
}
