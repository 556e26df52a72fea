//! Loads `DeployConfig` from `ECHO_DEPLOY_*` environment variables.

use anyhow::{Context, Result};

use crate::domain::DeployConfig;

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "ECHO_DEPLOY_";

/// Load and validate configuration from the process environment.
///
/// Each field maps to `ECHO_DEPLOY_<FIELD>`; unset fields keep their defaults.
///
/// # Errors
///
/// Returns an error if a variable cannot be parsed or validation fails.
pub fn load() -> Result<DeployConfig> {
    load_from(std::env::vars())
}

/// Load and validate configuration from explicit `(name, value)` pairs.
///
/// # Errors
///
/// Returns an error if a variable cannot be parsed or validation fails.
pub fn load_from(vars: impl IntoIterator<Item = (String, String)>) -> Result<DeployConfig> {
    let config: DeployConfig = envy::prefixed(ENV_PREFIX)
        .from_iter(vars)
        .with_context(|| format!("failed to load config from {ENV_PREFIX}* env vars"))?;
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
