use super::error::ConfigError;
use crate::utils::env::get_env_value;
use common::server::config::AgentConfig;
use log::error;
use std::str::from_utf8;
use tokio::fs::read;

const PLACEHOLDERS: [&str; 2] = ["your_registry_url_here", "your_registry_key_here"];

/// Load the agent TOML config, apply environment overrides, and validate the
/// registry credentials. Any failure here aborts startup
pub(crate) async fn load_config(path: &str) -> Result<AgentConfig, ConfigError> {
    let mut config = read_config(path).await?;
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Read and parse the agent TOML config file
async fn read_config(path: &str) -> Result<AgentConfig, ConfigError> {
    let buffer = match read(path).await {
        Ok(result) => result,
        Err(err) => {
            error!("[configuration] Failed to read config at {path}: {err:?}");
            return Err(ConfigError::ReadFile);
        }
    };

    let config = match toml::from_str(from_utf8(&buffer).unwrap_or_default()) {
        Ok(result) => result,
        Err(err) => {
            error!("[configuration] Failed to parse config at {path}: {err:?}");
            return Err(ConfigError::BadToml);
        }
    };

    Ok(config)
}

/// Environment variables take precedence over file values for the registry
/// credentials
fn apply_env_overrides(config: &mut AgentConfig) {
    let url = get_env_value("GRIDPULSE_REGISTRY_URL");
    if !url.is_empty() {
        config.registry.url = url;
    }

    let api_key = get_env_value("GRIDPULSE_REGISTRY_KEY");
    if !api_key.is_empty() {
        config.registry.api_key = api_key;
    }
}

fn validate(config: &AgentConfig) -> Result<(), ConfigError> {
    if config.registry.url.is_empty() || config.registry.api_key.is_empty() {
        error!("[configuration] Missing registry url or api key");
        error!("[configuration] Set them in the config file or via GRIDPULSE_REGISTRY_URL / GRIDPULSE_REGISTRY_KEY");
        return Err(ConfigError::MissingCredentials);
    }

    if PLACEHOLDERS.contains(&config.registry.url.as_str())
        || PLACEHOLDERS.contains(&config.registry.api_key.as_str())
    {
        error!("[configuration] Update the config with your actual registry credentials");
        return Err(ConfigError::PlaceholderCredentials);
    }

    Ok(())
}
