//! Configuration loading.
//!
//! Sources are layered, later ones winning:
//! 1. built-in defaults
//! 2. a config file (`cogni.toml` in the working directory, or an explicit path)
//! 3. `COGNI_*` environment variables, e.g. `COGNI_BASE_URL`

use std::collections::HashMap;
use std::path::Path;

use cogni_application::{ClientConfig, ConfigValidationError};
use config::{Config, Environment, File};
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "COGNI";

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "cogni";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged configuration is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigValidationError),
}

/// Loads and validates the client configuration.
///
/// An explicit `path` must exist; the default `cogni.toml` is optional.
///
/// # Errors
///
/// Returns [`ConfigError`] if a source is unreadable or the result does not
/// validate.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    load_with_env(path, None)
}

fn load_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ClientConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config: ClientConfig = Config::builder()
        .add_source(Config::try_from(&ClientConfig::default())?)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    tracing::debug!(base_url = %config.base_url, "Configuration loaded");
    Ok(config)
}
