//! Layered configuration: an optional `config/mcp` file, then `MCP_`
//! environment variables (`__` separates nested keys, e.g.
//! `MCP_CLIENT__CLOSE_TIMEOUT_MS`), merged over the built-in defaults.

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{BrokerSettings, ClientSettings, LoggingSettings, Settings};

const DEFAULT_CONFIG_FILE: &str = "config/mcp";

/// Loads settings from the default file location and the environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_FILE)
}

/// Loads settings from `path` (extension optional, file optional) and the
/// environment. Environment values win over the file.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("MCP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_with_defaults())
}

#[cfg(test)]
mod tests;
