use std::fs;
use std::path::Path;

use thiserror::Error;

use super::merge::apply_env_overrides;
use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load the config file at `path` and apply environment overrides.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load `path` when given and readable, otherwise fall back to defaults.
/// Environment overrides apply either way.
pub fn load_or_default(path: Option<&Path>) -> Config {
    match path {
        Some(path) if path.exists() => match load_from(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("config load failed, using defaults: {err}");
                defaults_with_env()
            }
        },
        _ => defaults_with_env(),
    }
}

fn defaults_with_env() -> Config {
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    config
}
