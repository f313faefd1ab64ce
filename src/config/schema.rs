use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fallback when neither the primary nor the deprecated server key is set.
pub const DEFAULT_SERVER_NAME: &str = "server1";

const DEFAULT_TICK_INTERVAL_MS: u64 = 500;
const DEFAULT_FETCHER_CACHE_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the server this instance authorizes for.
    pub server_name: Option<String>,
    /// Deprecated key for `server_name`, kept for older deployments.
    pub server: Option<String>,
    /// Maintain the path image alongside permissions.
    pub hdfs_sync_enabled: bool,
    /// Subscribe to the force-refresh pub/sub topic.
    pub full_update_subscribe_enabled: bool,
    pub tick_interval_ms: u64,
    pub fetcher_cache_size: usize,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: None,
            server: None,
            hdfs_sync_enabled: true,
            full_update_subscribe_enabled: false,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            fetcher_cache_size: DEFAULT_FETCHER_CACHE_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// The effective server name: primary key, then the deprecated key,
    /// then the hard default.
    pub fn resolved_server_name(&self) -> String {
        self.server_name
            .clone()
            .or_else(|| self.server.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    /// `tracing` EnvFilter directive, e.g. `"permsync=debug"`.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            filter: None,
        }
    }
}
