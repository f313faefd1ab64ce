//! Environment overrides, applied on top of whatever the file provided.

use super::Config;

pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(value) = std::env::var("PERMSYNC_SERVER_NAME") {
        if !value.is_empty() {
            config.server_name = Some(value);
        }
    }
    if let Some(value) = env_bool("PERMSYNC_HDFS_SYNC_ENABLED") {
        config.hdfs_sync_enabled = value;
    }
    if let Some(value) = env_bool("PERMSYNC_FULL_UPDATE_SUBSCRIBE_ENABLED") {
        config.full_update_subscribe_enabled = value;
    }
    if let Ok(raw) = std::env::var("PERMSYNC_TICK_INTERVAL_MS") {
        match raw.parse::<u64>() {
            Ok(value) => config.tick_interval_ms = value,
            Err(err) => {
                tracing::warn!("invalid PERMSYNC_TICK_INTERVAL_MS, ignoring: {err}");
            }
        }
    }
    if let Ok(raw) = std::env::var("PERMSYNC_FETCHER_CACHE_SIZE") {
        match raw.parse::<usize>() {
            Ok(value) => config.fetcher_cache_size = value,
            Err(err) => {
                tracing::warn!("invalid PERMSYNC_FETCHER_CACHE_SIZE, ignoring: {err}");
            }
        }
    }
    if let Ok(value) = std::env::var("PERMSYNC_LOG_FILTER") {
        if !value.is_empty() {
            config.logging.filter = Some(value);
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<bool>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("invalid {key}, ignoring: {err}");
            None
        }
    }
}
