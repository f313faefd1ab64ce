//! Configuration schema, file loading, and environment overrides.

mod load;
mod merge;
mod schema;

pub use load::{ConfigError, load_from, load_or_default};
pub use merge::apply_env_overrides;
pub use schema::{Config, DEFAULT_SERVER_NAME, LoggingConfig};
