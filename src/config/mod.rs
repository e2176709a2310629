mod defaults;
mod error;
mod loader;
mod raw;

pub(crate) use error::ConfigError;
pub(crate) use loader::{current_env, initialize_configuration};
pub(crate) use raw::{ChainConfig, Config, ConfigRaw};
