//! Base layer every load starts from.

use crate::config::AgoraConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the serialized defaults, so later sources only need to
/// name the keys they override.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&AgoraConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
