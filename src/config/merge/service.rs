//! MergeService: orchestrates sources, applies merge policy, deserializes to AgoraConfig.

use crate::config::sources::{environment, file};
use crate::config::AgoraConfig;
use config::ConfigError;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> environment (highest).
    pub fn load() -> Result<AgoraConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = file::add_global_to_builder(builder)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Precedence: defaults -> `path` -> environment. The global file is skipped.
    pub fn load_from_file(path: &Path) -> Result<AgoraConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = file::add_explicit_to_builder(builder, path)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}
