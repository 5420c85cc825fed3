//! Agent configuration validation owned by the agent domain.

use super::record::AgentConfig;
use crate::error::ApiError;

const MAX_NAME_LEN: usize = 128;

/// Validate a capability tag: non-empty, no whitespace.
pub fn validate_capability_tag(tag: &str) -> Result<(), ApiError> {
    if tag.is_empty() {
        return Err(ApiError::Validation(
            "Capability tag cannot be empty".to_string(),
        ));
    }
    if tag.chars().any(char::is_whitespace) {
        return Err(ApiError::Validation(format!(
            "Capability tag '{}' cannot contain whitespace",
            tag
        )));
    }
    Ok(())
}

/// Validate agent configuration before it reaches an adapter.
pub fn validate_agent_config(config: &AgentConfig) -> Result<(), ApiError> {
    let name = config.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Agent name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Agent name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }

    if let Some(platform_id) = &config.platform_id {
        if platform_id.trim().is_empty() {
            return Err(ApiError::Validation(
                "platform_id cannot be empty if provided".to_string(),
            ));
        }
    }

    for tag in &config.capabilities {
        validate_capability_tag(tag)?;
    }

    Ok(())
}
