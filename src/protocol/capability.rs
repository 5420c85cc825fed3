//! Capability protocol objects and their factories.
//!
//! Factories are pure: they stamp type and version and check that the required
//! data fields are present. Field values are passed through untouched.

use crate::error::ApiError;
use crate::types::CapabilityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CAPABILITY_VERSION: &str = "1.0";

pub const PAYMENT_REQUEST: &str = "payment-request";
pub const DATA_REQUEST: &str = "data-request";
pub const WALLET_OPERATION: &str = "wallet-operation";
pub const DECISION: &str = "decision";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityAction {
    Request,
    Response,
}

/// Typed, versioned payload carried inside a thread message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    #[serde(rename = "type")]
    pub capability_type: String,
    pub version: String,
    pub action: CapabilityAction,
    #[serde(default)]
    pub data: Value,
    /// On a response, the id of the message carrying the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Explicit capability id; defaults to the type tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Capability {
    pub fn request(capability_type: impl Into<String>, data: Value) -> Self {
        Self {
            capability_type: capability_type.into(),
            version: CAPABILITY_VERSION.to_string(),
            action: CapabilityAction::Request,
            data,
            reference_id: None,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Key of this capability within its thread.
    pub fn capability_id(&self) -> CapabilityId {
        self.id
            .clone()
            .unwrap_or_else(|| self.capability_type.clone())
    }

    pub fn is_request(&self) -> bool {
        self.action == CapabilityAction::Request
    }

    /// Response answering this request, correlated to the request message.
    pub fn response_to(&self, request_message_id: &str, data: Value) -> Self {
        Self {
            capability_type: self.capability_type.clone(),
            version: self.version.clone(),
            action: CapabilityAction::Response,
            data,
            reference_id: Some(request_message_id.to_string()),
            id: self.id.clone(),
        }
    }
}

fn require_fields(capability_type: &str, data: &Value, fields: &[&str]) -> Result<(), ApiError> {
    let Some(object) = data.as_object() else {
        return Err(ApiError::Validation(format!(
            "{} data must be an object",
            capability_type
        )));
    };
    for field in fields {
        match object.get(*field) {
            Some(value) if !value.is_null() => {}
            _ => {
                return Err(ApiError::Validation(format!(
                    "{} requires field '{}'",
                    capability_type, field
                )))
            }
        }
    }
    Ok(())
}

/// `{amount, currency, recipient}`
pub fn payment_request(data: Value) -> Result<Capability, ApiError> {
    require_fields(PAYMENT_REQUEST, &data, &["amount", "currency", "recipient"])?;
    Ok(Capability::request(PAYMENT_REQUEST, data))
}

/// `{query}`
pub fn data_request(data: Value) -> Result<Capability, ApiError> {
    require_fields(DATA_REQUEST, &data, &["query"])?;
    Ok(Capability::request(DATA_REQUEST, data))
}

/// `{operation}`
pub fn wallet_operation(data: Value) -> Result<Capability, ApiError> {
    require_fields(WALLET_OPERATION, &data, &["operation"])?;
    Ok(Capability::request(WALLET_OPERATION, data))
}

/// `{question, options}`
pub fn decision(data: Value) -> Result<Capability, ApiError> {
    require_fields(DECISION, &data, &["question", "options"])?;
    Ok(Capability::request(DECISION, data))
}

/// Build a request by tag. Unknown tags are accepted as-is.
pub fn create_capability_request(capability_type: &str, data: Value) -> Result<Capability, ApiError> {
    match capability_type {
        PAYMENT_REQUEST => payment_request(data),
        DATA_REQUEST => data_request(data),
        WALLET_OPERATION => wallet_operation(data),
        DECISION => decision(data),
        "" => Err(ApiError::Validation(
            "Capability type cannot be empty".to_string(),
        )),
        other => Ok(Capability::request(other, data)),
    }
}
