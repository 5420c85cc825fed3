use super::capability::Capability;
use super::thread::Message;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;

/// Invoked when a request of the registered type is posted.
///
/// `Some(data)` answers the request through `respond_to_capability`; `None`
/// leaves it active for a later manual response.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn handle(
        &self,
        thread_id: &str,
        message: &Message,
        capability: &Capability,
    ) -> Result<Option<Value>, ApiError>;
}

/// Adapts a synchronous closure into a handler.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> CapabilityHandler for FnHandler<F>
where
    F: Fn(&Capability) -> Result<Option<Value>, ApiError> + Send + Sync,
{
    async fn handle(
        &self,
        _thread_id: &str,
        _message: &Message,
        capability: &Capability,
    ) -> Result<Option<Value>, ApiError> {
        (self.0)(capability)
    }
}
