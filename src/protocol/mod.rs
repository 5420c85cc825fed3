//! Capability-negotiation protocol: threads, messages, capabilities.

pub mod capability;
pub mod engine;
pub mod handler;
pub mod thread;

pub use capability::{
    create_capability_request, data_request, decision, payment_request, wallet_operation,
    Capability, CapabilityAction, CAPABILITY_VERSION, DATA_REQUEST, DECISION, PAYMENT_REQUEST,
    WALLET_OPERATION,
};
pub use engine::{ActiveCapability, CapabilityStatus, ThreadEngine};
pub use handler::{CapabilityHandler, FnHandler};
pub use thread::{Message, MessageRole, NewMessage, Thread, ThreadOptions};
