//! Agora: Cross-Platform Agent Interoperability
//!
//! A platform-neutral core for running agents that live on heterogeneous hosting
//! platforms. Platforms plug in through the [`adapter::PlatformAdapter`] contract;
//! the [`registry::AgentRegistry`] owns agent identity, connections and the
//! reputation and capability ledgers; [`discovery::DiscoveryService`] answers
//! capability queries over local and remote agents; and the
//! [`protocol::ThreadEngine`] negotiates typed capability requests between
//! agents inside conversation threads. [`Agora`] assembles all of it from an
//! [`AgoraConfig`].

pub mod adapter;
pub mod agent;
pub mod cancel;
pub mod capabilities;
pub mod concurrency;
pub mod config;
pub mod discovery;
pub mod error;
pub mod facade;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod reputation;
pub mod store;
pub mod types;

pub use adapter::{BridgeAdapter, PlatformAdapter, PlatformClient, PlatformMapping};
pub use agent::{
    AgentConfig, AgentPatch, AgentRecord, ConnectOptions, ConnectionRecord, ConnectionResult,
    TaskOptions, TaskRecord, TaskRequest, TaskResult,
};
pub use cancel::{CallContext, CancelToken};
pub use config::{AgoraConfig, ConfigLoader};
pub use discovery::{DiscoveryIndex, DiscoveryQuery, DiscoveryService};
pub use error::{ApiError, StorageError};
pub use facade::Agora;
pub use protocol::{Capability, CapabilityHandler, Message, NewMessage, Thread, ThreadEngine, ThreadOptions};
pub use registry::AgentRegistry;
pub use reputation::{HistoryReputationLedger, ReputationLedger, ReputationRecord, TrustLevel};
