//! Agent Domain
//!
//! Records describing agents hosted on external platforms, the tasks they run,
//! and the connections bridged between them. The registry owns these records;
//! adapters create them.

pub mod connection;
pub mod record;
pub mod task;
pub mod validation;

pub use connection::{
    ConnectOptions, ConnectionChannel, ConnectionRecord, ConnectionResult, ConnectionStatus,
};
pub use record::{AgentConfig, AgentPatch, AgentRecord, NEUTRAL_REPUTATION};
pub use task::{TaskOptions, TaskRecord, TaskRequest, TaskResult};
pub use validation::{validate_agent_config, validate_capability_tag};
