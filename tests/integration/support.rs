use agora::adapter::{BridgeAdapter, PlatformClient};
use agora::agent::{AgentConfig, AgentRecord, ConnectOptions, ConnectionResult, TaskOptions, TaskRecord, TaskResult};
use agora::discovery::{CapabilityPublication, DiscoveryIndex, DiscoveryQuery, IndexedAgent};
use agora::{Agora, AgoraConfig, ApiError, CallContext};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Platform SDK double. Tasks with `"fail": true` report failure.
pub struct MockClient {
    platform: String,
    native_channels: bool,
    created: AtomicUsize,
}

impl MockClient {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            native_channels: false,
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_native_channels(platform: &str) -> Self {
        Self {
            native_channels: true,
            ..Self::new(platform)
        }
    }
}

#[async_trait]
impl PlatformClient for MockClient {
    fn platform_type(&self) -> &str {
        &self.platform
    }

    async fn create_remote_agent(&self, _config: &AgentConfig) -> Result<String, ApiError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-{}", self.platform, n))
    }

    async fn execute_task(
        &self,
        platform_id: &str,
        task: &Value,
        _options: &TaskOptions,
    ) -> Result<TaskResult, ApiError> {
        if task.get("fail").and_then(Value::as_bool) == Some(true) {
            return Ok(TaskResult::failed(platform_id, "task asked to fail"));
        }
        Ok(TaskResult::succeeded(platform_id, json!({ "echo": task })))
    }

    async fn open_channel(
        &self,
        source_platform_id: &str,
        target: &str,
    ) -> Result<Option<String>, ApiError> {
        if self.native_channels {
            Ok(Some(format!("{}->{}", source_platform_id, target)))
        } else {
            Ok(None)
        }
    }
}

/// Remote index double backed by in-process state.
#[derive(Default)]
pub struct MockIndex {
    pub agents: Mutex<Vec<IndexedAgent>>,
    pub published: Mutex<HashMap<String, CapabilityPublication>>,
    pub history: Mutex<Vec<TaskRecord>>,
    pub failing: AtomicBool,
    pub verified: AtomicBool,
}

impl MockIndex {
    pub fn failing() -> Self {
        let index = Self::default();
        index.failing.store(true, Ordering::SeqCst);
        index
    }

    pub fn add_agent(&self, id: &str, tags: &[&str], score: f64) {
        self.agents.lock().push(IndexedAgent {
            agent: AgentRecord {
                id: id.to_string(),
                name: format!("remote {}", id),
                platform_type: "remote".to_string(),
                platform_id: format!("{}@remote", id),
                created_at: agora::types::now(),
                reputation_score: score,
                metadata: BTreeMap::new(),
            },
            capabilities: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            metadata: BTreeMap::new(),
        });
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ApiError::Remote("index offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DiscoveryIndex for MockIndex {
    async fn initialize(&self) -> Result<(), ApiError> {
        self.check()
    }

    async fn list_agents(&self) -> Result<Vec<IndexedAgent>, ApiError> {
        self.check()?;
        Ok(self.agents.lock().clone())
    }

    async fn discover_agents(&self, query: &DiscoveryQuery) -> Result<Vec<IndexedAgent>, ApiError> {
        self.check()?;
        Ok(self
            .agents
            .lock()
            .iter()
            .filter(|agent| agent.matches(query))
            .cloned()
            .collect())
    }

    async fn publish_agent_capabilities(
        &self,
        agent_id: &str,
        publication: &CapabilityPublication,
    ) -> Result<(), ApiError> {
        self.check()?;
        self.published
            .lock()
            .insert(agent_id.to_string(), publication.clone());
        Ok(())
    }

    async fn get_agent_capabilities(
        &self,
        agent_id: &str,
    ) -> Result<Option<CapabilityPublication>, ApiError> {
        self.check()?;
        Ok(self.published.lock().get(agent_id).cloned())
    }

    async fn get_agent_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError> {
        self.check()?;
        Ok(self
            .history
            .lock()
            .iter()
            .filter(|task| task.agent_id == agent_id)
            .cloned()
            .collect())
    }

    async fn record_agent_task(&self, _agent_id: &str, task: &TaskRecord) -> Result<(), ApiError> {
        self.check()?;
        self.history.lock().push(task.clone());
        Ok(())
    }

    async fn connect_agents(
        &self,
        _source_id: &str,
        _target_id: &str,
        _options: &ConnectOptions,
    ) -> Result<ConnectionResult, ApiError> {
        self.check()?;
        Err(ApiError::Remote("index does not broker connections".to_string()))
    }

    async fn verify_agent(&self, _agent_id: &str, _data: &Value) -> Result<bool, ApiError> {
        self.check()?;
        Ok(self.verified.load(Ordering::SeqCst))
    }
}

pub fn ctx() -> CallContext {
    CallContext::none()
}

pub fn register_bridge(agora: &Agora, client: MockClient, threads: bool) {
    let mut adapter = BridgeAdapter::in_memory(client);
    if threads {
        adapter = adapter.with_thread_engine(agora.thread_engine().clone());
    }
    assert!(agora.register_adapter(Arc::new(adapter)));
}

/// In-memory core with thread-bridged "alpha" and "beta" platforms.
pub async fn bridged_agora() -> Agora {
    let agora = Agora::in_memory().unwrap();
    register_bridge(&agora, MockClient::new("alpha"), true);
    register_bridge(&agora, MockClient::new("beta"), true);
    agora.initialize().await.unwrap();
    agora
}

/// Same platforms, discovery backed by `index`.
pub async fn indexed_agora(index: Arc<MockIndex>) -> Agora {
    let agora = Agora::with_discovery_index(AgoraConfig::default(), index).unwrap();
    register_bridge(&agora, MockClient::new("alpha"), true);
    agora.initialize().await.unwrap();
    agora
}

pub async fn create(agora: &Agora, platform: &str, name: &str, tags: &[&str]) -> AgentRecord {
    agora
        .create_agent(
            platform,
            AgentConfig::named(name).with_capabilities(tags.iter().copied()),
            &ctx(),
        )
        .await
        .unwrap()
}
