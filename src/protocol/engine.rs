//! Thread Engine
//!
//! Owns threads and the per-(thread, capability) state machine
//! `none -> active -> responded`. A request-type capability posted in a message
//! opens an entry; exactly one response closes it. While an entry is active, a
//! second request with the same key is rejected and the message is not appended.
//! Once responded, the key may start a new cycle.

use super::capability::Capability;
use super::handler::CapabilityHandler;
use super::thread::{Message, MessageRole, NewMessage, Thread, ThreadOptions};
use crate::concurrency::EntityLocks;
use crate::error::ApiError;
use crate::store::{MemoryRepository, Repository};
use crate::types::{CapabilityId, ThreadId, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    Active,
    Responded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCapability {
    pub thread_id: ThreadId,
    pub capability_id: CapabilityId,
    /// Message that carried the request
    pub message_id: String,
    pub capability: Capability,
    pub status: CapabilityStatus,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<Timestamp>,
}

fn entry_key(thread_id: &str, capability_id: &str) -> String {
    format!("{}:{}", thread_id, capability_id)
}

pub struct ThreadEngine {
    threads: Arc<dyn Repository<Thread>>,
    capabilities: Arc<dyn Repository<ActiveCapability>>,
    locks: EntityLocks,
    handlers: RwLock<HashMap<String, Arc<dyn CapabilityHandler>>>,
}

impl ThreadEngine {
    pub fn new(
        threads: Arc<dyn Repository<Thread>>,
        capabilities: Arc<dyn Repository<ActiveCapability>>,
    ) -> Self {
        Self {
            threads,
            capabilities,
            locks: EntityLocks::new(),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Engine over isolated in-memory repositories.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryRepository::new()),
        )
    }

    fn load(&self, thread_id: &str) -> Result<Thread, ApiError> {
        self.threads
            .get(thread_id)?
            .ok_or_else(|| ApiError::not_found("thread", thread_id))
    }

    pub async fn create_thread(&self, options: ThreadOptions) -> Result<Thread, ApiError> {
        let mut participants = Vec::with_capacity(options.participants.len());
        for participant in options.participants {
            if participant.trim().is_empty() {
                return Err(ApiError::Validation(
                    "Thread participant id cannot be empty".to_string(),
                ));
            }
            if !participants.contains(&participant) {
                participants.push(participant);
            }
        }

        let now = crate::types::now();
        let thread = Thread {
            id: crate::types::new_id(),
            title: options.title,
            participants,
            messages: Vec::new(),
            metadata: options.metadata,
            created_at: now,
            updated_at: now,
        };
        self.threads.put(&thread.id, &thread)?;

        info!(
            thread_id = %thread.id,
            participants = thread.participants.len(),
            "Thread created"
        );
        Ok(thread)
    }

    /// Append a message, opening an entry for every request capability it carries.
    pub async fn add_message(&self, thread_id: &str, message: NewMessage) -> Result<Message, ApiError> {
        let appended = {
            let _guard = self.locks.lock(thread_id).await;
            let mut thread = self.load(thread_id)?;

            let mut keys = BTreeSet::new();
            for capability in message.capabilities.iter().filter(|c| c.is_request()) {
                if capability.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
                    return Err(ApiError::Validation(
                        "Capability id cannot be empty if provided".to_string(),
                    ));
                }
                let key = capability.capability_id();
                if !keys.insert(key.clone()) {
                    return Err(ApiError::InvalidState(format!(
                        "Message carries capability '{}' twice",
                        key
                    )));
                }
                if let Some(existing) = self.capabilities.get(&entry_key(thread_id, &key))? {
                    if existing.status == CapabilityStatus::Active {
                        return Err(ApiError::InvalidState(format!(
                            "Capability '{}' is already active in thread {}",
                            key, thread_id
                        )));
                    }
                }
            }

            let appended = Message {
                id: crate::types::new_id(),
                thread_id: thread_id.to_string(),
                role: message.role,
                sender_id: message.sender_id,
                content: message.content,
                capabilities: message.capabilities,
                metadata: message.metadata,
                created_at: crate::types::now(),
            };
            thread.messages.push(appended.clone());
            thread.updated_at = appended.created_at;
            self.threads.put(thread_id, &thread)?;

            for capability in appended.capabilities.iter().filter(|c| c.is_request()) {
                let capability_id = capability.capability_id();
                let entry = ActiveCapability {
                    thread_id: thread_id.to_string(),
                    capability_id: capability_id.clone(),
                    message_id: appended.id.clone(),
                    capability: capability.clone(),
                    status: CapabilityStatus::Active,
                    created_at: appended.created_at,
                    responded_at: None,
                };
                self.capabilities
                    .put(&entry_key(thread_id, &capability_id), &entry)?;
                debug!(
                    thread_id = %thread_id,
                    capability_id = %capability_id,
                    message_id = %appended.id,
                    "Capability request opened"
                );
            }
            appended
        };

        self.dispatch_handlers(thread_id, &appended).await;
        Ok(appended)
    }

    async fn dispatch_handlers(&self, thread_id: &str, message: &Message) {
        for capability in message.capabilities.iter().filter(|c| c.is_request()) {
            let handler = self.handlers.read().get(&capability.capability_type).cloned();
            let Some(handler) = handler else {
                continue;
            };
            let capability_id = capability.capability_id();

            match handler.handle(thread_id, message, capability).await {
                Ok(Some(data)) => {
                    if let Err(err) = self
                        .respond_to_capability(thread_id, &capability_id, data)
                        .await
                    {
                        warn!(
                            thread_id = %thread_id,
                            capability_id = %capability_id,
                            error = %err,
                            "Handler response rejected"
                        );
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        thread_id = %thread_id,
                        capability_id = %capability_id,
                        error = %err,
                        "Capability handler failed; request left active"
                    );
                }
            }
        }
    }

    /// Answer an active request with exactly one response message.
    pub async fn respond_to_capability(
        &self,
        thread_id: &str,
        capability_id: &str,
        response: Value,
    ) -> Result<Message, ApiError> {
        let _guard = self.locks.lock(thread_id).await;
        let mut thread = self.load(thread_id)?;

        let key = entry_key(thread_id, capability_id);
        let mut entry = match self.capabilities.get(&key)? {
            Some(entry) if entry.status == CapabilityStatus::Active => entry,
            Some(_) => {
                return Err(ApiError::InvalidState(format!(
                    "Capability '{}' in thread {} was already responded to",
                    capability_id, thread_id
                )))
            }
            None => {
                return Err(ApiError::InvalidState(format!(
                    "No active capability '{}' in thread {}",
                    capability_id, thread_id
                )))
            }
        };

        let message = Message {
            id: crate::types::new_id(),
            thread_id: thread_id.to_string(),
            role: MessageRole::Agent,
            sender_id: None,
            content: String::new(),
            capabilities: vec![entry.capability.response_to(&entry.message_id, response)],
            metadata: Default::default(),
            created_at: crate::types::now(),
        };
        thread.messages.push(message.clone());
        thread.updated_at = message.created_at;
        self.threads.put(thread_id, &thread)?;

        entry.status = CapabilityStatus::Responded;
        entry.responded_at = Some(message.created_at);
        self.capabilities.put(&key, &entry)?;

        info!(
            thread_id = %thread_id,
            capability_id = %capability_id,
            request_message_id = %entry.message_id,
            "Capability responded"
        );
        Ok(message)
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, ApiError> {
        self.load(thread_id)
    }

    /// All threads ordered by creation time, then id.
    pub async fn get_all_threads(&self) -> Result<Vec<Thread>, ApiError> {
        let mut threads = self.threads.list()?;
        threads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(threads)
    }

    /// Requests in the thread still awaiting a response.
    pub async fn get_active_capabilities(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ActiveCapability>, ApiError> {
        self.load(thread_id)?;
        let mut active: Vec<ActiveCapability> = self
            .capabilities
            .list()?
            .into_iter()
            .filter(|entry| entry.thread_id == thread_id && entry.status == CapabilityStatus::Active)
            .collect();
        active.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.capability_id.cmp(&b.capability_id))
        });
        Ok(active)
    }

    /// Entry for one key in any state.
    pub async fn get_capability(
        &self,
        thread_id: &str,
        capability_id: &str,
    ) -> Result<Option<ActiveCapability>, ApiError> {
        Ok(self
            .capabilities
            .get(&entry_key(thread_id, capability_id))?)
    }

    /// Register the handler for one capability type, returning the one it replaces.
    pub fn register_capability_handler(
        &self,
        capability_type: impl Into<String>,
        handler: Arc<dyn CapabilityHandler>,
    ) -> Option<Arc<dyn CapabilityHandler>> {
        let capability_type = capability_type.into();
        debug!(capability_type = %capability_type, "Registered capability handler");
        self.handlers.write().insert(capability_type, handler)
    }
}
