//! Adapter table keyed by platform tag.

use crate::adapter::PlatformAdapter;
use crate::cancel::CallContext;
use crate::error::ApiError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

struct AdapterSlot {
    adapter: Arc<dyn PlatformAdapter>,
    /// Set once the adapter's own `initialize` succeeded
    ready: OnceCell<()>,
}

#[derive(Default)]
pub struct AdapterTable {
    slots: RwLock<HashMap<String, Arc<AdapterSlot>>>,
}

impl AdapterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the adapter's platform tag. The first adapter for a tag
    /// wins; later registrations return `false`.
    pub fn register(&self, adapter: Arc<dyn PlatformAdapter>) -> bool {
        let platform = adapter.platform_type().to_string();
        let mut slots = self.slots.write();
        if slots.contains_key(&platform) {
            warn!(platform = %platform, "Adapter already registered; keeping the first");
            return false;
        }
        slots.insert(
            platform.clone(),
            Arc::new(AdapterSlot {
                adapter,
                ready: OnceCell::new(),
            }),
        );
        debug!(platform = %platform, "Adapter registered");
        true
    }

    pub fn contains(&self, platform: &str) -> bool {
        self.slots.read().contains_key(platform)
    }

    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.slots.read().keys().cloned().collect();
        platforms.sort();
        platforms
    }

    /// Adapter for `platform`, running its `initialize` on first use. A failed
    /// initialization is retried on the next call.
    pub async fn resolve(
        &self,
        platform: &str,
        ctx: &CallContext,
    ) -> Result<Arc<dyn PlatformAdapter>, ApiError> {
        let slot = self
            .slots
            .read()
            .get(platform)
            .cloned()
            .ok_or_else(|| ApiError::not_found("adapter", platform))?;

        slot.ready
            .get_or_try_init(|| slot.adapter.initialize(ctx))
            .await?;
        Ok(slot.adapter.clone())
    }
}
