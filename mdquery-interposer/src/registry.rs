//! Hook registry
//!
//! Bundles the two slots. Engine integrations either own a `HookRegistry` and
//! pass it around, or use the process-wide instance behind
//! [`HookRegistry::global`] and the free functions in this module.

use crate::batching::{BatchingOverride, BatchingOverrideSlot};
use crate::config::BatchingParams;
use crate::creation::{CreationObserver, CreationObserverSlot};
use crate::types::QueryHandle;
use serde::Serialize;
use std::sync::OnceLock;

static GLOBAL_REGISTRY: OnceLock<HookRegistry> = OnceLock::new();

/// The creation observer and batching override slots
#[derive(Debug, Default)]
pub struct HookRegistry {
    creation: CreationObserverSlot,
    batching: BatchingOverrideSlot,
}

/// Which slots are set, and by which registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    pub creation_generation: Option<u64>,
    pub batching_generation: Option<u64>,
}

impl RegistryStatus {
    /// True if neither slot holds a hook
    pub fn is_empty(&self) -> bool {
        self.creation_generation.is_none() && self.batching_generation.is_none()
    }
}

impl HookRegistry {
    /// Create a registry with both slots unset
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, unset until something registers a hook
    pub fn global() -> &'static HookRegistry {
        GLOBAL_REGISTRY.get_or_init(HookRegistry::new)
    }

    pub fn creation(&self) -> &CreationObserverSlot {
        &self.creation
    }

    pub fn batching(&self) -> &BatchingOverrideSlot {
        &self.batching
    }

    /// Engine entry point: a query was created
    pub fn notify_query_created(&self, query: QueryHandle<'_>) {
        self.creation.notify(query);
    }

    /// Engine entry point: batching parameters are about to be used
    pub fn resolve_batching_params(
        &self,
        query: QueryHandle<'_>,
        defaults: BatchingParams,
    ) -> BatchingParams {
        self.batching.resolve(query, defaults)
    }

    /// Snapshot of both slots
    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            creation_generation: self.creation.generation(),
            batching_generation: self.batching.generation(),
        }
    }

    /// Clear both slots
    pub fn clear_all(&self) {
        self.creation.clear();
        self.batching.clear();
    }
}

/// Register a creation observer on the global registry
pub fn set_creation_observer<O: CreationObserver + 'static>(observer: O) -> bool {
    HookRegistry::global().creation().set(observer)
}

/// Clear the global creation observer
pub fn clear_creation_observer() -> bool {
    HookRegistry::global().creation().clear()
}

/// Register a batching override on the global registry
pub fn set_batching_override<B: BatchingOverride + 'static>(hook: B) -> bool {
    HookRegistry::global().batching().set(hook)
}

/// Clear the global batching override
pub fn clear_batching_override() -> bool {
    HookRegistry::global().batching().clear()
}

/// Engine entry point on the global registry
pub fn notify_query_created(query: QueryHandle<'_>) {
    HookRegistry::global().notify_query_created(query);
}

/// Engine entry point on the global registry
pub fn resolve_batching_params(query: QueryHandle<'_>, defaults: BatchingParams) -> BatchingParams {
    HookRegistry::global().resolve_batching_params(query, defaults)
}
