//! Batching override slot
//!
//! The engine calls [`BatchingOverrideSlot::resolve`] once per query, right
//! before it starts using batching parameters. A registered override gets an
//! owned copy of the engine defaults and returns the parameters the engine
//! should use instead.

use crate::config::{BatchingParams, BatchingPatch};
use crate::slot::HookSlot;
use crate::types::QueryHandle;
use std::fmt;

/// Hook that rewrites batching parameters for a query
///
/// `params` starts as the engine defaults, so an implementation only touches
/// the fields it cares about. The returned value is used verbatim.
pub trait BatchingOverride: Send + Sync {
    fn override_params(&self, query: QueryHandle<'_>, params: BatchingParams) -> BatchingParams;
}

impl<F> BatchingOverride for F
where
    F: Fn(QueryHandle<'_>, BatchingParams) -> BatchingParams + Send + Sync,
{
    fn override_params(&self, query: QueryHandle<'_>, params: BatchingParams) -> BatchingParams {
        self(query, params)
    }
}

impl BatchingOverride for BatchingPatch {
    fn override_params(&self, _query: QueryHandle<'_>, params: BatchingParams) -> BatchingParams {
        self.apply(params)
    }
}

/// Slot holding at most one batching override
#[derive(Default)]
pub struct BatchingOverrideSlot {
    slot: HookSlot<dyn BatchingOverride>,
}

impl BatchingOverrideSlot {
    /// Create an unset slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override, or clear the slot with `None`
    ///
    /// Returns true if a previous override was displaced.
    pub fn register(&self, hook: Option<Box<dyn BatchingOverride>>) -> bool {
        let change = self.slot.register(hook);
        match change.installed {
            Some(generation) => log::debug!(
                "Batching override {} registered (displaced {:?})",
                generation,
                change.displaced
            ),
            None => log::debug!("Batching override cleared (displaced {:?})", change.displaced),
        }
        change.displaced.is_some()
    }

    /// Register `hook`, replacing any previous one
    pub fn set<B: BatchingOverride + 'static>(&self, hook: B) -> bool {
        self.register(Some(Box::new(hook)))
    }

    /// Clear the slot
    pub fn clear(&self) -> bool {
        self.register(None)
    }

    /// True if an override is registered
    pub fn is_registered(&self) -> bool {
        self.slot.is_registered()
    }

    /// Registration number of the current override
    pub fn generation(&self) -> Option<u64> {
        self.slot.generation()
    }

    /// Compute the batching parameters the engine should use for `query`
    ///
    /// Returns `defaults` untouched when no override is registered. A panic in
    /// the override propagates to the caller.
    pub fn resolve(&self, query: QueryHandle<'_>, defaults: BatchingParams) -> BatchingParams {
        self.slot
            .with_current(|registration| {
                let resolved = registration.hook().override_params(query, defaults);
                log::trace!(
                    "Batching override {} resolved {:?} for {:?}",
                    registration.generation(),
                    resolved,
                    query
                );
                resolved
            })
            .unwrap_or(defaults)
    }
}

impl fmt::Debug for BatchingOverrideSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BatchingOverrideSlot").field(&self.slot).finish()
    }
}
