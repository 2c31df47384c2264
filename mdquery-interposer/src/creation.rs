//! Creation observer slot
//!
//! The engine calls [`CreationObserverSlot::notify`] once for every query it
//! creates. A registered observer sees the handle and nothing flows back into
//! the engine: the query is created the same way whether or not an observer
//! is installed.

use crate::slot::HookSlot;
use crate::types::{panic_message, InterposerError, QueryHandle, Result};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Observer invoked whenever the engine creates a query
///
/// Called inline on whatever engine thread created the query, possibly
/// concurrently with itself for distinct queries.
pub trait CreationObserver: Send + Sync {
    fn query_created(&self, query: QueryHandle<'_>);
}

impl<F> CreationObserver for F
where
    F: Fn(QueryHandle<'_>) + Send + Sync,
{
    fn query_created(&self, query: QueryHandle<'_>) {
        self(query)
    }
}

/// Slot holding at most one creation observer
#[derive(Default)]
pub struct CreationObserverSlot {
    slot: HookSlot<dyn CreationObserver>,
}

impl CreationObserverSlot {
    /// Create an unset slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer, or clear the slot with `None`
    ///
    /// Returns true if a previous observer was displaced.
    pub fn register(&self, observer: Option<Box<dyn CreationObserver>>) -> bool {
        let change = self.slot.register(observer);
        match change.installed {
            Some(generation) => log::debug!(
                "Creation observer {} registered (displaced {:?})",
                generation,
                change.displaced
            ),
            None => log::debug!("Creation observer cleared (displaced {:?})", change.displaced),
        }
        change.displaced.is_some()
    }

    /// Register `observer`, replacing any previous one
    pub fn set<O: CreationObserver + 'static>(&self, observer: O) -> bool {
        self.register(Some(Box::new(observer)))
    }

    /// Clear the slot
    pub fn clear(&self) -> bool {
        self.register(None)
    }

    /// True if an observer is registered
    pub fn is_registered(&self) -> bool {
        self.slot.is_registered()
    }

    /// Registration number of the current observer
    pub fn generation(&self) -> Option<u64> {
        self.slot.generation()
    }

    /// Invoke the registered observer, reporting a panic as an error
    ///
    /// Unset slot is a successful no-op.
    pub fn try_notify(&self, query: QueryHandle<'_>) -> Result<()> {
        let outcome = self.slot.with_current(|registration| {
            log::trace!(
                "Notifying creation observer {} of {:?}",
                registration.generation(),
                query
            );
            panic::catch_unwind(AssertUnwindSafe(|| registration.hook().query_created(query)))
        });

        match outcome {
            None | Some(Ok(())) => Ok(()),
            Some(Err(payload)) => Err(InterposerError::HookPanicked(panic_message(
                payload.as_ref(),
            ))),
        }
    }

    /// Invoke the registered observer, if any
    ///
    /// Never fails: a panicking observer is logged and the engine carries on.
    pub fn notify(&self, query: QueryHandle<'_>) {
        if let Err(e) = self.try_notify(query) {
            log::error!("Creation observer failed for {:?}: {}", query, e);
        }
    }
}

impl fmt::Debug for CreationObserverSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CreationObserverSlot").field(&self.slot).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_unset_notify_is_noop() {
        let slot = CreationObserverSlot::new();
        let query = 1u64;

        assert!(slot.try_notify(QueryHandle::from_ref(&query)).is_ok());
        slot.notify(QueryHandle::from_ref(&query));
        assert!(!slot.is_registered());
    }

    #[test]
    fn test_observer_sees_handle() {
        let slot = CreationObserverSlot::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        slot.set(move |query: QueryHandle<'_>| sink.lock().unwrap().push(query.addr()));

        let query = 7u64;
        let handle = QueryHandle::from_ref(&query);
        slot.notify(handle);

        assert_eq!(*seen.lock().unwrap(), vec![handle.addr()]);
    }

    #[test]
    fn test_last_observer_wins() {
        let slot = CreationObserverSlot::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        slot.set(move |_: QueryHandle<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&second);
        assert!(slot.set(move |_: QueryHandle<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let query = 0u8;
        slot.notify(QueryHandle::from_ref(&query));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_twice_leaves_slot_unset() {
        let slot = CreationObserverSlot::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        slot.set(move |_: QueryHandle<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(slot.clear());
        assert!(!slot.is_registered());
        assert!(!slot.clear());
        assert!(!slot.is_registered());

        let query = 3u32;
        slot.notify(QueryHandle::from_ref(&query));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_observer_is_contained() {
        let slot = CreationObserverSlot::new();
        slot.set(|_: QueryHandle<'_>| panic!("observer exploded"));

        let query = 5u64;
        let result = slot.try_notify(QueryHandle::from_ref(&query));
        assert_eq!(
            result,
            Err(InterposerError::HookPanicked("observer exploded".to_string()))
        );

        // Engine-facing path swallows the fault and the slot stays usable
        slot.notify(QueryHandle::from_ref(&query));
        assert!(slot.is_registered());
        assert_eq!(slot.generation(), Some(1));
    }

    struct CountingObserver {
        calls: Arc<AtomicUsize>,
    }

    impl CreationObserver for CountingObserver {
        fn query_created(&self, _query: QueryHandle<'_>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_trait_object_observer() {
        let slot = CreationObserverSlot::new();
        let calls = Arc::new(AtomicUsize::new(0));
        slot.register(Some(Box::new(CountingObserver {
            calls: Arc::clone(&calls),
        })));

        let queries = [1u16, 2u16];
        for query in &queries {
            slot.notify(QueryHandle::from_ref(query));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
