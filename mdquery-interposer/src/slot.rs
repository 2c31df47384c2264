//! Single-hook slot
//!
//! A `HookSlot` holds at most one registered hook. Reads on the engine's call
//! path are lock-free; registration swaps the whole registration atomically, so
//! an invocation always sees either the previous hook or the new one. A hook
//! that is mid-call when it gets replaced stays alive until that call returns.
//! Registrations are serialized among themselves so generations only grow.

use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A registered hook together with its registration number
pub struct Registration<H: ?Sized> {
    generation: u64,
    hook: Box<H>,
}

impl<H: ?Sized> Registration<H> {
    /// The registered hook
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Registration number (starts at 1, increases with every registration)
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of a single `register` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotChange {
    /// Generation installed by this call (`None` when clearing)
    pub installed: Option<u64>,
    /// Generation this call displaced
    pub displaced: Option<u64>,
}

/// Process-wide cell holding zero or one hook
pub struct HookSlot<H: ?Sized> {
    current: ArcSwapOption<Registration<H>>,
    // Registration counter; writers only, the engine path never takes it
    registrations: Mutex<u64>,
}

impl<H: ?Sized> HookSlot<H> {
    /// Create an unset slot
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            registrations: Mutex::new(0),
        }
    }

    /// Replace the registered hook, or clear the slot with `None`
    ///
    /// Last registration wins.
    pub fn register(&self, hook: Option<Box<H>>) -> SlotChange {
        // The displaced hook is dropped after the lock is released
        let (previous, installed) = {
            let mut registrations = self
                .registrations
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let next = hook.map(|hook| {
                *registrations += 1;
                Arc::new(Registration {
                    generation: *registrations,
                    hook,
                })
            });
            let installed = next.as_ref().map(|registration| registration.generation);
            (self.current.swap(next), installed)
        };
        SlotChange {
            installed,
            displaced: previous.as_ref().map(|registration| registration.generation),
        }
    }

    /// Clear the slot. Returns true if a hook was displaced.
    pub fn clear(&self) -> bool {
        self.register(None).displaced.is_some()
    }

    /// True if a hook is currently registered
    pub fn is_registered(&self) -> bool {
        self.current.load().is_some()
    }

    /// Registration number of the current hook, if any
    pub fn generation(&self) -> Option<u64> {
        self.current.load().as_ref().map(|registration| registration.generation)
    }

    /// Owned reference to the current registration
    pub fn current(&self) -> Option<Arc<Registration<H>>> {
        self.current.load_full()
    }

    /// Run `f` against the current registration, if one exists
    ///
    /// The registration read happens once; a concurrent `register` cannot
    /// change which hook `f` sees.
    pub fn with_current<R>(&self, f: impl FnOnce(&Registration<H>) -> R) -> Option<R> {
        let guard = self.current.load();
        guard.as_deref().map(f)
    }
}

impl<H: ?Sized> Default for HookSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for HookSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSlot")
            .field("registered", &self.is_registered())
            .field("generation", &self.generation())
            .finish()
    }
}
