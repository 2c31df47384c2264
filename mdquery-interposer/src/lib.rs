//! MDQuery Interposer Library
//!
//! Call-interposition shim for a metadata query engine. Client code registers
//! hooks; the engine calls two extension points while it builds a query, and
//! the shim routes those calls to whichever hooks are installed.
//!
//! # Architecture
//!
//! - **Creation observer slot**: at most one observer, told about every query
//!   the engine creates. Purely observational.
//! - **Batching override slot**: at most one override, handed a copy of the
//!   engine's default batching parameters and returning the ones to use.
//!
//! Both slots live in a [`HookRegistry`]. With a slot unset, the engine sees
//! exactly the behavior it would have without the shim.
//!
//! The library does NOT:
//! - Create, run, or tear down queries
//! - Parse or evaluate query predicates
//! - Validate or clamp batching values
//! - Persist anything across process restarts
//!
//! # Example Usage
//!
//! ```
//! use mdquery_interposer::{BatchingParams, HookRegistry, QueryHandle};
//!
//! let registry = HookRegistry::new();
//!
//! // Double the size of the first batch for every query
//! registry.batching().set(|_query: QueryHandle<'_>, mut params: BatchingParams| {
//!     params.first_max_num *= 2;
//!     params
//! });
//!
//! // Engine side
//! let query = String::from("kMDItemContentType == 'public.image'");
//! let handle = QueryHandle::from_ref(&query);
//! registry.notify_query_created(handle);
//! let params = registry.resolve_batching_params(
//!     handle,
//!     BatchingParams::new().with_first_batch(50, 200),
//! );
//! assert_eq!(params, BatchingParams::new().with_first_batch(100, 200));
//! ```

// Public modules
pub mod batching;
pub mod config;
pub mod creation;
pub mod ffi;
pub mod registry;
pub mod slot;
pub mod types;

// Re-export main types for convenience
pub use batching::{BatchingOverride, BatchingOverrideSlot};
pub use config::{BatchingParams, BatchingPatch};
pub use creation::{CreationObserver, CreationObserverSlot};
pub use registry::{
    clear_batching_override, clear_creation_observer, notify_query_created,
    resolve_batching_params, set_batching_override, set_creation_observer, HookRegistry,
    RegistryStatus,
};
pub use types::{InterposerError, QueryHandle, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
