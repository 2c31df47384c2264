//! Hooks loaded from a dynamic library
//!
//! The library exports plain C functions with the same signatures as the
//! interposer's C ABI handlers:
//!
//! ```c
//! void on_query_created(const void *query);
//! void tune_batching(const void *query, RawBatchingParams *params);
//! ```
//!
//! Each resolved hook holds a reference to the library, so the code stays
//! mapped for as long as the hook is registered.

use anyhow::{Context, Result};
use libloading::Library;
use mdquery_interposer::ffi::{
    BatchingHandlerFn, CreationHandlerFn, RawBatchingHandler, RawCreationHandler,
};
use mdquery_interposer::{BatchingOverride, BatchingParams, CreationObserver, QueryHandle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An opened hook library
#[derive(Debug, Clone)]
pub struct HookLibrary {
    library: Arc<Library>,
    path: PathBuf,
}

impl HookLibrary {
    /// Load the library at `path`
    ///
    /// Loading runs the library's initializers; only open trusted libraries.
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Loading hook library: {:?}", path);
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("Failed to load hook library: {:?}", path))?;

        Ok(Self {
            library: Arc::new(library),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve an exported creation handler
    pub fn creation_hook(&self, symbol: &str) -> Result<LibraryCreationHook> {
        let handler: CreationHandlerFn = unsafe {
            *self
                .library
                .get::<CreationHandlerFn>(symbol.as_bytes())
                .with_context(|| format!("Symbol {} not found in {:?}", symbol, self.path))?
        };
        log::debug!("Resolved creation handler {} from {:?}", symbol, self.path);

        Ok(LibraryCreationHook {
            handler: unsafe { RawCreationHandler::new(handler) },
            _library: Arc::clone(&self.library),
        })
    }

    /// Resolve an exported batching handler
    pub fn batching_hook(&self, symbol: &str) -> Result<LibraryBatchingHook> {
        let handler: BatchingHandlerFn = unsafe {
            *self
                .library
                .get::<BatchingHandlerFn>(symbol.as_bytes())
                .with_context(|| format!("Symbol {} not found in {:?}", symbol, self.path))?
        };
        log::debug!("Resolved batching handler {} from {:?}", symbol, self.path);

        Ok(LibraryBatchingHook {
            handler: unsafe { RawBatchingHandler::new(handler) },
            _library: Arc::clone(&self.library),
        })
    }
}

/// Creation observer backed by a library function
pub struct LibraryCreationHook {
    handler: RawCreationHandler,
    _library: Arc<Library>,
}

impl CreationObserver for LibraryCreationHook {
    fn query_created(&self, query: QueryHandle<'_>) {
        self.handler.query_created(query)
    }
}

/// Batching override backed by a library function
pub struct LibraryBatchingHook {
    handler: RawBatchingHandler,
    _library: Arc<Library>,
}

impl BatchingOverride for LibraryBatchingHook {
    fn override_params(&self, query: QueryHandle<'_>, params: BatchingParams) -> BatchingParams {
        self.handler.override_params(query, params)
    }
}
