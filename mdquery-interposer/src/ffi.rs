//! C ABI surface
//!
//! C declarations live in `include/mdquery_interposer.h`.
//!
//! Lets C clients register plain function-pointer hooks and lets the engine
//! shim forward its two extension points into the global registry.
//!
//! Engine side:
//! - `mdqi_notify_query_created(query)` after a query object is created
//! - `mdqi_resolve_batching_params(query, &params)` before batching params are used
//!
//! Client side:
//! - `mdqi_set_creation_handler(fn or NULL)`
//! - `mdqi_set_batching_handler(fn or NULL)`

use crate::batching::BatchingOverride;
use crate::config::BatchingParams;
use crate::creation::CreationObserver;
use crate::registry::HookRegistry;
use crate::types::{InterposerError, QueryHandle};
use std::ffi::c_void;

/// Engine layout of the batching record (`size_t` fields)
///
/// Declared for C callers in `include/mdquery_interposer.h`. Converting to
/// [`BatchingParams`] reinterprets the bits as `i64`: an engine value above
/// `i64::MAX` shows up negative to Rust hooks and converts back unchanged.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawBatchingParams {
    pub first_max_num: usize,
    pub first_max_ms: usize,
    pub progress_max_num: usize,
    pub progress_max_ms: usize,
    pub update_max_num: usize,
    pub update_max_ms: usize,
}

impl From<RawBatchingParams> for BatchingParams {
    fn from(raw: RawBatchingParams) -> Self {
        Self {
            first_max_num: raw.first_max_num as isize as i64,
            first_max_ms: raw.first_max_ms as isize as i64,
            progress_max_num: raw.progress_max_num as isize as i64,
            progress_max_ms: raw.progress_max_ms as isize as i64,
            update_max_num: raw.update_max_num as isize as i64,
            update_max_ms: raw.update_max_ms as isize as i64,
        }
    }
}

// Truncates on 32-bit targets, same as the engine's own size type.
impl From<BatchingParams> for RawBatchingParams {
    fn from(params: BatchingParams) -> Self {
        Self {
            first_max_num: params.first_max_num as usize,
            first_max_ms: params.first_max_ms as usize,
            progress_max_num: params.progress_max_num as usize,
            progress_max_ms: params.progress_max_ms as usize,
            update_max_num: params.update_max_num as usize,
            update_max_ms: params.update_max_ms as usize,
        }
    }
}

/// C creation handler: receives the query pointer
pub type CreationHandlerFn = unsafe extern "C" fn(query: *const c_void);

/// C batching handler: receives the query pointer and the params to rewrite in place
pub type BatchingHandlerFn =
    unsafe extern "C" fn(query: *const c_void, params: *mut RawBatchingParams);

/// Adapts a C creation handler to [`CreationObserver`]
#[derive(Debug, Clone, Copy)]
pub struct RawCreationHandler(CreationHandlerFn);

impl RawCreationHandler {
    /// # Safety
    /// `handler` must be callable from any thread with a valid query pointer.
    pub unsafe fn new(handler: CreationHandlerFn) -> Self {
        Self(handler)
    }
}

impl CreationObserver for RawCreationHandler {
    fn query_created(&self, query: QueryHandle<'_>) {
        unsafe { (self.0)(query.as_ptr()) }
    }
}

/// Adapts a C batching handler to [`BatchingOverride`]
///
/// The handler writes into a local copy of the defaults; that copy is returned.
#[derive(Debug, Clone, Copy)]
pub struct RawBatchingHandler(BatchingHandlerFn);

impl RawBatchingHandler {
    /// # Safety
    /// `handler` must be callable from any thread with a valid query pointer
    /// and a params pointer that is only valid for the duration of the call.
    pub unsafe fn new(handler: BatchingHandlerFn) -> Self {
        Self(handler)
    }
}

impl BatchingOverride for RawBatchingHandler {
    fn override_params(&self, query: QueryHandle<'_>, params: BatchingParams) -> BatchingParams {
        let mut raw = RawBatchingParams::from(params);
        unsafe { (self.0)(query.as_ptr(), &mut raw) };
        raw.into()
    }
}

/// Register (or clear, with NULL) the global creation handler
#[no_mangle]
pub extern "C" fn mdqi_set_creation_handler(handler: Option<CreationHandlerFn>) {
    let observer = handler.map(|handler| {
        Box::new(unsafe { RawCreationHandler::new(handler) }) as Box<dyn CreationObserver>
    });
    HookRegistry::global().creation().register(observer);
}

/// Register (or clear, with NULL) the global batching handler
#[no_mangle]
pub extern "C" fn mdqi_set_batching_handler(handler: Option<BatchingHandlerFn>) {
    let hook = handler.map(|handler| {
        Box::new(unsafe { RawBatchingHandler::new(handler) }) as Box<dyn BatchingOverride>
    });
    HookRegistry::global().batching().register(hook);
}

/// Engine extension point: a query object was created
///
/// A NULL query is ignored.
///
/// # Safety
/// `query` must be NULL or point to a live query for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn mdqi_notify_query_created(query: *const c_void) {
    match QueryHandle::from_raw(query) {
        Some(query) => HookRegistry::global().notify_query_created(query),
        None => log::warn!("Ignoring creation notification for a null query"),
    }
}

/// Engine extension point: resolve batching parameters in place
///
/// Returns 0 on success, or the [`InterposerError`] code when a pointer is
/// NULL (params are left untouched). A panicking hook aborts the process.
///
/// # Safety
/// `query` must be NULL or point to a live query, and `params` must be NULL
/// or valid for reads and writes, both for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn mdqi_resolve_batching_params(
    query: *const c_void,
    params: *mut RawBatchingParams,
) -> i32 {
    let Some(query) = QueryHandle::from_raw(query) else {
        return InterposerError::NullHandle.code();
    };
    let Some(params) = params.as_mut() else {
        return InterposerError::NullParams.code();
    };

    let resolved = HookRegistry::global().resolve_batching_params(query, (*params).into());
    *params = resolved.into();
    0
}
