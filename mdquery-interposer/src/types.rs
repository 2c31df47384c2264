//! Core types for the interposer library
//!
//! This module defines the opaque query handle the engine passes into hooks and
//! the error type shared by the slots and the C ABI surface.

use std::any::Any;
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Result type for interposer operations
pub type Result<T> = std::result::Result<T, InterposerError>;

/// Opaque reference to an engine-owned query object
///
/// The interposer never creates, owns or dereferences the query. The `'q`
/// lifetime ties the handle to the engine call that produced it: hooks receive
/// a `QueryHandle<'_>` and cannot keep it in `'static` state. Hooks that need
/// to remember a query record its [`addr`](QueryHandle::addr) instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle<'q> {
    ptr: NonNull<c_void>,
    _query: PhantomData<&'q c_void>,
}

// The pointer is only forwarded, never dereferenced, so moving it between
// engine threads is sound.
unsafe impl Send for QueryHandle<'_> {}
unsafe impl Sync for QueryHandle<'_> {}

impl<'q> QueryHandle<'q> {
    /// Wrap a raw query pointer received from the engine
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    /// The caller must guarantee the query stays alive for `'q`.
    pub unsafe fn from_raw(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(|ptr| Self {
            ptr,
            _query: PhantomData,
        })
    }

    /// Borrow a Rust-side query object as a handle
    ///
    /// Zero-sized objects may share an address, so they make poor handles.
    pub fn from_ref<T>(query: &'q T) -> Self {
        Self {
            ptr: NonNull::from(query).cast(),
            _query: PhantomData,
        }
    }

    /// Raw pointer to the engine's query object
    pub fn as_ptr(&self) -> *const c_void {
        self.ptr.as_ptr()
    }

    /// Address of the query object, usable as an identifier after the call
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl fmt::Debug for QueryHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryHandle({:p})", self.ptr)
    }
}

/// Errors surfaced by the interposer
///
/// An unset slot is never an error; these only describe bad engine input and
/// faults raised by a registered hook.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InterposerError {
    #[error("Query handle is null")]
    NullHandle,

    #[error("Batching parameters pointer is null")]
    NullParams,

    #[error("Hook panicked: {0}")]
    HookPanicked(String),
}

impl InterposerError {
    /// Status code reported across the C ABI (0 is reserved for success)
    pub fn code(&self) -> i32 {
        match self {
            InterposerError::NullHandle => 1,
            InterposerError::NullParams => 2,
            InterposerError::HookPanicked(_) => 3,
        }
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
