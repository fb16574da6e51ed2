//! Opaque handles to foreign objects
//!
//! A [`Handle`] is the address of an object owned by the foreign runtime.
//! Rust never dereferences it; handles are only passed back into runtime
//! calls. Two handles compare equal when they name the same object
//! (identity). Value equality is a runtime question, see [`crate::identity`].
//!
//! Null is not a handle: the absent object is `Option<Handle>::None`.

use crate::runtime::ForeignRuntime;
use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::warn;

/// Non-null reference to a foreign object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroUsize);

impl Handle {
    /// Wrap a raw object pointer returned by native code
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live object of the runtime the
    /// handle will be passed to. Native backends hand the address straight
    /// to foreign code.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonZeroUsize::new(ptr as usize).map(Handle)
    }

    /// Addresses minted by an in-process runtime
    pub(crate) fn from_addr(addr: NonZeroUsize) -> Self {
        Handle(addr)
    }

    pub fn as_raw(self) -> *mut c_void {
        self.0.get() as *mut c_void
    }

    pub fn addr(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0.get())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// Raw pointer for a possibly-absent handle
pub fn raw_or_null(handle: Option<Handle>) -> *mut c_void {
    handle.map_or(std::ptr::null_mut(), Handle::as_raw)
}

/// Owns one reference to a foreign object and releases it on drop
///
/// Every creating bridge call returns a handle carrying a reference owned by
/// the caller. Wrapping it here ties the release to a Rust scope.
///
/// # Example
///
/// ```
/// # use nsbridge_runtime::{scalar, MemoryRuntime, ScopedHandle};
/// let rt = MemoryRuntime::new();
/// {
///     let text = ScopedHandle::new(&rt, scalar::text_to_native(&rt, "hello").unwrap());
///     assert_eq!(rt.live_objects(), 1);
///     # let _ = text.get();
/// }
/// assert_eq!(rt.live_objects(), 0);
/// ```
pub struct ScopedHandle<'rt> {
    runtime: &'rt dyn ForeignRuntime,
    handle: Handle,
}

impl<'rt> ScopedHandle<'rt> {
    /// Take ownership of the caller's reference to `handle`
    pub fn new(runtime: &'rt dyn ForeignRuntime, handle: Handle) -> Self {
        Self { runtime, handle }
    }

    /// Add a reference to a borrowed handle (e.g. one read out of a
    /// collection) and own it
    pub fn retain(runtime: &'rt dyn ForeignRuntime, handle: Handle) -> crate::BridgeResult<Self> {
        runtime.retain(handle)?;
        Ok(Self::new(runtime, handle))
    }

    pub fn get(&self) -> Handle {
        self.handle
    }

    /// Give up ownership without releasing
    pub fn into_inner(self) -> Handle {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl fmt::Debug for ScopedHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedHandle")
            .field("backend", &self.runtime.backend_name())
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for ScopedHandle<'_> {
    fn drop(&mut self) {
        let handle = self.handle;
        if let Err(e) = self.runtime.release(handle) {
            warn!(%handle, "release on scope exit failed: {}", e);
        }
    }
}
