//! Foreign object runtimes
//!
//! [`ForeignRuntime`] is the raw native call surface every bridge function
//! is written against. It mirrors the native binding closely: integers are
//! C-sized, the date-components getter still returns the runtime's
//! "undefined" sentinel, and no bounds are checked. The bridge modules
//! (`scalar`, `date`, `action`, `collection`, `identity`) add the typed,
//! checked layer on top.
//!
//! Backends:
//! - [`memory::MemoryRuntime`]: in-process object runtime with reference
//!   counting and value equality, used in tests and on hosts without the
//!   native binding
//! - [`dylib::DylibRuntime`]: the native binding library loaded at runtime
//!
//! # Ownership
//!
//! Every call that creates an object returns a handle carrying one
//! reference owned by the caller. Arrays hold their own reference to each
//! element. Handles returned by `array_object_at` are borrowed.

pub mod dylib;
pub mod loader;
pub mod memory;

use crate::calendar::{Calendar, CalendarUnit};
use crate::handle::Handle;
use crate::scalar::RawActivation;
use crate::BridgeResult;
use std::ffi::CStr;

/// Value native date components report for a unit that was never set
///
/// Runtimes may use a different marker; ask [`ForeignRuntime::undefined_component`].
pub const UNDEFINED_COMPONENT: i32 = i32::MIN;

pub trait ForeignRuntime: Send + Sync {
    /// Short backend name used in logs and errors
    fn backend_name(&self) -> &'static str;

    fn retain(&self, object: Handle) -> BridgeResult<()>;
    fn release(&self, object: Handle) -> BridgeResult<()>;

    // ===== Scalars =====

    fn string_from_utf8(&self, text: &CStr) -> BridgeResult<Handle>;
    fn string_to_utf8(&self, string: Handle) -> BridgeResult<String>;
    /// `None` when nothing decodes as an image, including a missing file
    fn image_from_file(&self, path: &CStr) -> BridgeResult<Option<Handle>>;
    /// Unknown names map to a runtime-chosen value, not an error
    fn activation_from_name(&self, name: &CStr) -> BridgeResult<RawActivation>;
    fn activation_name(&self, value: RawActivation) -> BridgeResult<String>;

    // ===== Identity =====

    fn is_equal(&self, a: Handle, b: Handle) -> BridgeResult<bool>;
    fn hash(&self, object: Handle) -> BridgeResult<u64>;

    // ===== Date components =====

    fn new_date_components(&self) -> BridgeResult<Handle>;
    fn set_component(&self, components: Handle, unit: CalendarUnit, value: i32)
        -> BridgeResult<()>;
    /// Raw value, [`ForeignRuntime::undefined_component`] when unset
    fn component(&self, components: Handle, unit: CalendarUnit) -> BridgeResult<i32>;

    fn undefined_component(&self) -> i32 {
        UNDEFINED_COMPONENT
    }

    fn components_from_date(&self, date: Handle, calendar: &Calendar) -> BridgeResult<Handle>;
    /// `None` when the native calendar produced no date
    fn date_from_components(
        &self,
        components: Handle,
        calendar: &Calendar,
    ) -> BridgeResult<Option<Handle>>;

    // ===== Actions =====

    fn new_action(&self, identifier: &CStr, title: &CStr) -> BridgeResult<Handle>;
    fn action_identifier(&self, action: Handle) -> BridgeResult<String>;
    fn action_title(&self, action: Handle) -> BridgeResult<String>;

    // ===== Mutable arrays (indices unchecked) =====

    fn new_mutable_array(&self) -> BridgeResult<Handle>;
    fn array_count(&self, array: Handle) -> BridgeResult<usize>;
    fn array_contains(&self, array: Handle, object: Handle) -> BridgeResult<bool>;
    fn array_object_at(&self, array: Handle, index: usize) -> BridgeResult<Handle>;
    fn array_index_of(&self, array: Handle, object: Handle) -> BridgeResult<Option<usize>>;
    fn array_add(&self, array: Handle, object: Handle) -> BridgeResult<()>;
    fn array_insert(&self, array: Handle, object: Handle, index: usize) -> BridgeResult<()>;
    fn array_remove_all(&self, array: Handle) -> BridgeResult<()>;
    fn array_remove_at(&self, array: Handle, index: usize) -> BridgeResult<()>;
    fn array_replace_at(&self, array: Handle, index: usize, object: Handle) -> BridgeResult<()>;
    fn array_exchange(&self, array: Handle, a: usize, b: usize) -> BridgeResult<()>;
}
