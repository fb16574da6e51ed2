//! nsbridge runtime - marshalling between Rust values and a foreign object runtime
//!
//! This library converts managed values into opaque handles owned by the
//! notification object runtime, and back:
//! - strings, images and activation types
//! - date components and dates, under an explicit calendar
//! - notification actions
//! - mutable ordered collections of handles
//! - runtime equality and hashing
//!
//! Every bridge function takes the runtime it talks to as its first
//! argument. [`MemoryRuntime`] runs entirely in process; [`DylibRuntime`]
//! drives the native binding library.

/// nsbridge runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod action;
pub mod bridge;
pub mod calendar;
pub mod collection;
pub mod date;
pub mod error;
pub mod handle;
pub mod identity;
pub mod logging;
pub mod runtime;
pub mod scalar;

pub use action::Action;
pub use calendar::{Calendar, CalendarFields, CalendarUnit};
pub use collection::MutableCollection;
pub use error::{BridgeError, BridgeResult};
pub use handle::{Handle, ScopedHandle};
pub use identity::ObjectKey;
pub use runtime::dylib::DylibRuntime;
pub use runtime::loader::{LibraryLoader, LoadError};
pub use runtime::memory::MemoryRuntime;
pub use runtime::ForeignRuntime;
pub use scalar::{ActivationType, RawActivation};
