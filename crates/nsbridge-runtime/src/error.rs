//! Error taxonomy for bridge operations
//!
//! "Absence" outcomes (null handle, element not found, unspecified field) are
//! `Option` values, never errors.

use crate::calendar::CalendarUnit;
use crate::handle::Handle;
use crate::runtime::loader::LoadError;
use nsbridge_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Text contains a NUL byte, which native C strings cannot carry
    #[error("Text cannot be represented as a native string: NUL byte at position {position}")]
    Encoding { position: usize },

    #[error("Index {index} out of bounds for collection of {count} elements")]
    Index { index: usize, count: usize },

    /// The native call returned nil where an object was required
    #[error("Native call `{call}` returned a null object")]
    NullHandle { call: &'static str },

    #[error("Handle {0} refers to an object the runtime has already released")]
    StaleHandle(Handle),

    #[error("Handle {handle} is a {found}, expected {expected}")]
    WrongKind {
        handle: Handle,
        expected: &'static str,
        found: &'static str,
    },

    /// The value collides with the runtime's "unspecified" marker
    #[error("{value} is reserved by the runtime to mark an unspecified {unit}")]
    ReservedComponentValue { unit: CalendarUnit, value: i32 },

    #[error("Calendar fields do not resolve to a date: {0}")]
    UnresolvableDate(String),

    #[error("The {backend} backend only converts dates with the system calendar")]
    CalendarUnsupported { backend: &'static str },

    #[error("Unknown time zone: '{0}'")]
    InvalidTimezone(String),

    #[error("Value {value} does not fit the native {target}")]
    OutOfRange { value: usize, target: &'static str },

    /// The native array reported a count no collection can have
    #[error("Native call `{call}` reported an invalid element count {count}")]
    InvalidCount { call: &'static str, count: i32 },

    #[error("Bridge is not initialized; call bridge::install or bridge::init_from_config first")]
    NotReady,

    #[error("Bridge is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<std::ffi::NulError> for BridgeError {
    fn from(e: std::ffi::NulError) -> Self {
        BridgeError::Encoding {
            position: e.nul_position(),
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
