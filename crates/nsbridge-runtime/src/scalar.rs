//! Scalar conversions: text, images, activation types
//!
//! Rust strings are always valid UTF-8, so the one thing that can stop a
//! string from crossing is an interior NUL byte: the native side receives a
//! C string. That is reported as [`BridgeError::Encoding`].

use crate::handle::Handle;
use crate::runtime::ForeignRuntime;
use crate::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::fmt;
use std::path::Path;

/// Native activation-type value
///
/// The binding passes the enumeration as a pointer-sized integer, so zero
/// is a real value here, not null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawActivation(pub isize);

impl RawActivation {
    /// What the reference runtime answers for names it does not know
    pub const UNKNOWN: RawActivation = RawActivation(-1);
}

/// How the user activated a delivered notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationType {
    None,
    ContentsClicked,
    ActionButtonClicked,
    Replied,
    AdditionalActionClicked,
}

impl ActivationType {
    pub const ALL: [ActivationType; 5] = [
        ActivationType::None,
        ActivationType::ContentsClicked,
        ActivationType::ActionButtonClicked,
        ActivationType::Replied,
        ActivationType::AdditionalActionClicked,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActivationType::None => "NONE",
            ActivationType::ContentsClicked => "CONTENTS_CLICKED",
            ActivationType::ActionButtonClicked => "ACTION_BUTTON_CLICKED",
            ActivationType::Replied => "REPLIED",
            ActivationType::AdditionalActionClicked => "ADDITIONAL_ACTION_CLICKED",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn raw(&self) -> RawActivation {
        RawActivation(*self as isize)
    }

    pub fn from_raw(raw: RawActivation) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.raw() == raw)
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Create a native string from `text`
pub fn text_to_native(rt: &dyn ForeignRuntime, text: &str) -> BridgeResult<Handle> {
    let c_text = CString::new(text)?;
    rt.string_from_utf8(&c_text)
}

/// Read a native string back; the null handle reads as `None`
pub fn native_to_text(
    rt: &dyn ForeignRuntime,
    string: Option<Handle>,
) -> BridgeResult<Option<String>> {
    match string {
        Some(handle) => rt.string_to_utf8(handle).map(Some),
        None => Ok(None),
    }
}

/// Load an image from a file
///
/// Missing or undecodable files give `Ok(None)`; callers must check.
pub fn image_from_path(rt: &dyn ForeignRuntime, path: &Path) -> BridgeResult<Option<Handle>> {
    // Native paths are UTF-8 strings
    let text = std::str::from_utf8(path.as_os_str().as_encoded_bytes()).map_err(|e| {
        BridgeError::Encoding {
            position: e.valid_up_to(),
        }
    })?;
    let c_path = CString::new(text)?;
    rt.image_from_file(&c_path)
}

/// Map an activation-type name to its native value
///
/// Names outside [`ActivationType::ALL`] still produce a value; the runtime
/// decides which one, and it reads back as "unknown".
pub fn activation_type_to_native(
    rt: &dyn ForeignRuntime,
    name: &str,
) -> BridgeResult<RawActivation> {
    let c_name = CString::new(name)?;
    rt.activation_from_name(&c_name)
}

pub fn native_to_activation_type(
    rt: &dyn ForeignRuntime,
    value: RawActivation,
) -> BridgeResult<String> {
    rt.activation_name(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryRuntime;
    use rstest::rstest;

    #[test]
    fn test_text_round_trip() {
        let rt = MemoryRuntime::new();
        let handle = text_to_native(&rt, "Grüße, 世界").unwrap();
        assert_eq!(
            native_to_text(&rt, Some(handle)).unwrap().as_deref(),
            Some("Grüße, 世界")
        );
    }

    #[test]
    fn test_empty_text_round_trip() {
        let rt = MemoryRuntime::new();
        let handle = text_to_native(&rt, "").unwrap();
        assert_eq!(native_to_text(&rt, Some(handle)).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_null_handle_reads_as_none() {
        let rt = MemoryRuntime::new();
        assert_eq!(native_to_text(&rt, None).unwrap(), None);
    }

    #[test]
    fn test_interior_nul_is_encoding_error() {
        let rt = MemoryRuntime::new();
        let result = text_to_native(&rt, "abc\0def");
        assert!(matches!(result, Err(BridgeError::Encoding { position: 3 })));
        assert_eq!(rt.live_objects(), 0);
    }

    #[rstest]
    #[case(ActivationType::None, 0)]
    #[case(ActivationType::ContentsClicked, 1)]
    #[case(ActivationType::ActionButtonClicked, 2)]
    #[case(ActivationType::Replied, 3)]
    #[case(ActivationType::AdditionalActionClicked, 4)]
    fn test_activation_native_values(#[case] kind: ActivationType, #[case] raw: isize) {
        assert_eq!(kind.raw(), RawActivation(raw));
        assert_eq!(ActivationType::from_raw(RawActivation(raw)), Some(kind));
        assert_eq!(ActivationType::from_name(kind.name()), Some(kind));
    }

    #[test]
    fn test_activation_round_trip_through_runtime() {
        let rt = MemoryRuntime::new();
        for kind in ActivationType::ALL {
            let raw = activation_type_to_native(&rt, kind.name()).unwrap();
            assert_eq!(raw, kind.raw());
            assert_eq!(native_to_activation_type(&rt, raw).unwrap(), kind.name());
        }
    }

    #[test]
    fn test_unknown_activation_is_not_an_error() {
        let rt = MemoryRuntime::new();
        let raw = activation_type_to_native(&rt, "DOUBLE_TAPPED").unwrap();
        assert_eq!(raw, RawActivation::UNKNOWN);
        assert_eq!(native_to_activation_type(&rt, raw).unwrap(), "UNKNOWN");
    }
}
