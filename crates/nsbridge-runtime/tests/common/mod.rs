//! Shared helpers for bridge integration tests

#![allow(dead_code)]

use nsbridge_runtime::collection::{self, MutableCollection};
use nsbridge_runtime::{scalar, ForeignRuntime, Handle};

pub use pretty_assertions::{assert_eq, assert_ne};

/// Native string for `text`
pub fn text(rt: &dyn ForeignRuntime, text: &str) -> Handle {
    scalar::text_to_native(rt, text).expect("text should cross the boundary")
}

/// Contents of a native string
pub fn read_text(rt: &dyn ForeignRuntime, handle: Handle) -> String {
    scalar::native_to_text(rt, Some(handle))
        .expect("handle should read back")
        .expect("handle is not null")
}

/// New collection holding fresh strings for `items`, in order
///
/// The collection keeps the strings alive; the returned handles are the
/// caller's own references.
pub fn collection_of(
    rt: &dyn ForeignRuntime,
    items: &[&str],
) -> (MutableCollection, Vec<Handle>) {
    let c = collection::new_mutable_collection(rt).expect("collection");
    let handles: Vec<Handle> = items.iter().map(|s| text(rt, s)).collect();
    for h in &handles {
        collection::append(rt, c, *h).expect("append");
    }
    (c, handles)
}

/// Strings currently in `c`, in order
pub fn texts_in(rt: &dyn ForeignRuntime, c: MutableCollection) -> Vec<String> {
    collection::to_vec(rt, c)
        .expect("snapshot")
        .into_iter()
        .map(|h| read_text(rt, h))
        .collect()
}

/// The C test binding compiled by build.rs
#[cfg(unix)]
pub fn native_runtime() -> nsbridge_runtime::DylibRuntime {
    let dir = std::path::PathBuf::from(env!("OUT_DIR")).join("test-binding");
    // SAFETY: tests/fixtures/jmac_binding.c exports the binding's signatures
    unsafe { nsbridge_runtime::DylibRuntime::load("JMacNotification", &[dir]) }
        .expect("test binding should be built by build.rs")
}
