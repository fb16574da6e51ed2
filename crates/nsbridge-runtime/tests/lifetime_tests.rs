//! Reference ownership across the bridge

mod common;

use common::*;
use common::assert_eq;
use nsbridge_runtime::collection;
use nsbridge_runtime::{BridgeError, ForeignRuntime, MemoryRuntime, ScopedHandle};

#[test]
fn test_scoped_handle_releases_on_drop() {
    let rt = MemoryRuntime::new();
    {
        let _owned = ScopedHandle::new(&rt, text(&rt, "temporary"));
        assert_eq!(rt.live_objects(), 1);
    }
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn test_into_inner_keeps_the_object() {
    let rt = MemoryRuntime::new();
    let handle = ScopedHandle::new(&rt, text(&rt, "kept")).into_inner();
    assert_eq!(read_text(&rt, handle), "kept");
}

#[test]
fn test_released_handle_is_stale() {
    let rt = MemoryRuntime::new();
    let h = text(&rt, "gone");
    rt.release(h).unwrap();
    assert!(matches!(
        nsbridge_runtime::scalar::native_to_text(&rt, Some(h)),
        Err(BridgeError::StaleHandle(stale)) if stale == h
    ));
}

#[test]
fn test_collection_keeps_elements_alive() {
    let rt = MemoryRuntime::new();
    let (c, handles) = collection_of(&rt, &["a", "b"]);
    for h in &handles {
        rt.release(*h).unwrap();
    }
    assert_eq!(texts_in(&rt, c), vec!["a", "b"]);

    rt.release(c.handle()).unwrap();
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn test_borrowed_element_can_be_retained_past_removal() {
    let rt = MemoryRuntime::new();
    let (c, handles) = collection_of(&rt, &["only"]);
    rt.release(handles[0]).unwrap();

    let borrowed = collection::element_at(&rt, c, 0).unwrap();
    let owned = ScopedHandle::retain(&rt, borrowed).unwrap();
    collection::remove_at(&rt, c, 0).unwrap();

    assert_eq!(read_text(&rt, owned.get()), "only");
    drop(owned);
    assert!(rt.retain_count(borrowed).is_none());
}

#[test]
fn test_replaced_element_is_released() {
    let rt = MemoryRuntime::new();
    let (c, handles) = collection_of(&rt, &["old"]);
    let new = text(&rt, "new");
    collection::replace_at(&rt, c, 0, new).unwrap();

    assert_eq!(rt.retain_count(handles[0]), Some(1));
    assert_eq!(rt.retain_count(new), Some(2));
}
