//! Mutable ordered collections of handles
//!
//! Native arrays abort the process on an out-of-range index, so every
//! indexed operation is checked here against the current count first and
//! reported as [`BridgeError::Index`].
//!
//! Two removals look alike but differ: [`remove_first_equal`] removes the
//! first element the runtime considers equal, [`remove_first_identical`]
//! only the given object itself. Both remove at most one element, even
//! though the native array's own removals drop every match.

use crate::handle::Handle;
use crate::runtime::ForeignRuntime;
use crate::{BridgeError, BridgeResult};
use tracing::trace;

/// Handle known to name a mutable array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutableCollection(Handle);

impl MutableCollection {
    /// Treat `handle` as a mutable array
    ///
    /// Runtimes that track kinds still report a mismatch on first use.
    pub fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> Handle {
        self.0
    }
}

impl From<MutableCollection> for Handle {
    fn from(collection: MutableCollection) -> Self {
        collection.0
    }
}

fn check_index(index: usize, count: usize) -> BridgeResult<()> {
    if index < count {
        Ok(())
    } else {
        Err(BridgeError::Index { index, count })
    }
}

pub fn new_mutable_collection(rt: &dyn ForeignRuntime) -> BridgeResult<MutableCollection> {
    rt.new_mutable_array().map(MutableCollection)
}

/// Whether any element is equal to `element`
pub fn contains(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    element: Handle,
) -> BridgeResult<bool> {
    rt.array_contains(collection.0, element)
}

pub fn count(rt: &dyn ForeignRuntime, collection: MutableCollection) -> BridgeResult<usize> {
    rt.array_count(collection.0)
}

/// Element at `index`
///
/// The returned handle is borrowed from the collection; retain it (for
/// example with [`crate::ScopedHandle::retain`]) to keep it past a removal.
pub fn element_at(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    index: usize,
) -> BridgeResult<Handle> {
    check_index(index, count(rt, collection)?)?;
    rt.array_object_at(collection.0, index)
}

/// Position of the first element equal to `element`
pub fn index_of(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    element: Handle,
) -> BridgeResult<Option<usize>> {
    rt.array_index_of(collection.0, element)
}

pub fn append(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    element: Handle,
) -> BridgeResult<()> {
    trace!(collection = %collection.0, %element, "append");
    rt.array_add(collection.0, element)
}

/// Insert before `index`; `index == count` appends
pub fn insert_at(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    element: Handle,
    index: usize,
) -> BridgeResult<()> {
    let count = count(rt, collection)?;
    if index > count {
        return Err(BridgeError::Index { index, count });
    }
    trace!(collection = %collection.0, %element, index, "insert");
    rt.array_insert(collection.0, element, index)
}

/// Empty the collection
///
/// Only the collection's own references are dropped; elements held
/// elsewhere stay alive.
pub fn remove_all(rt: &dyn ForeignRuntime, collection: MutableCollection) -> BridgeResult<()> {
    trace!(collection = %collection.0, "remove all");
    rt.array_remove_all(collection.0)
}

/// Remove the first element equal to `element`; no-op when none is
pub fn remove_first_equal(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    element: Handle,
) -> BridgeResult<()> {
    if let Some(index) = index_of(rt, collection, element)? {
        trace!(collection = %collection.0, %element, index, "remove equal");
        rt.array_remove_at(collection.0, index)?;
    }
    Ok(())
}

pub fn remove_at(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    index: usize,
) -> BridgeResult<()> {
    check_index(index, count(rt, collection)?)?;
    trace!(collection = %collection.0, index, "remove at");
    rt.array_remove_at(collection.0, index)
}

/// Remove the first occurrence of `element` itself; equal copies stay
pub fn remove_first_identical(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    element: Handle,
) -> BridgeResult<()> {
    for index in 0..count(rt, collection)? {
        if rt.array_object_at(collection.0, index)? == element {
            trace!(collection = %collection.0, %element, index, "remove identical");
            return rt.array_remove_at(collection.0, index);
        }
    }
    Ok(())
}

pub fn replace_at(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    index: usize,
    element: Handle,
) -> BridgeResult<()> {
    check_index(index, count(rt, collection)?)?;
    trace!(collection = %collection.0, index, %element, "replace");
    rt.array_replace_at(collection.0, index, element)
}

/// Exchange the elements at `a` and `b`
pub fn swap(
    rt: &dyn ForeignRuntime,
    collection: MutableCollection,
    a: usize,
    b: usize,
) -> BridgeResult<()> {
    let count = count(rt, collection)?;
    check_index(a, count)?;
    check_index(b, count)?;
    trace!(collection = %collection.0, a, b, "swap");
    rt.array_exchange(collection.0, a, b)
}

/// Borrowed handles of every element, in order
pub fn to_vec(rt: &dyn ForeignRuntime, collection: MutableCollection) -> BridgeResult<Vec<Handle>> {
    let count = count(rt, collection)?;
    (0..count)
        .map(|i| rt.array_object_at(collection.0, i))
        .collect()
}
