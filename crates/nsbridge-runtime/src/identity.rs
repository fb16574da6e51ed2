//! Object equality and hashing
//!
//! Equality is the runtime's notion (strings by content, for example), not
//! handle identity. Identical handles are equal without asking the runtime.

use crate::handle::Handle;
use crate::runtime::ForeignRuntime;
use crate::BridgeResult;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub fn equal(rt: &dyn ForeignRuntime, a: Handle, b: Handle) -> BridgeResult<bool> {
    if a == b {
        return Ok(true);
    }
    rt.is_equal(a, b)
}

/// Hash consistent with [`equal`]
pub fn hash(rt: &dyn ForeignRuntime, object: Handle) -> BridgeResult<u64> {
    rt.hash(object)
}

/// Handle usable as a `HashMap`/`HashSet` key under runtime equality
///
/// The hash is computed once at construction. Comparing two keys asks the
/// runtime, so the objects must stay alive and unchanged while keyed.
#[derive(Clone, Copy)]
pub struct ObjectKey<'rt> {
    runtime: &'rt dyn ForeignRuntime,
    handle: Handle,
    hash: u64,
}

impl<'rt> ObjectKey<'rt> {
    pub fn new(runtime: &'rt dyn ForeignRuntime, handle: Handle) -> BridgeResult<Self> {
        Ok(Self {
            runtime,
            handle,
            hash: hash(runtime, handle)?,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl PartialEq for ObjectKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        // A failing native comparison counts as "different"
        self.hash == other.hash && equal(self.runtime, self.handle, other.handle).unwrap_or(false)
    }
}

impl Eq for ObjectKey<'_> {}

impl Hash for ObjectKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl std::fmt::Debug for ObjectKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectKey")
            .field("handle", &self.handle)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .finish()
    }
}

/// First handle of each equality class, in input order
pub fn dedup(rt: &dyn ForeignRuntime, handles: &[Handle]) -> BridgeResult<Vec<Handle>> {
    // Buckets by hash, then runtime equality within a bucket
    let mut seen: HashMap<u64, Vec<Handle>> = HashMap::new();
    let mut unique = Vec::new();
    for &handle in handles {
        let bucket = seen.entry(hash(rt, handle)?).or_default();
        let mut duplicate = false;
        for &kept in bucket.iter() {
            if equal(rt, kept, handle)? {
                duplicate = true;
                break;
            }
        }
        if !duplicate {
            bucket.push(handle);
            unique.push(handle);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::text_to_native;
    use crate::MemoryRuntime;
    use std::collections::HashSet;

    #[test]
    fn test_identical_is_equal() {
        let rt = MemoryRuntime::new();
        let a = text_to_native(&rt, "x").unwrap();
        assert!(equal(&rt, a, a).unwrap());
    }

    #[test]
    fn test_equal_strings_share_hash() {
        let rt = MemoryRuntime::new();
        let a = text_to_native(&rt, "x").unwrap();
        let b = text_to_native(&rt, "x").unwrap();
        let c = text_to_native(&rt, "y").unwrap();
        assert!(equal(&rt, a, b).unwrap());
        assert!(equal(&rt, b, a).unwrap());
        assert!(!equal(&rt, a, c).unwrap());
        assert_eq!(hash(&rt, a).unwrap(), hash(&rt, b).unwrap());
    }

    #[test]
    fn test_object_keys_in_a_set() {
        let rt = MemoryRuntime::new();
        let a = text_to_native(&rt, "x").unwrap();
        let b = text_to_native(&rt, "x").unwrap();
        let c = text_to_native(&rt, "y").unwrap();

        let set: HashSet<ObjectKey> = [a, b, c]
            .into_iter()
            .map(|h| ObjectKey::new(&rt, h).unwrap())
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&ObjectKey::new(&rt, b).unwrap()));
    }

    #[test]
    fn test_dedup_keeps_first_of_each_class() {
        let rt = MemoryRuntime::new();
        let a1 = text_to_native(&rt, "a").unwrap();
        let b = text_to_native(&rt, "b").unwrap();
        let a2 = text_to_native(&rt, "a").unwrap();
        assert_eq!(dedup(&rt, &[a1, b, a2, b]).unwrap(), vec![a1, b]);
    }
}
