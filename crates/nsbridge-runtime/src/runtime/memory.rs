//! In-process object runtime
//!
//! Stands in for the native object system wherever the binding library is
//! not available. It follows the same contracts the bridge relies on:
//!
//! - reference counting: creation returns one owned reference, arrays
//!   retain their elements, releasing the last reference frees the object
//! - value equality for strings, dates, date components and arrays;
//!   identity equality for actions and images
//! - hashes consistent with that equality
//!
//! Addresses are never reused, so a released handle is reported as
//! [`BridgeError::StaleHandle`] instead of silently naming a new object.

use crate::calendar::{Calendar, CalendarFields, CalendarUnit};
use crate::handle::Handle;
use crate::runtime::{ForeignRuntime, UNDEFINED_COMPONENT};
use crate::scalar::{ActivationType, RawActivation};
use crate::{BridgeError, BridgeResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::ffi::CStr;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::trace;

const FIRST_ADDRESS: usize = 0x1000;
const ADDRESS_STRIDE: usize = 0x10;

/// Leading bytes of the image formats the runtime recognizes
const IMAGE_SIGNATURES: &[&[u8]] = &[
    b"\x89PNG\r\n\x1a\n",
    b"\xff\xd8\xff",
    b"GIF87a",
    b"GIF89a",
    b"II*\0",
    b"MM\0*",
    b"BM",
    b"icns",
];

#[derive(Debug, Clone)]
enum Object {
    Text(String),
    Image { path: PathBuf },
    Date(DateTime<Utc>),
    Components(CalendarFields),
    Action { identifier: String, title: String },
    Array(Vec<Handle>),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Object::Text(_) => "string",
            Object::Image { .. } => "image",
            Object::Date(_) => "date",
            Object::Components(_) => "date components",
            Object::Action { .. } => "action",
            Object::Array(_) => "mutable array",
        }
    }
}

struct Slot {
    refs: usize,
    object: Object,
}

struct Arena {
    next: usize,
    slots: HashMap<usize, Slot>,
}

impl Arena {
    fn new() -> Self {
        Self {
            next: FIRST_ADDRESS,
            slots: HashMap::new(),
        }
    }

    fn insert(&mut self, object: Object) -> Handle {
        let addr = self.next;
        self.next += ADDRESS_STRIDE;
        trace!(addr, kind = object.kind(), "object created");
        self.slots.insert(addr, Slot { refs: 1, object });
        // FIRST_ADDRESS is non-zero and addresses only grow
        Handle::from_addr(NonZeroUsize::new(addr).unwrap_or(NonZeroUsize::MIN))
    }

    fn get(&self, handle: Handle) -> BridgeResult<&Object> {
        self.slots
            .get(&handle.addr())
            .map(|slot| &slot.object)
            .ok_or(BridgeError::StaleHandle(handle))
    }

    fn get_mut(&mut self, handle: Handle) -> BridgeResult<&mut Object> {
        self.slots
            .get_mut(&handle.addr())
            .map(|slot| &mut slot.object)
            .ok_or(BridgeError::StaleHandle(handle))
    }

    fn retain(&mut self, handle: Handle) -> BridgeResult<()> {
        let slot = self
            .slots
            .get_mut(&handle.addr())
            .ok_or(BridgeError::StaleHandle(handle))?;
        slot.refs += 1;
        Ok(())
    }

    fn release(&mut self, handle: Handle) -> BridgeResult<()> {
        // Worklist instead of recursion: freeing an array releases its elements.
        let mut pending = vec![handle];
        let mut first = true;
        while let Some(h) = pending.pop() {
            let Some(slot) = self.slots.get_mut(&h.addr()) else {
                if first {
                    return Err(BridgeError::StaleHandle(h));
                }
                continue;
            };
            first = false;
            slot.refs -= 1;
            if slot.refs == 0 {
                if let Some(freed) = self.slots.remove(&h.addr()) {
                    trace!(addr = h.addr(), kind = freed.object.kind(), "object freed");
                    if let Object::Array(elements) = freed.object {
                        pending.extend(elements);
                    }
                }
            }
        }
        Ok(())
    }

    fn text(&self, handle: Handle) -> BridgeResult<&str> {
        match self.get(handle)? {
            Object::Text(s) => Ok(s),
            other => Err(wrong_kind(handle, "string", other)),
        }
    }

    fn components(&mut self, handle: Handle) -> BridgeResult<&mut CalendarFields> {
        match self.get_mut(handle)? {
            Object::Components(fields) => Ok(fields),
            other => Err(wrong_kind(handle, "date components", other)),
        }
    }

    fn array(&self, handle: Handle) -> BridgeResult<&Vec<Handle>> {
        match self.get(handle)? {
            Object::Array(elements) => Ok(elements),
            other => Err(wrong_kind(handle, "mutable array", other)),
        }
    }

    fn array_mut(&mut self, handle: Handle) -> BridgeResult<&mut Vec<Handle>> {
        match self.get_mut(handle)? {
            Object::Array(elements) => Ok(elements),
            other => Err(wrong_kind(handle, "mutable array", other)),
        }
    }

    fn action(&self, handle: Handle) -> BridgeResult<(&str, &str)> {
        match self.get(handle)? {
            Object::Action { identifier, title } => Ok((identifier, title)),
            other => Err(wrong_kind(handle, "action", other)),
        }
    }

    fn equal(&self, a: Handle, b: Handle) -> BridgeResult<bool> {
        self.equal_within(a, b, &mut Vec::new())
    }

    /// `comparing` holds the array pairs whose comparison is in progress.
    /// Meeting one of them again is a cycle and counts as equal, so arrays
    /// that contain each other terminate.
    fn equal_within(
        &self,
        a: Handle,
        b: Handle,
        comparing: &mut Vec<(Handle, Handle)>,
    ) -> BridgeResult<bool> {
        if a == b {
            self.get(a)?;
            return Ok(true);
        }
        let equal = match (self.get(a)?, self.get(b)?) {
            (Object::Text(x), Object::Text(y)) => x == y,
            (Object::Date(x), Object::Date(y)) => x == y,
            (Object::Components(x), Object::Components(y)) => x == y,
            (Object::Array(xs), Object::Array(ys)) => {
                if xs.len() != ys.len() {
                    return Ok(false);
                }
                if comparing.contains(&(a, b)) {
                    return Ok(true);
                }
                comparing.push((a, b));
                let mut same = true;
                for (x, y) in xs.iter().zip(ys) {
                    if !self.equal_within(*x, *y, comparing)? {
                        same = false;
                        break;
                    }
                }
                comparing.pop();
                same
            }
            _ => false,
        };
        Ok(equal)
    }

    fn hash(&self, handle: Handle) -> BridgeResult<u64> {
        let mut hasher = DefaultHasher::new();
        match self.get(handle)? {
            Object::Text(s) => s.hash(&mut hasher),
            Object::Date(d) => d.hash(&mut hasher),
            Object::Components(fields) => fields.hash(&mut hasher),
            // Equal arrays have equal lengths; element hashes may not be cheap.
            Object::Array(elements) => elements.len().hash(&mut hasher),
            Object::Image { .. } | Object::Action { .. } => handle.hash(&mut hasher),
        }
        Ok(hasher.finish())
    }

    fn position_where(
        &self,
        array: Handle,
        mut matches: impl FnMut(&Self, Handle) -> BridgeResult<bool>,
    ) -> BridgeResult<Option<usize>> {
        for (i, element) in self.array(array)?.iter().enumerate() {
            if matches(self, *element)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}

fn wrong_kind(handle: Handle, expected: &'static str, found: &Object) -> BridgeError {
    BridgeError::WrongKind {
        handle,
        expected,
        found: found.kind(),
    }
}

fn c_text(text: &CStr) -> BridgeResult<String> {
    text.to_str()
        .map(str::to_owned)
        .map_err(|e| BridgeError::Encoding {
            position: e.valid_up_to(),
        })
}

fn looks_like_image(bytes: &[u8]) -> bool {
    IMAGE_SIGNATURES.iter().any(|sig| bytes.starts_with(sig))
}

/// Reference object runtime held entirely in process memory
pub struct MemoryRuntime {
    arena: Mutex<Arena>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self {
            arena: Mutex::new(Arena::new()),
        }
    }

    /// Create a date object for `instant`
    ///
    /// The native binding only creates dates from calendar fields; this
    /// gives tests and callers a direct way in.
    pub fn new_date(&self, instant: DateTime<Utc>) -> Handle {
        self.arena.lock().insert(Object::Date(instant))
    }

    /// Instant held by a date object
    pub fn date_value(&self, date: Handle) -> BridgeResult<DateTime<Utc>> {
        match self.arena.lock().get(date)? {
            Object::Date(d) => Ok(*d),
            other => Err(wrong_kind(date, "date", other)),
        }
    }

    /// Path an image object was decoded from
    pub fn image_path(&self, image: Handle) -> BridgeResult<PathBuf> {
        match self.arena.lock().get(image)? {
            Object::Image { path } => Ok(path.clone()),
            other => Err(wrong_kind(image, "image", other)),
        }
    }

    /// Number of objects not yet freed
    pub fn live_objects(&self) -> usize {
        self.arena.lock().slots.len()
    }

    /// Current reference count, `None` once freed
    pub fn retain_count(&self, object: Handle) -> Option<usize> {
        self.arena.lock().slots.get(&object.addr()).map(|slot| slot.refs)
    }

    fn decode_image(path: &Path) -> Option<Object> {
        let bytes = std::fs::read(path).ok()?;
        looks_like_image(&bytes).then(|| Object::Image {
            path: path.to_path_buf(),
        })
    }
}

impl Default for MemoryRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ForeignRuntime for MemoryRuntime {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn retain(&self, object: Handle) -> BridgeResult<()> {
        self.arena.lock().retain(object)
    }

    fn release(&self, object: Handle) -> BridgeResult<()> {
        self.arena.lock().release(object)
    }

    fn string_from_utf8(&self, text: &CStr) -> BridgeResult<Handle> {
        let text = c_text(text)?;
        Ok(self.arena.lock().insert(Object::Text(text)))
    }

    fn string_to_utf8(&self, string: Handle) -> BridgeResult<String> {
        self.arena.lock().text(string).map(str::to_owned)
    }

    fn image_from_file(&self, path: &CStr) -> BridgeResult<Option<Handle>> {
        let path = PathBuf::from(c_text(path)?);
        let Some(image) = Self::decode_image(&path) else {
            trace!(path = %path.display(), "no image decoded");
            return Ok(None);
        };
        Ok(Some(self.arena.lock().insert(image)))
    }

    fn activation_from_name(&self, name: &CStr) -> BridgeResult<RawActivation> {
        let name = c_text(name)?;
        Ok(ActivationType::from_name(&name)
            .map(|t| t.raw())
            .unwrap_or(RawActivation::UNKNOWN))
    }

    fn activation_name(&self, value: RawActivation) -> BridgeResult<String> {
        Ok(ActivationType::from_raw(value)
            .map(|t| t.name())
            .unwrap_or("UNKNOWN")
            .to_string())
    }

    fn is_equal(&self, a: Handle, b: Handle) -> BridgeResult<bool> {
        self.arena.lock().equal(a, b)
    }

    fn hash(&self, object: Handle) -> BridgeResult<u64> {
        self.arena.lock().hash(object)
    }

    fn new_date_components(&self) -> BridgeResult<Handle> {
        Ok(self
            .arena
            .lock()
            .insert(Object::Components(CalendarFields::new())))
    }

    fn set_component(
        &self,
        components: Handle,
        unit: CalendarUnit,
        value: i32,
    ) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        arena.components(components)?.set(unit, Some(value));
        Ok(())
    }

    fn component(&self, components: Handle, unit: CalendarUnit) -> BridgeResult<i32> {
        let mut arena = self.arena.lock();
        let fields = arena.components(components)?;
        Ok(fields.get(unit).unwrap_or(UNDEFINED_COMPONENT))
    }

    fn components_from_date(&self, date: Handle, calendar: &Calendar) -> BridgeResult<Handle> {
        let mut arena = self.arena.lock();
        let instant = match arena.get(date)? {
            Object::Date(d) => *d,
            other => return Err(wrong_kind(date, "date", other)),
        };
        Ok(arena.insert(Object::Components(calendar.decompose(instant))))
    }

    fn date_from_components(
        &self,
        components: Handle,
        calendar: &Calendar,
    ) -> BridgeResult<Option<Handle>> {
        let mut arena = self.arena.lock();
        let fields = *arena.components(components)?;
        let instant = calendar.resolve(&fields)?;
        Ok(Some(arena.insert(Object::Date(instant))))
    }

    fn new_action(&self, identifier: &CStr, title: &CStr) -> BridgeResult<Handle> {
        let action = Object::Action {
            identifier: c_text(identifier)?,
            title: c_text(title)?,
        };
        Ok(self.arena.lock().insert(action))
    }

    fn action_identifier(&self, action: Handle) -> BridgeResult<String> {
        self.arena
            .lock()
            .action(action)
            .map(|(identifier, _)| identifier.to_owned())
    }

    fn action_title(&self, action: Handle) -> BridgeResult<String> {
        self.arena.lock().action(action).map(|(_, title)| title.to_owned())
    }

    fn new_mutable_array(&self) -> BridgeResult<Handle> {
        Ok(self.arena.lock().insert(Object::Array(Vec::new())))
    }

    fn array_count(&self, array: Handle) -> BridgeResult<usize> {
        self.arena.lock().array(array).map(Vec::len)
    }

    fn array_contains(&self, array: Handle, object: Handle) -> BridgeResult<bool> {
        let arena = self.arena.lock();
        Ok(arena
            .position_where(array, |a, e| a.equal(e, object))?
            .is_some())
    }

    fn array_object_at(&self, array: Handle, index: usize) -> BridgeResult<Handle> {
        let arena = self.arena.lock();
        let elements = arena.array(array)?;
        elements.get(index).copied().ok_or(BridgeError::Index {
            index,
            count: elements.len(),
        })
    }

    fn array_index_of(&self, array: Handle, object: Handle) -> BridgeResult<Option<usize>> {
        self.arena
            .lock()
            .position_where(array, |a, e| a.equal(e, object))
    }

    fn array_add(&self, array: Handle, object: Handle) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        arena.array(array)?;
        arena.retain(object)?;
        arena.array_mut(array)?.push(object);
        Ok(())
    }

    fn array_insert(&self, array: Handle, object: Handle, index: usize) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        let count = arena.array(array)?.len();
        if index > count {
            return Err(BridgeError::Index { index, count });
        }
        arena.retain(object)?;
        arena.array_mut(array)?.insert(index, object);
        Ok(())
    }

    fn array_remove_all(&self, array: Handle) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        let removed = std::mem::take(arena.array_mut(array)?);
        for element in removed {
            arena.release(element)?;
        }
        Ok(())
    }

    fn array_remove_at(&self, array: Handle, index: usize) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        let elements = arena.array_mut(array)?;
        if index >= elements.len() {
            return Err(BridgeError::Index {
                index,
                count: elements.len(),
            });
        }
        let removed = elements.remove(index);
        arena.release(removed)
    }

    fn array_replace_at(&self, array: Handle, index: usize, object: Handle) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        let count = arena.array(array)?.len();
        if index >= count {
            return Err(BridgeError::Index { index, count });
        }
        arena.retain(object)?;
        let replaced = std::mem::replace(&mut arena.array_mut(array)?[index], object);
        arena.release(replaced)
    }

    fn array_exchange(&self, array: Handle, a: usize, b: usize) -> BridgeResult<()> {
        let mut arena = self.arena.lock();
        let elements = arena.array_mut(array)?;
        let count = elements.len();
        for index in [a, b] {
            if index >= count {
                return Err(BridgeError::Index { index, count });
            }
        }
        elements.swap(a, b);
        Ok(())
    }
}
