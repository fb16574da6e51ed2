//! Native binding library backend
//!
//! Loads the binding library (`JMacNotification` by default) and resolves
//! every exported entry point up front, so a missing symbol fails at load
//! time rather than on first use.
//!
//! C conventions of the binding:
//! - objects are `void *`, nil is null
//! - booleans come back as one byte
//! - counts and indices are `int`; `indexOfObject` answers a negative value
//!   when nothing matches
//! - `toCString` returns a `strdup`ed copy the caller frees; every other
//!   string getter returns a buffer owned by the runtime
//! - date conversions always use the current calendar of the process

use crate::calendar::{Calendar, CalendarUnit};
use crate::handle::Handle;
use crate::runtime::loader::{LibraryLoader, LoadError};
use crate::runtime::ForeignRuntime;
use crate::scalar::RawActivation;
use crate::{BridgeError, BridgeResult};
use libloading::Library;
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

type Obj = *mut c_void;

type FnNew = unsafe extern "C" fn() -> Obj;
type FnFromText = unsafe extern "C" fn(*const c_char) -> Obj;
type FnFromTwoTexts = unsafe extern "C" fn(*const c_char, *const c_char) -> Obj;
type FnText = unsafe extern "C" fn(Obj) -> *mut c_char;
type FnUnary = unsafe extern "C" fn(Obj) -> Obj;
type FnVoid = unsafe extern "C" fn(Obj);
type FnTest = unsafe extern "C" fn(Obj, Obj) -> u8;
type FnHash = unsafe extern "C" fn(Obj) -> c_int;
type FnActivationFromName = unsafe extern "C" fn(*const c_char) -> isize;
type FnActivationName = unsafe extern "C" fn(isize) -> *const c_char;
type FnSetComponent = unsafe extern "C" fn(Obj, c_int);
type FnGetComponent = unsafe extern "C" fn(Obj) -> c_int;
type FnCount = unsafe extern "C" fn(Obj) -> c_int;
type FnAt = unsafe extern "C" fn(Obj, c_int) -> Obj;
type FnIndexOf = unsafe extern "C" fn(Obj, Obj) -> c_int;
type FnPair = unsafe extern "C" fn(Obj, Obj);
type FnInsert = unsafe extern "C" fn(Obj, Obj, c_int);
type FnRemoveAt = unsafe extern "C" fn(Obj, c_int);
type FnReplace = unsafe extern "C" fn(Obj, c_int, Obj);
type FnExchange = unsafe extern "C" fn(Obj, c_int, c_int);

/// Unset date components read back as NSIntegerMax truncated to `int`
const NATIVE_UNDEFINED_COMPONENT: i32 = -1;

struct Symbols {
    to_ns_string: FnFromText,
    to_c_string: FnText,
    to_ns_image: FnFromText,
    is_equal: FnTest,
    hash: FnHash,
    activation_from_name: FnActivationFromName,
    activation_name: FnActivationName,

    new_date_components: FnNew,
    // Indexed by `unit_slot`
    set_component: [FnSetComponent; 6],
    get_component: [FnGetComponent; 6],
    to_date_components: FnUnary,
    to_ns_date: FnUnary,

    create_action: FnFromTwoTexts,
    action_identifier: FnText,
    action_title: FnText,

    new_mutable_array: FnNew,
    contains_object: FnTest,
    count: FnCount,
    object_at_index: FnAt,
    index_of_object: FnIndexOf,
    add_object: FnPair,
    insert_object_at_index: FnInsert,
    remove_all_objects: FnVoid,
    remove_object_at_index: FnRemoveAt,
    replace_object_at_index: FnReplace,
    exchange_object_at_index: FnExchange,

    retain: Option<FnVoid>,
    release: Option<FnVoid>,
}

/// Copy a function pointer out of `library`
unsafe fn symbol<T: Copy>(library: &Library, path: &Path, name: &str) -> Result<T, LoadError> {
    let mut c_name = Vec::with_capacity(name.len() + 1);
    c_name.extend_from_slice(name.as_bytes());
    c_name.push(0);
    library
        .get::<T>(&c_name)
        .map(|sym| *sym)
        .map_err(|_| LoadError::SymbolNotFound {
            library: path.display().to_string(),
            symbol: name.to_string(),
        })
}

unsafe fn optional_symbol<T: Copy>(library: &Library, path: &Path, name: &str) -> Option<T> {
    symbol(library, path, name).ok()
}

impl Symbols {
    unsafe fn resolve(library: &Library, path: &Path) -> Result<Self, LoadError> {
        macro_rules! sym {
            ($name:literal) => {
                symbol(library, path, $name)?
            };
        }

        Ok(Self {
            to_ns_string: sym!("toNSString"),
            to_c_string: sym!("toCString"),
            to_ns_image: sym!("toNSImage"),
            is_equal: sym!("isEqual"),
            hash: sym!("hash"),
            activation_from_name: sym!("toNSUserNotificationActivationType"),
            activation_name: sym!("toStringNSUserNotificationActivation"),
            new_date_components: sym!("newNSDateComponents"),
            set_component: [
                sym!("setDay"),
                sym!("setMonth"),
                sym!("setYear"),
                sym!("setHour"),
                sym!("setMinute"),
                sym!("setSecond"),
            ],
            get_component: [
                sym!("getDay"),
                sym!("getMonth"),
                sym!("getYear"),
                sym!("getHour"),
                sym!("getMinute"),
                sym!("getSecond"),
            ],
            to_date_components: sym!("toDateComponents"),
            to_ns_date: sym!("toNSDate"),
            create_action: sym!("createNSUserNotificationAction"),
            action_identifier: sym!("getNSUserNotificationActionIdentifier"),
            action_title: sym!("getNSUserNotificationActionTitle"),
            new_mutable_array: sym!("newNSMutableArray"),
            contains_object: sym!("containsObject"),
            count: sym!("count"),
            object_at_index: sym!("objectAtIndex"),
            index_of_object: sym!("indexOfObject"),
            add_object: sym!("addObject"),
            insert_object_at_index: sym!("insertObjectAtIndex"),
            remove_all_objects: sym!("removeAllObjects"),
            remove_object_at_index: sym!("removeObjectAtIndex"),
            replace_object_at_index: sym!("replaceObjectAtIndex"),
            exchange_object_at_index: sym!("exchangeObjectAtIndex"),
            retain: optional_symbol(library, path, "retainObject"),
            release: optional_symbol(library, path, "releaseObject"),
        })
    }
}

/// Slot of `unit` in the component tables, which follow `CalendarUnit::ALL`
fn unit_slot(unit: CalendarUnit) -> usize {
    match unit {
        CalendarUnit::Day => 0,
        CalendarUnit::Month => 1,
        CalendarUnit::Year => 2,
        CalendarUnit::Hour => 3,
        CalendarUnit::Minute => 4,
        CalendarUnit::Second => 5,
    }
}

fn native_index(index: usize) -> BridgeResult<c_int> {
    c_int::try_from(index).map_err(|_| BridgeError::OutOfRange {
        value: index,
        target: "int index",
    })
}

fn native_count(count: c_int) -> BridgeResult<usize> {
    usize::try_from(count).map_err(|_| BridgeError::InvalidCount {
        call: "count",
        count,
    })
}

fn owned(call: &'static str, ptr: Obj) -> BridgeResult<Handle> {
    // SAFETY: non-null results of binding calls are live objects
    unsafe { Handle::from_raw(ptr) }.ok_or(BridgeError::NullHandle { call })
}

/// Copy a runtime-owned C string
unsafe fn borrowed_text(call: &'static str, ptr: *const c_char) -> BridgeResult<String> {
    if ptr.is_null() {
        return Err(BridgeError::NullHandle { call });
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|e| BridgeError::Encoding {
            position: e.valid_up_to(),
        })
}

/// The native binding library
pub struct DylibRuntime {
    symbols: Symbols,
    path: PathBuf,
    // Keeps every pointer in `symbols` valid
    _library: Library,
}

impl DylibRuntime {
    /// Locate, open and bind the library `name`
    ///
    /// `extra_paths` are searched before the platform defaults.
    ///
    /// # Safety
    ///
    /// The library's exports must have the C signatures this backend binds
    /// them with. Nothing can verify that at runtime.
    pub unsafe fn load(name: &str, extra_paths: &[PathBuf]) -> BridgeResult<Self> {
        let loader = LibraryLoader::with_search_paths(extra_paths);
        let (path, library) = loader.open(name)?;
        let symbols = Symbols::resolve(&library, &path)?;
        info!(library = name, path = %path.display(), "native binding loaded");
        if symbols.retain.is_none() || symbols.release.is_none() {
            debug!("binding exports no retain/release; references are managed natively");
        }
        Ok(Self {
            symbols,
            path,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn require_system(calendar: &Calendar) -> BridgeResult<()> {
        if calendar.is_system() {
            Ok(())
        } else {
            Err(BridgeError::CalendarUnsupported { backend: "native" })
        }
    }
}

// SAFETY for every call below: the symbols were bound with the binding's
// signatures in `DylibRuntime::load`, and handles are live objects.
impl ForeignRuntime for DylibRuntime {
    fn backend_name(&self) -> &'static str {
        "native"
    }

    fn retain(&self, object: Handle) -> BridgeResult<()> {
        match self.symbols.retain {
            Some(retain) => unsafe { retain(object.as_raw()) },
            None => trace!(%object, "retain skipped"),
        }
        Ok(())
    }

    fn release(&self, object: Handle) -> BridgeResult<()> {
        match self.symbols.release {
            Some(release) => unsafe { release(object.as_raw()) },
            None => trace!(%object, "release skipped"),
        }
        Ok(())
    }

    fn string_from_utf8(&self, text: &CStr) -> BridgeResult<Handle> {
        owned("toNSString", unsafe { (self.symbols.to_ns_string)(text.as_ptr()) })
    }

    fn string_to_utf8(&self, string: Handle) -> BridgeResult<String> {
        unsafe {
            let ptr = (self.symbols.to_c_string)(string.as_raw());
            let text = borrowed_text("toCString", ptr);
            if !ptr.is_null() {
                libc::free(ptr.cast());
            }
            text
        }
    }

    fn image_from_file(&self, path: &CStr) -> BridgeResult<Option<Handle>> {
        let ptr = unsafe { (self.symbols.to_ns_image)(path.as_ptr()) };
        Ok(unsafe { Handle::from_raw(ptr) })
    }

    fn activation_from_name(&self, name: &CStr) -> BridgeResult<RawActivation> {
        Ok(RawActivation(unsafe {
            (self.symbols.activation_from_name)(name.as_ptr())
        }))
    }

    fn activation_name(&self, value: RawActivation) -> BridgeResult<String> {
        unsafe {
            borrowed_text(
                "toStringNSUserNotificationActivation",
                (self.symbols.activation_name)(value.0),
            )
        }
    }

    fn is_equal(&self, a: Handle, b: Handle) -> BridgeResult<bool> {
        Ok(unsafe { (self.symbols.is_equal)(a.as_raw(), b.as_raw()) } != 0)
    }

    fn hash(&self, object: Handle) -> BridgeResult<u64> {
        // Native `int`, widened without sign extension
        let hash = unsafe { (self.symbols.hash)(object.as_raw()) };
        Ok(u64::from(hash as u32))
    }

    fn new_date_components(&self) -> BridgeResult<Handle> {
        owned("newNSDateComponents", unsafe {
            (self.symbols.new_date_components)()
        })
    }

    fn set_component(
        &self,
        components: Handle,
        unit: CalendarUnit,
        value: i32,
    ) -> BridgeResult<()> {
        let setter = self.symbols.set_component[unit_slot(unit)];
        unsafe { setter(components.as_raw(), value as c_int) };
        Ok(())
    }

    fn component(&self, components: Handle, unit: CalendarUnit) -> BridgeResult<i32> {
        let getter = self.symbols.get_component[unit_slot(unit)];
        Ok(unsafe { getter(components.as_raw()) })
    }

    fn undefined_component(&self) -> i32 {
        NATIVE_UNDEFINED_COMPONENT
    }

    fn components_from_date(&self, date: Handle, calendar: &Calendar) -> BridgeResult<Handle> {
        Self::require_system(calendar)?;
        owned("toDateComponents", unsafe {
            (self.symbols.to_date_components)(date.as_raw())
        })
    }

    fn date_from_components(
        &self,
        components: Handle,
        calendar: &Calendar,
    ) -> BridgeResult<Option<Handle>> {
        Self::require_system(calendar)?;
        let ptr = unsafe { (self.symbols.to_ns_date)(components.as_raw()) };
        Ok(unsafe { Handle::from_raw(ptr) })
    }

    fn new_action(&self, identifier: &CStr, title: &CStr) -> BridgeResult<Handle> {
        owned("createNSUserNotificationAction", unsafe {
            (self.symbols.create_action)(identifier.as_ptr(), title.as_ptr())
        })
    }

    fn action_identifier(&self, action: Handle) -> BridgeResult<String> {
        unsafe {
            borrowed_text(
                "getNSUserNotificationActionIdentifier",
                (self.symbols.action_identifier)(action.as_raw()),
            )
        }
    }

    fn action_title(&self, action: Handle) -> BridgeResult<String> {
        unsafe {
            borrowed_text(
                "getNSUserNotificationActionTitle",
                (self.symbols.action_title)(action.as_raw()),
            )
        }
    }

    fn new_mutable_array(&self) -> BridgeResult<Handle> {
        owned("newNSMutableArray", unsafe { (self.symbols.new_mutable_array)() })
    }

    fn array_count(&self, array: Handle) -> BridgeResult<usize> {
        let count = unsafe { (self.symbols.count)(array.as_raw()) };
        native_count(count)
    }

    fn array_contains(&self, array: Handle, object: Handle) -> BridgeResult<bool> {
        Ok(unsafe { (self.symbols.contains_object)(array.as_raw(), object.as_raw()) } != 0)
    }

    fn array_object_at(&self, array: Handle, index: usize) -> BridgeResult<Handle> {
        let index = native_index(index)?;
        owned("objectAtIndex", unsafe {
            (self.symbols.object_at_index)(array.as_raw(), index)
        })
    }

    fn array_index_of(&self, array: Handle, object: Handle) -> BridgeResult<Option<usize>> {
        let index = unsafe { (self.symbols.index_of_object)(array.as_raw(), object.as_raw()) };
        Ok(usize::try_from(index).ok())
    }

    fn array_add(&self, array: Handle, object: Handle) -> BridgeResult<()> {
        unsafe { (self.symbols.add_object)(array.as_raw(), object.as_raw()) };
        Ok(())
    }

    fn array_insert(&self, array: Handle, object: Handle, index: usize) -> BridgeResult<()> {
        let index = native_index(index)?;
        unsafe { (self.symbols.insert_object_at_index)(array.as_raw(), object.as_raw(), index) };
        Ok(())
    }

    fn array_remove_all(&self, array: Handle) -> BridgeResult<()> {
        unsafe { (self.symbols.remove_all_objects)(array.as_raw()) };
        Ok(())
    }

    fn array_remove_at(&self, array: Handle, index: usize) -> BridgeResult<()> {
        let index = native_index(index)?;
        unsafe { (self.symbols.remove_object_at_index)(array.as_raw(), index) };
        Ok(())
    }

    fn array_replace_at(&self, array: Handle, index: usize, object: Handle) -> BridgeResult<()> {
        let index = native_index(index)?;
        unsafe { (self.symbols.replace_object_at_index)(array.as_raw(), index, object.as_raw()) };
        Ok(())
    }

    fn array_exchange(&self, array: Handle, a: usize, b: usize) -> BridgeResult<()> {
        let (a, b) = (native_index(a)?, native_index(b)?);
        unsafe { (self.symbols.exchange_object_at_index)(array.as_raw(), a, b) };
        Ok(())
    }
}
