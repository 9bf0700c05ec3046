//! Process-wide registry of objects handed out across the C boundary.
//!
//! Native callers never see Rust pointers. Every exported resource is
//! registered here and identified by an opaque [`Handle`]; the registry entry
//! is what keeps the object alive until the caller releases it.
//!
//! The table is an arena: slots are recycled, but each slot carries a
//! generation counter that is bumped on unregistration and folded into the
//! handle value, so a released handle never resolves again.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::error;

use crate::error::HandleError;

type Entry = Arc<dyn Any + Send + Sync>;

/// Opaque token identifying one registered object.
///
/// The low 32 bits hold the slot index, the high 32 bits the slot generation.
/// Generations start at 1, so a valid handle is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Reconstruct a handle from its raw bit pattern.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw bit pattern passed across the C boundary.
    pub fn into_raw(self) -> u64 {
        self.0
    }

    fn index(self) -> usize {
        (self.0 & u64::from(u32::MAX)) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index(), self.generation())
    }
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena table mapping handles to live objects.
#[derive(Default)]
pub struct HandleRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` and return the handle that resolves to it.
    pub fn register<T: Any + Send + Sync>(&mut self, object: T) -> Handle {
        self.register_arc(Arc::new(object))
    }

    fn register_arc(&mut self, entry: Entry) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return Handle::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            entry: Some(entry),
        });
        Handle::new(index, 1)
    }

    /// Look up the object behind `handle`.
    ///
    /// Fails when the handle was never issued, has been unregistered, or
    /// refers to an object of a different type.
    pub fn resolve<T: Any + Send + Sync>(&self, handle: Handle) -> Result<Arc<T>, HandleError> {
        let entry = self.entry(handle)?;
        Arc::clone(entry)
            .downcast::<T>()
            .map_err(|_| HandleError::Foreign {
                handle: handle.into_raw(),
                expected: type_name::<T>(),
            })
    }

    /// Invalidate `handle` and hand its object back to the caller.
    ///
    /// Dropping the returned value reclaims the object unless another call
    /// still holds a reference obtained from [`resolve`](Self::resolve).
    pub fn unregister(&mut self, handle: Handle) -> Result<Arc<dyn Any + Send + Sync>, HandleError> {
        self.entry(handle)?;
        let index = handle.index();
        let slot = &mut self.slots[index];
        let entry = slot.entry.take().ok_or(HandleError::Stale {
            handle: handle.into_raw(),
        })?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(index as u32);
        self.live -= 1;
        Ok(entry)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn entry(&self, handle: Handle) -> Result<&Entry, HandleError> {
        let stale = HandleError::Stale {
            handle: handle.into_raw(),
        };
        let slot = self.slots.get(handle.index()).ok_or(stale.clone())?;
        if slot.generation != handle.generation() {
            return Err(stale);
        }
        slot.entry.as_ref().ok_or(stale)
    }
}

/// The registry shared by every exported resource in the process.
pub fn global() -> &'static Mutex<HandleRegistry> {
    static REGISTRY: OnceLock<Mutex<HandleRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HandleRegistry::new()))
}

/// Register `object` in the global registry.
pub fn register<T: Any + Send + Sync>(object: T) -> Handle {
    global().lock().register(object)
}

/// Resolve `handle` in the global registry.
///
/// A failure here means the caller passed a token that this process never
/// issued or already released; it is logged before being returned.
pub fn resolve<T: Any + Send + Sync>(handle: Handle) -> Result<Arc<T>, HandleError> {
    let resolved = global().lock().resolve(handle);
    if let Err(err) = &resolved {
        error!(%handle, %err, "rejected invalid handle");
    }
    resolved
}

/// Unregister `handle` from the global registry.
pub fn unregister(handle: Handle) -> Result<Arc<dyn Any + Send + Sync>, HandleError> {
    let removed = global().lock().unregister(handle);
    if let Err(err) = &removed {
        error!(%handle, %err, "rejected invalid handle");
    }
    removed
}
