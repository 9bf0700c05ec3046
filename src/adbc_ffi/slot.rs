//! Native-visible handle slots stored in `private_data`.
//!
//! Each allocated resource struct points at a heap cell holding the raw
//! handle value. The cell is freed and `private_data` nulled on release, so a
//! second release sees an unallocated struct instead of freed memory.

use std::any::Any;
use std::os::raw::c_void;
use std::ptr::null_mut;
use std::sync::Arc;

use tracing::debug;

use super::types::{FFI_AdbcConnection, FFI_AdbcDatabase, FFI_AdbcStatement};
use crate::error::{BridgeError, Resource};
use crate::handle::{self, Handle};

/// A C resource struct whose `private_data` carries a handle slot.
pub(crate) trait ResourceSlot {
    const RESOURCE: Resource;

    fn private_data(&mut self) -> &mut *mut c_void;
}

macro_rules! resource_slot {
    ($ty:ty, $resource:expr) => {
        impl ResourceSlot for $ty {
            const RESOURCE: Resource = $resource;

            fn private_data(&mut self) -> &mut *mut c_void {
                &mut self.private_data
            }
        }
    };
}

resource_slot!(FFI_AdbcDatabase, Resource::Database);
resource_slot!(FFI_AdbcConnection, Resource::Connection);
resource_slot!(FFI_AdbcStatement, Resource::Statement);

fn not_allocated<S: ResourceSlot>(operation: &'static str) -> BridgeError {
    BridgeError::NotAllocated {
        operation,
        resource: S::RESOURCE,
    }
}

/// Register the object built by `make` and store its handle in `slot`.
///
/// `make` only runs once the slot is known to be vacant.
pub(crate) unsafe fn allocate<S, T, F>(
    slot: *mut S,
    operation: &'static str,
    make: F,
) -> Result<Handle, BridgeError>
where
    S: ResourceSlot,
    T: Any + Send + Sync,
    F: FnOnce() -> Result<T, BridgeError>,
{
    let slot = slot.as_mut().ok_or(BridgeError::NullArgument {
        operation,
        argument: S::RESOURCE.as_str(),
    })?;
    if !slot.private_data().is_null() {
        return Err(BridgeError::AlreadyAllocated {
            operation,
            resource: S::RESOURCE,
        });
    }

    let handle = handle::register(make()?);
    *slot.private_data() = Box::into_raw(Box::new(handle.into_raw())).cast::<c_void>();
    debug!(%handle, resource = %S::RESOURCE, "allocated");
    Ok(handle)
}

unsafe fn slot_handle<S: ResourceSlot>(
    slot: *mut S,
    operation: &'static str,
) -> Result<Handle, BridgeError> {
    let slot = slot.as_mut().ok_or_else(|| not_allocated::<S>(operation))?;
    let cell = (*slot.private_data()).cast::<u64>();
    if cell.is_null() {
        return Err(not_allocated::<S>(operation));
    }
    Ok(Handle::from_raw(*cell))
}

/// Resolve the object behind `slot`.
pub(crate) unsafe fn resolve<S, T>(slot: *mut S, operation: &'static str) -> Result<Arc<T>, BridgeError>
where
    S: ResourceSlot,
    T: Any + Send + Sync,
{
    let handle = slot_handle(slot, operation)?;
    handle::resolve::<T>(handle).map_err(|source| BridgeError::Handle { operation, source })
}

/// Detach the object behind `slot`: free the slot cell, null `private_data`
/// and unregister the handle.
///
/// The handle is type-checked before anything is torn down. The returned
/// value is the last strong reference unless a concurrent call still holds
/// one, so dropping it reclaims the object.
pub(crate) unsafe fn release<S, T>(slot: *mut S, operation: &'static str) -> Result<Arc<T>, BridgeError>
where
    S: ResourceSlot,
    T: Any + Send + Sync,
{
    let object = resolve::<S, T>(slot, operation)?;

    let slot = slot.as_mut().ok_or_else(|| not_allocated::<S>(operation))?;
    let cell = std::mem::replace(slot.private_data(), null_mut()).cast::<u64>();
    let handle = Handle::from_raw(*Box::from_raw(cell));
    handle::unregister(handle).map_err(|source| BridgeError::Handle { operation, source })?;
    debug!(%handle, resource = %S::RESOURCE, "released");
    Ok(object)
}
