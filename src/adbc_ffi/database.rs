//! `AdbcDatabase*` exports.

use std::os::raw::c_char;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::arrow::c_str;
use super::error::ffi_call;
use super::slot;
use super::types::{AdbcStatusCode, FFI_AdbcDatabase, FFI_AdbcError};
use crate::adbc::{Database, Driver};
use crate::error::{BridgeError, Resource};
use crate::options::Options;

pub(crate) enum DatabaseState {
    Allocated(Options),
    Initialized(Arc<dyn Database>),
}

/// Registry entry behind an `AdbcDatabase`.
pub(crate) struct ExportedDatabase {
    state: Mutex<DatabaseState>,
}

impl ExportedDatabase {
    fn new() -> Self {
        Self {
            state: Mutex::new(DatabaseState::Allocated(Options::new())),
        }
    }

    /// The driver database, for opening connections.
    pub(crate) fn database(&self, operation: &'static str) -> Result<Arc<dyn Database>, BridgeError> {
        match &*self.state.lock() {
            DatabaseState::Initialized(database) => Ok(Arc::clone(database)),
            DatabaseState::Allocated(_) => Err(BridgeError::NotInitialized {
                operation,
                resource: Resource::Database,
            }),
        }
    }
}

pub(crate) unsafe extern "C" fn database_new<D: Driver>(
    database: *mut FFI_AdbcDatabase,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcDatabaseNew";
    ffi_call::<D, _>(OP, error, || {
        slot::allocate(database, OP, || Ok(ExportedDatabase::new()))?;
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn database_set_option<D: Driver>(
    database: *mut FFI_AdbcDatabase,
    key: *const c_char,
    value: *const c_char,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcDatabaseSetOption";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::resolve::<_, ExportedDatabase>(database, OP)?;
        let key = c_str(key, OP, "key")?;
        let value = c_str(value, OP, "value")?;

        let mut state = exported.state.lock();
        match &mut *state {
            DatabaseState::Allocated(options) => {
                options.set(key, value);
                Ok(())
            }
            DatabaseState::Initialized(_) => Err(BridgeError::AlreadyInitialized {
                operation: OP,
                resource: Resource::Database,
            }),
        }
    })
}

pub(crate) unsafe extern "C" fn database_init<D: Driver>(
    database: *mut FFI_AdbcDatabase,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcDatabaseInit";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::resolve::<_, ExportedDatabase>(database, OP)?;
        let mut state = exported.state.lock();
        let DatabaseState::Allocated(options) = &*state else {
            return Err(BridgeError::AlreadyInitialized {
                operation: OP,
                resource: Resource::Database,
            });
        };

        // A failed constructor leaves the options in place for a retry.
        let driver = D::default();
        let opened = driver.new_database(options).map_err(BridgeError::Driver)?;
        debug!(driver = %D::INFO, options = options.len(), "database initialized");
        *state = DatabaseState::Initialized(Arc::from(opened));
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn database_release<D: Driver>(
    database: *mut FFI_AdbcDatabase,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcDatabaseRelease";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::release::<_, ExportedDatabase>(database, OP)?;
        drop(exported);
        Ok(())
    })
}
