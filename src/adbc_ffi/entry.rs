//! Driver entry point and function table.

use std::os::raw::{c_int, c_void};
use std::ptr;

use tracing::debug;

use super::connection::*;
use super::database::*;
use super::error::ffi_call;
use super::statement::*;
use super::types::{AdbcStatusCode, FFI_AdbcDriver, FFI_AdbcError, ADBC_VERSION_1_0_0};
use crate::adbc::Driver;
use crate::error::BridgeError;

/// Populate the caller's `AdbcDriver` table with the exports for `D`.
///
/// Only ADBC 1.0.0 is accepted; other versions fail with `NOT_IMPLEMENTED`
/// and leave the table untouched. Use [`export_driver!`](crate::export_driver)
/// to expose this under a C symbol.
///
/// # Safety
///
/// `driver` must be null or point to writable memory of at least
/// `size_of::<FFI_AdbcDriver>()` bytes. `error` must be null or point to a
/// valid, initialized `AdbcError`.
pub unsafe fn driver_init<D: Driver>(
    version: c_int,
    driver: *mut c_void,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcDriverInit";
    ffi_call::<D, _>(OP, error, || {
        if version != ADBC_VERSION_1_0_0 {
            return Err(BridgeError::UnsupportedVersion {
                expected: ADBC_VERSION_1_0_0,
                actual: version,
            });
        }
        let driver = driver.cast::<FFI_AdbcDriver>();
        if driver.is_null() {
            return Err(BridgeError::NullArgument {
                operation: OP,
                argument: "driver",
            });
        }

        ptr::write_bytes(driver, 0, 1);
        fill_table::<D>(&mut *driver);
        debug!(driver = %D::INFO, "driver table populated");
        Ok(())
    })
}

fn fill_table<D: Driver>(table: &mut FFI_AdbcDriver) {
    table.release = Some(driver_release::<D>);

    table.database_init = Some(database_init::<D>);
    table.database_new = Some(database_new::<D>);
    table.database_set_option = Some(database_set_option::<D>);
    table.database_release = Some(database_release::<D>);

    table.connection_commit = Some(connection_commit::<D>);
    table.connection_get_info = Some(connection_get_info::<D>);
    table.connection_get_objects = Some(connection_get_objects::<D>);
    table.connection_get_table_schema = Some(connection_get_table_schema::<D>);
    table.connection_get_table_types = Some(connection_get_table_types::<D>);
    table.connection_init = Some(connection_init::<D>);
    table.connection_new = Some(connection_new::<D>);
    table.connection_set_option = Some(connection_set_option::<D>);
    table.connection_read_partition = Some(connection_read_partition::<D>);
    table.connection_release = Some(connection_release::<D>);
    table.connection_rollback = Some(connection_rollback::<D>);

    table.statement_bind = Some(statement_bind::<D>);
    table.statement_bind_stream = Some(statement_bind_stream::<D>);
    table.statement_execute_query = Some(statement_execute_query::<D>);
    table.statement_execute_partitions = Some(statement_execute_partitions::<D>);
    table.statement_get_parameter_schema = Some(statement_get_parameter_schema::<D>);
    table.statement_new = Some(statement_new::<D>);
    table.statement_prepare = Some(statement_prepare::<D>);
    table.statement_release = Some(statement_release::<D>);
    table.statement_set_option = Some(statement_set_option::<D>);
    table.statement_set_sql_query = Some(statement_set_sql_query::<D>);
    table.statement_set_substrait_plan = Some(statement_set_substrait_plan::<D>);
}

unsafe extern "C" fn driver_release<D: Driver>(
    driver: *mut FFI_AdbcDriver,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcDriverRelease";
    ffi_call::<D, _>(OP, error, || {
        let table = driver.as_mut().ok_or(BridgeError::NullArgument {
            operation: OP,
            argument: "driver",
        })?;
        if table.release.take().is_none() {
            return Err(BridgeError::AlreadyReleased {
                operation: OP,
                what: "driver",
            });
        }
        table.private_data = ptr::null_mut();
        Ok(())
    })
}

/// Export a [`Driver`](crate::Driver) under a C entry point symbol.
///
/// `$func_name` is the symbol a driver manager loads, conventionally
/// `AdbcDriver<Name>Init` or just `AdbcDriverInit`.
///
/// ```ignore
/// adbc_bridge::export_driver!(AdbcDriverMemoryInit, MemoryDriver);
/// ```
#[macro_export]
macro_rules! export_driver {
    ($func_name:ident, $driver_type:ty) => {
        #[no_mangle]
        pub unsafe extern "C" fn $func_name(
            version: ::std::os::raw::c_int,
            driver: *mut ::std::os::raw::c_void,
            error: *mut $crate::adbc_ffi::FFI_AdbcError,
        ) -> $crate::adbc_ffi::AdbcStatusCode {
            $crate::adbc_ffi::driver_init::<$driver_type>(version, driver, error)
        }
    };
}
