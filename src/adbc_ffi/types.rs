//! `#[repr(C)]` mirrors of the ADBC 1.0.0 structs.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{null, null_mut};

use arrow_array::ffi::{FFI_ArrowArray, FFI_ArrowSchema};
use arrow_array::ffi_stream::FFI_ArrowArrayStream;

pub use adbc_core::constants::{
    ADBC_STATUS_ALREADY_EXISTS, ADBC_STATUS_CANCELLED, ADBC_STATUS_INTEGRITY,
    ADBC_STATUS_INTERNAL, ADBC_STATUS_INVALID_ARGUMENT, ADBC_STATUS_INVALID_DATA,
    ADBC_STATUS_INVALID_STATE, ADBC_STATUS_IO, ADBC_STATUS_NOT_FOUND,
    ADBC_STATUS_NOT_IMPLEMENTED, ADBC_STATUS_OK, ADBC_STATUS_TIMEOUT,
    ADBC_STATUS_UNAUTHENTICATED, ADBC_STATUS_UNAUTHORIZED, ADBC_STATUS_UNKNOWN,
    ADBC_VERSION_1_0_0, ADBC_VERSION_1_1_0,
};
pub use adbc_core::error::AdbcStatusCode;

// The structs below are the 1.0.0 layouts. `adbc_ffi` ships the 1.1.0 ones,
// whose `AdbcError` and `AdbcDriver` are larger than what a 1.0.0 caller
// allocates.

/// Error record filled in by a failing call.
///
/// The caller owns the struct; the bridge owns `message` until `release` runs.
#[repr(C)]
#[derive(Debug)]
pub struct FFI_AdbcError {
    pub message: *mut c_char,
    pub vendor_code: i32,
    pub sqlstate: [c_char; 5],
    pub release: Option<unsafe extern "C" fn(error: *mut FFI_AdbcError)>,
}

impl FFI_AdbcError {
    pub fn empty() -> Self {
        Self {
            message: null_mut(),
            vendor_code: 0,
            sqlstate: [0; 5],
            release: None,
        }
    }
}

impl Default for FFI_AdbcError {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for FFI_AdbcError {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            unsafe { release(self) };
        }
    }
}

/// An instance of a database. `private_data` is null iff unallocated.
#[repr(C)]
#[derive(Debug)]
pub struct FFI_AdbcDatabase {
    pub private_data: *mut c_void,
    pub private_driver: *const FFI_AdbcDriver,
}

/// An active connection. `private_data` is null iff unallocated.
#[repr(C)]
#[derive(Debug)]
pub struct FFI_AdbcConnection {
    pub private_data: *mut c_void,
    pub private_driver: *const FFI_AdbcDriver,
}

/// A statement. `private_data` is null iff unallocated.
#[repr(C)]
#[derive(Debug)]
pub struct FFI_AdbcStatement {
    pub private_data: *mut c_void,
    pub private_driver: *const FFI_AdbcDriver,
}

macro_rules! empty_resource {
    ($($ty:ident),+) => {
        $(
            impl $ty {
                pub fn empty() -> Self {
                    Self {
                        private_data: null_mut(),
                        private_driver: null(),
                    }
                }
            }

            impl Default for $ty {
                fn default() -> Self {
                    Self::empty()
                }
            }
        )+
    };
}

empty_resource!(FFI_AdbcDatabase, FFI_AdbcConnection, FFI_AdbcStatement);

/// Partitions of a distributed result set.
#[repr(C)]
#[derive(Debug)]
pub struct FFI_AdbcPartitions {
    pub num_partitions: usize,
    pub partitions: *mut *const u8,
    pub partition_lengths: *const usize,
    pub private_data: *mut c_void,
    pub release: Option<unsafe extern "C" fn(partitions: *mut FFI_AdbcPartitions)>,
}

impl FFI_AdbcPartitions {
    pub fn empty() -> Self {
        Self {
            num_partitions: 0,
            partitions: null_mut(),
            partition_lengths: null(),
            private_data: null_mut(),
            release: None,
        }
    }
}

impl Default for FFI_AdbcPartitions {
    fn default() -> Self {
        Self::empty()
    }
}

type DatabaseFn = unsafe extern "C" fn(*mut FFI_AdbcDatabase, *mut FFI_AdbcError) -> AdbcStatusCode;
type DatabaseSetOptionFn = unsafe extern "C" fn(
    *mut FFI_AdbcDatabase,
    *const c_char,
    *const c_char,
    *mut FFI_AdbcError,
) -> AdbcStatusCode;
type ConnectionFn =
    unsafe extern "C" fn(*mut FFI_AdbcConnection, *mut FFI_AdbcError) -> AdbcStatusCode;
type ConnectionSetOptionFn = unsafe extern "C" fn(
    *mut FFI_AdbcConnection,
    *const c_char,
    *const c_char,
    *mut FFI_AdbcError,
) -> AdbcStatusCode;
type StatementFn =
    unsafe extern "C" fn(*mut FFI_AdbcStatement, *mut FFI_AdbcError) -> AdbcStatusCode;
type StatementSetOptionFn = unsafe extern "C" fn(
    *mut FFI_AdbcStatement,
    *const c_char,
    *const c_char,
    *mut FFI_AdbcError,
) -> AdbcStatusCode;

/// Function table filled in by the driver entry point.
///
/// Field order is fixed by the ADBC 1.0.0 header.
#[repr(C)]
#[derive(Debug)]
pub struct FFI_AdbcDriver {
    pub private_data: *mut c_void,
    pub private_manager: *mut c_void,
    pub release:
        Option<unsafe extern "C" fn(*mut FFI_AdbcDriver, *mut FFI_AdbcError) -> AdbcStatusCode>,

    pub database_init: Option<DatabaseFn>,
    pub database_new: Option<DatabaseFn>,
    pub database_set_option: Option<DatabaseSetOptionFn>,
    pub database_release: Option<DatabaseFn>,

    pub connection_commit: Option<ConnectionFn>,
    pub connection_get_info: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            *const u32,
            usize,
            *mut FFI_ArrowArrayStream,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub connection_get_objects: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            c_int,
            *const c_char,
            *const c_char,
            *const c_char,
            *const *const c_char,
            *const c_char,
            *mut FFI_ArrowArrayStream,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub connection_get_table_schema: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            *const c_char,
            *const c_char,
            *const c_char,
            *mut FFI_ArrowSchema,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub connection_get_table_types: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            *mut FFI_ArrowArrayStream,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub connection_init: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            *mut FFI_AdbcDatabase,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub connection_new: Option<ConnectionFn>,
    pub connection_set_option: Option<ConnectionSetOptionFn>,
    pub connection_read_partition: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            *const u8,
            usize,
            *mut FFI_ArrowArrayStream,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub connection_release: Option<ConnectionFn>,
    pub connection_rollback: Option<ConnectionFn>,

    pub statement_bind: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *mut FFI_ArrowArray,
            *mut FFI_ArrowSchema,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_bind_stream: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *mut FFI_ArrowArrayStream,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_execute_query: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *mut FFI_ArrowArrayStream,
            *mut i64,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_execute_partitions: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *mut FFI_ArrowSchema,
            *mut FFI_AdbcPartitions,
            *mut i64,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_get_parameter_schema: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *mut FFI_ArrowSchema,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_new: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcConnection,
            *mut FFI_AdbcStatement,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_prepare: Option<StatementFn>,
    pub statement_release: Option<StatementFn>,
    pub statement_set_option: Option<StatementSetOptionFn>,
    pub statement_set_sql_query: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *const c_char,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
    pub statement_set_substrait_plan: Option<
        unsafe extern "C" fn(
            *mut FFI_AdbcStatement,
            *const u8,
            usize,
            *mut FFI_AdbcError,
        ) -> AdbcStatusCode,
    >,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_layout_sizes() {
        let ptr = size_of::<*const c_void>();
        assert_eq!(size_of::<FFI_AdbcDatabase>(), 2 * ptr);
        assert_eq!(size_of::<FFI_AdbcStatement>(), 2 * ptr);
        assert_eq!(size_of::<FFI_AdbcPartitions>(), 5 * ptr);
        // 3 header fields followed by 26 function pointers
        assert_eq!(size_of::<FFI_AdbcDriver>(), 29 * ptr);
    }

    #[test]
    fn test_status_codes_match_status_enum() {
        use adbc_core::error::Status;

        let pairs = [
            (Status::Unknown, ADBC_STATUS_UNKNOWN),
            (Status::NotImplemented, ADBC_STATUS_NOT_IMPLEMENTED),
            (Status::InvalidArguments, ADBC_STATUS_INVALID_ARGUMENT),
            (Status::InvalidState, ADBC_STATUS_INVALID_STATE),
            (Status::Internal, ADBC_STATUS_INTERNAL),
            (Status::Unauthorized, ADBC_STATUS_UNAUTHORIZED),
        ];
        for (status, code) in pairs {
            assert_eq!(AdbcStatusCode::from(status), code);
        }
        assert_eq!(ADBC_STATUS_OK, 0);
        assert_eq!(ADBC_VERSION_1_0_0, 1_000_000);
    }

    #[test]
    fn test_empty_error_has_no_release() {
        let error = FFI_AdbcError::empty();
        assert!(error.message.is_null());
        assert!(error.release.is_none());
    }
}
