//! `AdbcConnection*` exports.

use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use arrow_array::ffi::FFI_ArrowSchema;
use arrow_array::ffi_stream::FFI_ArrowArrayStream;
use parking_lot::Mutex;
use tracing::debug;

use super::arrow::{c_slice, c_str, c_str_array, check_not_null, export_reader, export_schema, maybe_c_str};
use super::database::ExportedDatabase;
use super::error::ffi_call;
use super::runtime::block_on;
use super::slot;
use super::types::{AdbcStatusCode, FFI_AdbcConnection, FFI_AdbcDatabase, FFI_AdbcError};
use crate::adbc::{Connection, Database, Driver, ObjectDepth, ObjectFilter};
use crate::error::{BridgeError, Resource};
use crate::options::Options;

pub(crate) enum ConnectionState {
    Allocated(Options),
    /// The parent database is held so it outlives every connection opened from it.
    Initialized {
        connection: Box<dyn Connection>,
        _database: Arc<dyn Database>,
    },
}

/// Registry entry behind an `AdbcConnection`.
pub(crate) struct ExportedConnection {
    state: Mutex<ConnectionState>,
}

impl ExportedConnection {
    fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Allocated(Options::new())),
        }
    }
}

/// Run `f` against the initialized connection behind `connection`.
pub(crate) unsafe fn with_connection<T, F>(
    connection: *mut FFI_AdbcConnection,
    operation: &'static str,
    f: F,
) -> Result<T, BridgeError>
where
    F: FnOnce(&mut dyn Connection) -> Result<T, BridgeError>,
{
    let exported = slot::resolve::<_, ExportedConnection>(connection, operation)?;
    let mut state = exported.state.lock();
    match &mut *state {
        ConnectionState::Initialized { connection, .. } => f(connection.as_mut()),
        ConnectionState::Allocated(_) => Err(BridgeError::NotInitialized {
            operation,
            resource: Resource::Connection,
        }),
    }
}

pub(crate) unsafe extern "C" fn connection_new<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionNew";
    ffi_call::<D, _>(OP, error, || {
        slot::allocate(connection, OP, || Ok(ExportedConnection::new()))?;
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn connection_set_option<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    key: *const c_char,
    value: *const c_char,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionSetOption";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::resolve::<_, ExportedConnection>(connection, OP)?;
        let key = c_str(key, OP, "key")?;
        let value = c_str(value, OP, "value")?;

        let mut state = exported.state.lock();
        match &mut *state {
            ConnectionState::Allocated(options) => {
                options.set(key, value);
                Ok(())
            }
            ConnectionState::Initialized { connection, .. } => {
                connection.set_option(key, value).map_err(BridgeError::Driver)
            }
        }
    })
}

pub(crate) unsafe extern "C" fn connection_init<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    database: *mut FFI_AdbcDatabase,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionInit";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::resolve::<_, ExportedConnection>(connection, OP)?;
        let mut state = exported.state.lock();
        let ConnectionState::Allocated(options) = &*state else {
            return Err(BridgeError::AlreadyInitialized {
                operation: OP,
                resource: Resource::Connection,
            });
        };

        let database = slot::resolve::<_, ExportedDatabase>(database, OP)?.database(OP)?;
        let opened = block_on(OP, database.open(options))?.map_err(BridgeError::Driver)?;
        debug!(driver = D::INFO.name, options = options.len(), "connection initialized");
        *state = ConnectionState::Initialized {
            connection: opened,
            _database: database,
        };
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn connection_release<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionRelease";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::release::<_, ExportedConnection>(connection, OP)?;
        let closed = match &mut *exported.state.lock() {
            ConnectionState::Initialized { connection, .. } => connection.close(),
            ConnectionState::Allocated(_) => Ok(()),
        };
        drop(exported);
        closed.map_err(BridgeError::Driver)
    })
}

pub(crate) unsafe extern "C" fn connection_commit<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionCommit";
    ffi_call::<D, _>(OP, error, || {
        with_connection(connection, OP, |conn| {
            block_on(OP, conn.commit())?.map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn connection_rollback<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionRollback";
    ffi_call::<D, _>(OP, error, || {
        with_connection(connection, OP, |conn| {
            block_on(OP, conn.rollback())?.map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn connection_get_info<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    info_codes: *const u32,
    info_codes_length: usize,
    out: *mut FFI_ArrowArrayStream,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionGetInfo";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(out, OP, "out")?;
        let codes = c_slice(info_codes, info_codes_length, OP, "info_codes")?;
        let reader = with_connection(connection, OP, |conn| {
            block_on(OP, conn.get_info(codes))?.map_err(BridgeError::Driver)
        })?;
        export_reader(out, reader, OP)
    })
}

#[allow(clippy::too_many_arguments)]
pub(crate) unsafe extern "C" fn connection_get_objects<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    depth: c_int,
    catalog: *const c_char,
    db_schema: *const c_char,
    table_name: *const c_char,
    table_type: *const *const c_char,
    column_name: *const c_char,
    out: *mut FFI_ArrowArrayStream,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionGetObjects";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(out, OP, "out")?;
        let depth = ObjectDepth::try_from(depth).map_err(|depth| BridgeError::InvalidArgument {
            operation: OP,
            message: format!("invalid object depth {}", depth),
        })?;
        let filter = ObjectFilter {
            catalog: maybe_c_str(catalog, OP, "catalog")?.map(str::to_string),
            db_schema: maybe_c_str(db_schema, OP, "db_schema")?.map(str::to_string),
            table_name: maybe_c_str(table_name, OP, "table_name")?.map(str::to_string),
            table_types: c_str_array(table_type, OP, "table_type")?,
            column_name: maybe_c_str(column_name, OP, "column_name")?.map(str::to_string),
        };

        let reader = with_connection(connection, OP, |conn| {
            block_on(OP, conn.get_objects(depth, &filter))?.map_err(BridgeError::Driver)
        })?;
        export_reader(out, reader, OP)
    })
}

pub(crate) unsafe extern "C" fn connection_get_table_schema<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    catalog: *const c_char,
    db_schema: *const c_char,
    table_name: *const c_char,
    schema: *mut FFI_ArrowSchema,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionGetTableSchema";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(schema, OP, "schema")?;
        let catalog = maybe_c_str(catalog, OP, "catalog")?;
        let db_schema = maybe_c_str(db_schema, OP, "db_schema")?;
        let table_name = c_str(table_name, OP, "table_name")?;

        let table_schema = with_connection(connection, OP, |conn| {
            block_on(OP, conn.get_table_schema(catalog, db_schema, table_name))?
                .map_err(BridgeError::Driver)
        })?;
        export_schema(schema, &table_schema, OP)
    })
}

pub(crate) unsafe extern "C" fn connection_get_table_types<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    out: *mut FFI_ArrowArrayStream,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionGetTableTypes";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(out, OP, "out")?;
        let reader = with_connection(connection, OP, |conn| {
            block_on(OP, conn.get_table_types())?.map_err(BridgeError::Driver)
        })?;
        export_reader(out, reader, OP)
    })
}

pub(crate) unsafe extern "C" fn connection_read_partition<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    serialized_partition: *const u8,
    serialized_length: usize,
    out: *mut FFI_ArrowArrayStream,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcConnectionReadPartition";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(out, OP, "out")?;
        let partition = c_slice(serialized_partition, serialized_length, OP, "serialized_partition")?;
        let reader = with_connection(connection, OP, |conn| {
            block_on(OP, conn.read_partition(partition))?.map_err(BridgeError::Driver)
        })?;
        export_reader(out, reader, OP)
    })
}
