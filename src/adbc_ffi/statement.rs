//! `AdbcStatement*` exports.
//!
//! ADBC has no `StatementInit`: `AdbcStatementNew` materializes the driver
//! statement immediately from an initialized connection.

use std::os::raw::c_char;
use std::ptr;

use arrow_array::ffi::{FFI_ArrowArray, FFI_ArrowSchema};
use arrow_array::ffi_stream::FFI_ArrowArrayStream;
use parking_lot::Mutex;

use super::arrow::{
    c_slice, c_str, check_not_null, export_reader, export_schema, import_reader,
    import_record_batch,
};
use super::connection::with_connection;
use super::error::ffi_call;
use super::partitions::export_partitions;
use super::runtime::block_on;
use super::slot;
use super::types::{
    AdbcStatusCode, FFI_AdbcConnection, FFI_AdbcError, FFI_AdbcPartitions, FFI_AdbcStatement,
};
use crate::adbc::{Driver, Statement};
use crate::error::BridgeError;

/// Registry entry behind an `AdbcStatement`.
pub(crate) struct ExportedStatement {
    statement: Mutex<Box<dyn Statement>>,
}

unsafe fn with_statement<T, F>(
    statement: *mut FFI_AdbcStatement,
    operation: &'static str,
    f: F,
) -> Result<T, BridgeError>
where
    F: FnOnce(&mut dyn Statement) -> Result<T, BridgeError>,
{
    let exported = slot::resolve::<_, ExportedStatement>(statement, operation)?;
    let mut statement = exported.statement.lock();
    f(statement.as_mut())
}

unsafe fn write_rows_affected(out: *mut i64, rows_affected: i64) {
    if !out.is_null() {
        ptr::write_unaligned(out, rows_affected);
    }
}

pub(crate) unsafe extern "C" fn statement_new<D: Driver>(
    connection: *mut FFI_AdbcConnection,
    statement: *mut FFI_AdbcStatement,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementNew";
    ffi_call::<D, _>(OP, error, || {
        slot::allocate(statement, OP, || {
            let created = with_connection(connection, OP, |conn| {
                conn.new_statement().map_err(BridgeError::Driver)
            })?;
            Ok(ExportedStatement {
                statement: Mutex::new(created),
            })
        })?;
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn statement_release<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementRelease";
    ffi_call::<D, _>(OP, error, || {
        let exported = slot::release::<_, ExportedStatement>(statement, OP)?;
        let closed = exported.statement.lock().close();
        drop(exported);
        closed.map_err(BridgeError::Driver)
    })
}

pub(crate) unsafe extern "C" fn statement_set_option<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    key: *const c_char,
    value: *const c_char,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementSetOption";
    ffi_call::<D, _>(OP, error, || {
        let key = c_str(key, OP, "key")?;
        let value = c_str(value, OP, "value")?;
        with_statement(statement, OP, |stmt| {
            stmt.set_option(key, value).map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn statement_set_sql_query<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    query: *const c_char,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementSetSqlQuery";
    ffi_call::<D, _>(OP, error, || {
        let query = c_str(query, OP, "query")?;
        with_statement(statement, OP, |stmt| {
            stmt.set_sql_query(query).map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn statement_set_substrait_plan<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    plan: *const u8,
    length: usize,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementSetSubstraitPlan";
    ffi_call::<D, _>(OP, error, || {
        let plan = c_slice(plan, length, OP, "plan")?;
        with_statement(statement, OP, |stmt| {
            stmt.set_substrait_plan(plan).map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn statement_prepare<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementPrepare";
    ffi_call::<D, _>(OP, error, || {
        with_statement(statement, OP, |stmt| {
            block_on(OP, stmt.prepare())?.map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn statement_get_parameter_schema<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    schema: *mut FFI_ArrowSchema,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementGetParameterSchema";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(schema, OP, "schema")?;
        let parameters = with_statement(statement, OP, |stmt| {
            stmt.get_parameter_schema().map_err(BridgeError::Driver)
        })?;
        export_schema(schema, &parameters, OP)
    })
}

/// Bind one batch of parameters.
///
/// The caller relinquishes `values` and `schema` on every call, including
/// ones that fail before the driver is reached.
pub(crate) unsafe extern "C" fn statement_bind<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    values: *mut FFI_ArrowArray,
    schema: *mut FFI_ArrowSchema,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementBind";
    ffi_call::<D, _>(OP, error, || {
        let batch = import_record_batch(values, schema, OP)?;
        with_statement(statement, OP, |stmt| {
            block_on(OP, stmt.bind(batch))?.map_err(BridgeError::Driver)
        })
    })
}

pub(crate) unsafe extern "C" fn statement_bind_stream<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    stream: *mut FFI_ArrowArrayStream,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementBindStream";
    ffi_call::<D, _>(OP, error, || {
        let reader = import_reader(stream, OP)?;
        with_statement(statement, OP, |stmt| {
            block_on(OP, stmt.bind_stream(Box::new(reader)))?.map_err(BridgeError::Driver)
        })
    })
}

/// Execute the statement. A null `out` runs it as an update and reports only
/// the affected row count.
pub(crate) unsafe extern "C" fn statement_execute_query<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    out: *mut FFI_ArrowArrayStream,
    rows_affected: *mut i64,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementExecuteQuery";
    ffi_call::<D, _>(OP, error, || {
        if out.is_null() {
            let rows = with_statement(statement, OP, |stmt| {
                block_on(OP, stmt.execute_update())?.map_err(BridgeError::Driver)
            })?;
            write_rows_affected(rows_affected, rows);
            return Ok(());
        }

        let (reader, rows) = with_statement(statement, OP, |stmt| {
            block_on(OP, stmt.execute_query())?.map_err(BridgeError::Driver)
        })?;
        export_reader(out, reader, OP)?;
        write_rows_affected(rows_affected, rows);
        Ok(())
    })
}

pub(crate) unsafe extern "C" fn statement_execute_partitions<D: Driver>(
    statement: *mut FFI_AdbcStatement,
    schema: *mut FFI_ArrowSchema,
    partitions: *mut FFI_AdbcPartitions,
    rows_affected: *mut i64,
    error: *mut FFI_AdbcError,
) -> AdbcStatusCode {
    const OP: &str = "AdbcStatementExecutePartitions";
    ffi_call::<D, _>(OP, error, || {
        check_not_null(partitions, OP, "partitions")?;
        let result = with_statement(statement, OP, |stmt| {
            block_on(OP, stmt.execute_partitions())?.map_err(BridgeError::Driver)
        })?;

        if let Some(result_schema) = &result.schema {
            if !schema.is_null() {
                export_schema(schema, result_schema, OP)?;
            }
        }
        ptr::write_unaligned(partitions, export_partitions(&result.partitions));
        write_rows_affected(rows_affected, result.rows_affected);
        Ok(())
    })
}
