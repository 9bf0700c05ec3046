//! Arrow C Data Interface marshaling and C argument helpers.
//!
//! Exports move Rust values into caller-supplied structs with
//! `ptr::write_unaligned`, so whatever bytes the caller left there are never
//! dropped. Imports take ownership with `from_raw`, which leaves the caller's
//! struct in the released state; the owned value releases it on drop.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;

use arrow_array::ffi::{from_ffi, to_ffi, FFI_ArrowArray, FFI_ArrowSchema};
use arrow_array::ffi_stream::{ArrowArrayStreamReader, FFI_ArrowArrayStream};
use arrow_array::{Array, RecordBatch, StructArray};
use arrow_schema::{DataType, Schema};

use crate::adbc::BoxedReader;
use crate::error::BridgeError;

/// Fail with `NullArgument` if `ptr` is null.
pub(crate) fn check_not_null<T>(
    ptr: *const T,
    operation: &'static str,
    argument: &'static str,
) -> Result<(), BridgeError> {
    if ptr.is_null() {
        Err(BridgeError::NullArgument { operation, argument })
    } else {
        Ok(())
    }
}

/// Move `reader` into the caller's stream struct.
pub(crate) unsafe fn export_reader(
    out: *mut FFI_ArrowArrayStream,
    reader: BoxedReader,
    operation: &'static str,
) -> Result<(), BridgeError> {
    check_not_null(out, operation, "out")?;
    ptr::write_unaligned(out, FFI_ArrowArrayStream::new(reader));
    Ok(())
}

/// Export `schema` into the caller's schema struct.
pub(crate) unsafe fn export_schema(
    out: *mut FFI_ArrowSchema,
    schema: &Schema,
    operation: &'static str,
) -> Result<(), BridgeError> {
    check_not_null(out, operation, "schema")?;
    let exported = FFI_ArrowSchema::try_from(schema)
        .map_err(|source| BridgeError::Export { operation, source })?;
    ptr::write_unaligned(out, exported);
    Ok(())
}

/// Export `batch` as a struct array plus its schema.
pub(crate) unsafe fn export_record_batch(
    batch: RecordBatch,
    array_out: *mut FFI_ArrowArray,
    schema_out: *mut FFI_ArrowSchema,
    operation: &'static str,
) -> Result<(), BridgeError> {
    check_not_null(array_out, operation, "array")?;
    check_not_null(schema_out, operation, "schema")?;
    let data = StructArray::from(batch).into_data();
    let (array, schema) =
        to_ffi(&data).map_err(|source| BridgeError::Export { operation, source })?;
    ptr::write_unaligned(array_out, array);
    ptr::write_unaligned(schema_out, schema);
    Ok(())
}

/// Take ownership of a caller's array and schema and build a record batch.
///
/// Both structs are consumed on every path: once they are moved out of the
/// caller's memory, any early return drops them and runs their release
/// callbacks exactly once.
pub(crate) unsafe fn import_record_batch(
    array: *mut FFI_ArrowArray,
    schema: *mut FFI_ArrowSchema,
    operation: &'static str,
) -> Result<RecordBatch, BridgeError> {
    check_not_null(array, operation, "values")?;
    check_not_null(schema, operation, "schema")?;
    let array = FFI_ArrowArray::from_raw(array);
    let schema = FFI_ArrowSchema::from_raw(schema);

    let data_type =
        DataType::try_from(&schema).map_err(|source| BridgeError::Import { operation, source })?;
    if !matches!(data_type, DataType::Struct(_)) {
        return Err(BridgeError::InvalidArgument {
            operation,
            message: format!("expected a struct array, got {}", data_type),
        });
    }
    check_children(&data_type, &array, "batch")
        .map_err(|message| BridgeError::InvalidArgument { operation, message })?;

    let data = from_ffi(array, &schema).map_err(|source| BridgeError::Import { operation, source })?;
    data.validate_full()
        .map_err(|source| BridgeError::Import { operation, source })?;

    let values = StructArray::from(data);
    if values.null_count() != 0 {
        return Err(BridgeError::InvalidArgument {
            operation,
            message: "struct array must not contain top-level nulls".to_string(),
        });
    }
    Ok(RecordBatch::from(values))
}

/// Take ownership of a caller's stream as a lazily pulled reader.
pub(crate) unsafe fn import_reader(
    stream: *mut FFI_ArrowArrayStream,
    operation: &'static str,
) -> Result<ArrowArrayStreamReader, BridgeError> {
    check_not_null(stream, operation, "stream")?;
    let stream = FFI_ArrowArrayStream::from_raw(stream);
    ArrowArrayStreamReader::try_new(stream).map_err(|source| BridgeError::Import { operation, source })
}

/// Borrow a required NUL-terminated UTF-8 string.
pub(crate) unsafe fn c_str<'a>(
    ptr: *const c_char,
    operation: &'static str,
    argument: &'static str,
) -> Result<&'a str, BridgeError> {
    check_not_null(ptr, operation, argument)?;
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| BridgeError::InvalidUtf8 { operation, argument })
}

/// Borrow an optional NUL-terminated UTF-8 string; null means `None`.
pub(crate) unsafe fn maybe_c_str<'a>(
    ptr: *const c_char,
    operation: &'static str,
    argument: &'static str,
) -> Result<Option<&'a str>, BridgeError> {
    if ptr.is_null() {
        return Ok(None);
    }
    c_str(ptr, operation, argument).map(Some)
}

/// Collect a NULL-terminated array of strings; a null array means `None`.
pub(crate) unsafe fn c_str_array(
    ptr: *const *const c_char,
    operation: &'static str,
    argument: &'static str,
) -> Result<Option<Vec<String>>, BridgeError> {
    if ptr.is_null() {
        return Ok(None);
    }
    let mut values = Vec::new();
    let mut cursor = ptr;
    while !(*cursor).is_null() {
        values.push(c_str(*cursor, operation, argument)?.to_string());
        cursor = cursor.add(1);
    }
    Ok(Some(values))
}

/// Borrow `len` elements at `ptr`; a null pointer or zero length is empty.
pub(crate) unsafe fn c_slice<'a, T>(
    ptr: *const T,
    len: usize,
    operation: &'static str,
    argument: &'static str,
) -> Result<&'a [T], BridgeError> {
    if len == 0 {
        return Ok(&[]);
    }
    check_not_null(ptr, operation, argument)?;
    Ok(std::slice::from_raw_parts(ptr, len))
}

/// Child arrays the C Data Interface lays out for `data_type`.
fn expected_children(data_type: &DataType) -> usize {
    match data_type {
        DataType::Struct(fields) => fields.len(),
        DataType::Union(fields, _) => fields.len(),
        DataType::List(_)
        | DataType::LargeList(_)
        | DataType::FixedSizeList(_, _)
        | DataType::ListView(_)
        | DataType::LargeListView(_)
        | DataType::Map(_, _) => 1,
        DataType::RunEndEncoded(_, _) => 2,
        _ => 0,
    }
}

/// Compare the array's child layout against its schema.
///
/// `from_ffi` asserts on a mismatch, so this runs first.
fn check_children(data_type: &DataType, array: &FFI_ArrowArray, name: &str) -> Result<(), String> {
    let expected = expected_children(data_type);
    let actual = array.num_children();
    if expected != actual {
        return Err(format!(
            "schema of '{}' declares {} children but the array has {}",
            name, expected, actual
        ));
    }

    match data_type {
        DataType::Struct(fields) => {
            for (index, field) in fields.iter().enumerate() {
                check_children(field.data_type(), array.child(index), field.name())?;
            }
        }
        DataType::List(field)
        | DataType::LargeList(field)
        | DataType::FixedSizeList(field, _)
        | DataType::Map(field, _) => {
            check_children(field.data_type(), array.child(0), field.name())?;
        }
        _ => {}
    }
    Ok(())
}
