//! Error marshaling into caller-owned `AdbcError` records.

use std::any::Any;
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::null_mut;

use adbc_core::error::Status;
use tracing::{debug, error, warn};

use super::types::{AdbcStatusCode, FFI_AdbcError, ADBC_STATUS_OK};
use crate::adbc::Driver;
use crate::error::BridgeError;

/// Message, status and structured detail for one failed call.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub message: String,
    pub status: Status,
    pub vendor_code: i32,
    pub sqlstate: [c_char; 5],
}

impl ErrorRecord {
    /// Translate `err` into the record written to the caller.
    ///
    /// Structured driver errors keep their status, vendor code and SQLSTATE;
    /// everything else carries only a status and the display text.
    pub fn translate(prefix: &str, err: &BridgeError) -> Self {
        let (vendor_code, sqlstate) = match err.as_adbc() {
            Some(adbc) => (adbc.vendor_code, adbc.sqlstate),
            None => (0, [0; 5]),
        };
        Self {
            message: format!("{}{}", prefix, err.message()),
            status: err.status(),
            vendor_code,
            sqlstate,
        }
    }

    pub fn status_code(&self) -> AdbcStatusCode {
        self.status.into()
    }
}

/// Write `record` into the caller's error slot.
///
/// A null slot is a no-op. A record already present in the slot is released
/// first, so at most one message is ever attached to a slot.
///
/// # Safety
///
/// `error` must be null or point to a valid, initialized `AdbcError`.
pub unsafe fn set_error(error: *mut FFI_AdbcError, record: &ErrorRecord) {
    let Some(error) = error.as_mut() else {
        return;
    };
    if let Some(release) = error.release.take() {
        release(error);
    }

    let message = CString::new(record.message.replace('\0', "")).unwrap_or_default();
    error.message = message.into_raw();
    error.vendor_code = record.vendor_code;
    error.sqlstate = record.sqlstate;
    error.release = Some(release_error);
}

unsafe extern "C" fn release_error(error: *mut FFI_AdbcError) {
    let Some(error) = error.as_mut() else {
        return;
    };
    if !error.message.is_null() {
        drop(CString::from_raw(error.message));
    }
    error.message = null_mut();
    error.release = None;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run one exported operation and convert its outcome to a status code.
///
/// Panics are caught here and never unwind into the caller. Failures are
/// logged and written to `error`.
///
/// # Safety
///
/// `error` must be null or point to a valid, initialized `AdbcError`.
pub(crate) unsafe fn ffi_call<D, F>(
    operation: &'static str,
    error: *mut FFI_AdbcError,
    body: F,
) -> AdbcStatusCode
where
    D: Driver,
    F: FnOnce() -> Result<(), BridgeError>,
{
    let result = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => Err(BridgeError::Panic {
            operation,
            message: panic_message(payload.as_ref()),
        }),
    };

    match result {
        Ok(()) => ADBC_STATUS_OK,
        Err(err) => {
            match &err {
                BridgeError::Handle { .. }
                | BridgeError::UnsupportedVersion { .. }
                | BridgeError::Panic { .. } => {
                    error!(driver = D::INFO.name, operation, %err, "contract violation")
                }
                BridgeError::Driver(_) => {
                    warn!(driver = D::INFO.name, operation, %err, "driver call failed")
                }
                _ => debug!(driver = D::INFO.name, operation, %err, "call rejected"),
            }
            let record = ErrorRecord::translate(&D::INFO.error_prefix(), &err);
            set_error(error, &record);
            record.status_code()
        }
    }
}
