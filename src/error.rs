//! Error types for adbc-bridge.
//!
//! Errors are organized by where they are detected: the handle registry,
//! the bridge's own protocol checks, and the driver behind the bridge.

use std::fmt;

use adbc_core::error::{Error as AdbcError, Status};
use arrow_schema::ArrowError;
use thiserror::Error;

/// Error produced by driver implementations.
///
/// Drivers may return any error type. Errors that are an
/// [`adbc_core::error::Error`] keep their status, vendor code and SQLSTATE
/// across the boundary; anything else is reported as `UNKNOWN`.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// The kind of resource an exported call operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Database,
    Connection,
    Statement,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Database => "database",
            Resource::Connection => "connection",
            Resource::Statement => "statement",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the handle registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The handle was never issued or has already been released
    #[error("stale handle {handle:#x}")]
    Stale { handle: u64 },

    /// The handle refers to an object of another type
    #[error("handle {handle:#x} does not refer to a {expected}")]
    Foreign { handle: u64, expected: &'static str },
}

/// Errors surfaced by exported bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The resource struct is null or its private data is unset
    #[error("{operation}: {resource} not allocated")]
    NotAllocated {
        operation: &'static str,
        resource: Resource,
    },

    /// `New` was called on a resource struct that is already in use
    #[error("{operation}: {resource} already allocated")]
    AlreadyAllocated {
        operation: &'static str,
        resource: Resource,
    },

    /// A data operation was called before `Init`
    #[error("{operation}: {resource} not initialized")]
    NotInitialized {
        operation: &'static str,
        resource: Resource,
    },

    /// `Init` was called twice, or an option was set after `Init`
    #[error("{operation}: {resource} already initialized")]
    AlreadyInitialized {
        operation: &'static str,
        resource: Resource,
    },

    /// A callback-owning struct was released twice
    #[error("{operation}: {what} already released")]
    AlreadyReleased {
        operation: &'static str,
        what: &'static str,
    },

    /// A required pointer argument was null
    #[error("{operation}: {argument} must not be null")]
    NullArgument {
        operation: &'static str,
        argument: &'static str,
    },

    /// A string argument was not valid UTF-8
    #[error("{operation}: {argument} is not valid UTF-8")]
    InvalidUtf8 {
        operation: &'static str,
        argument: &'static str,
    },

    /// An argument held a value outside its domain
    #[error("{operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },

    /// The registry rejected a handle
    #[error("{operation}: {source}")]
    Handle {
        operation: &'static str,
        #[source]
        source: HandleError,
    },

    /// Columnar data supplied by the caller could not be imported
    #[error("{operation}: {source}")]
    Import {
        operation: &'static str,
        #[source]
        source: ArrowError,
    },

    /// Columnar data produced by the driver could not be exported
    #[error("{operation}: {source}")]
    Export {
        operation: &'static str,
        #[source]
        source: ArrowError,
    },

    /// The loader asked for an ABI version this bridge does not implement
    #[error("Only version {expected} supported, got {actual}")]
    UnsupportedVersion { expected: i32, actual: i32 },

    /// The async runtime could not run a driver call
    #[error("{operation}: {message}")]
    Runtime {
        operation: &'static str,
        message: String,
    },

    /// The driver panicked inside an exported call
    #[error("{operation}: driver panicked: {message}")]
    Panic {
        operation: &'static str,
        message: String,
    },

    /// Error returned by the driver
    #[error("{0}")]
    Driver(DriverError),
}

impl BridgeError {
    /// Map to an ADBC status.
    pub fn status(&self) -> Status {
        match self {
            BridgeError::NotAllocated { .. }
            | BridgeError::AlreadyAllocated { .. }
            | BridgeError::NotInitialized { .. }
            | BridgeError::AlreadyInitialized { .. }
            | BridgeError::AlreadyReleased { .. }
            | BridgeError::Handle { .. } => Status::InvalidState,
            BridgeError::NullArgument { .. }
            | BridgeError::InvalidUtf8 { .. }
            | BridgeError::InvalidArgument { .. }
            | BridgeError::Import { .. } => Status::InvalidArguments,
            BridgeError::UnsupportedVersion { .. } => Status::NotImplemented,
            BridgeError::Export { .. } | BridgeError::Runtime { .. } | BridgeError::Panic { .. } => {
                Status::Internal
            }
            BridgeError::Driver(err) => match err.downcast_ref::<AdbcError>() {
                Some(adbc) => adbc.status,
                None => Status::Unknown,
            },
        }
    }

    /// The structured driver error behind this error, if any.
    pub fn as_adbc(&self) -> Option<&AdbcError> {
        match self {
            BridgeError::Driver(err) => err.downcast_ref::<AdbcError>(),
            _ => None,
        }
    }

    /// Human-readable message, without any driver prefix.
    ///
    /// Structured driver errors report their own message verbatim.
    pub fn message(&self) -> String {
        match self.as_adbc() {
            Some(adbc) => adbc.message.clone(),
            None => self.to_string(),
        }
    }
}

impl From<AdbcError> for BridgeError {
    fn from(err: AdbcError) -> Self {
        BridgeError::Driver(Box::new(err))
    }
}
