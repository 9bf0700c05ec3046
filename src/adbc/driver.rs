//! Driver capability exported through the bridge.
//!
//! A `Driver` is the single factory the bridge needs: given the options a
//! native caller accumulated on an `AdbcDatabase`, produce a live
//! [`Database`]. Everything below the database is reached through the
//! objects it returns.

use std::fmt;

use crate::adbc::Database;
use crate::error::DriverResult;
use crate::options::Options;

/// Descriptive metadata of a driver.
///
/// `name` prefixes every error message written to a caller's error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverInfo {
    /// Driver name, e.g. `"Memory"`
    pub name: &'static str,
    /// Vendor of the backing database
    pub vendor: &'static str,
    /// Driver version string
    pub version: &'static str,
}

impl DriverInfo {
    /// Prefix written in front of every error message.
    pub fn error_prefix(&self) -> String {
        format!("[{}] ", self.name)
    }
}

impl fmt::Display for DriverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.vendor)
    }
}

/// A database driver that can be exported through the ADBC C interface.
///
/// The bridge creates a fresh driver value with [`Default`] for every
/// `AdbcDatabaseInit`, so drivers should be cheap to construct and keep
/// process-wide state (connection pools, allocators) in statics of their own.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// struct MyDriver;
///
/// impl adbc_bridge::Driver for MyDriver {
///     const INFO: DriverInfo = DriverInfo { name: "Mine", vendor: "Acme", version: "1.0" };
///
///     fn new_database(&self, options: &Options) -> DriverResult<Box<dyn Database>> {
///         Ok(Box::new(MyDatabase::open(options.require(keys::URI)?)?))
///     }
/// }
///
/// adbc_bridge::export_driver!(AdbcMyDriverInit, MyDriver);
/// ```
pub trait Driver: Default + Send + Sync + 'static {
    /// Driver metadata.
    const INFO: DriverInfo;

    /// Construct a database from the options set before `AdbcDatabaseInit`.
    fn new_database(&self, options: &Options) -> DriverResult<Box<dyn Database>>;
}
