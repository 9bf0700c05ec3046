//! Database capability.

use async_trait::async_trait;

use crate::adbc::Connection;
use crate::error::DriverResult;
use crate::options::Options;

/// An initialized database produced by [`Driver::new_database`](crate::Driver::new_database).
///
/// A database is a factory for connections. Every connection opened from it
/// holds a reference to the database, so it is dropped only after
/// `AdbcDatabaseRelease` and the release of its last connection.
#[async_trait]
pub trait Database: Send + Sync {
    /// Open a connection, applying the options set before `AdbcConnectionInit`.
    async fn open(&self, options: &Options) -> DriverResult<Box<dyn Connection>>;
}
