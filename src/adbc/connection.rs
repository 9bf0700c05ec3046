//! Connection capability.
//!
//! Metadata calls return lazily evaluated record batch readers; the bridge
//! moves them into the caller's `ArrowArrayStream` without pulling any batch.

use std::os::raw::c_int;

use adbc_core::error::{Error as AdbcError, Status};
use arrow_array::RecordBatchReader;
use arrow_schema::Schema;
use async_trait::async_trait;

use crate::adbc::Statement;
use crate::error::DriverResult;

/// Boxed reader handed back to native callers.
pub type BoxedReader = Box<dyn RecordBatchReader + Send>;

/// How deep `get_objects` descends into the catalog hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectDepth {
    /// Catalogs, schemas, tables and columns
    All,
    /// Catalogs only
    Catalogs,
    /// Catalogs and schemas
    DbSchemas,
    /// Catalogs, schemas and tables
    Tables,
}

impl TryFrom<c_int> for ObjectDepth {
    type Error = c_int;

    fn try_from(value: c_int) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ObjectDepth::All),
            1 => Ok(ObjectDepth::Catalogs),
            2 => Ok(ObjectDepth::DbSchemas),
            3 => Ok(ObjectDepth::Tables),
            other => Err(other),
        }
    }
}

/// Filters passed to [`Connection::get_objects`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectFilter {
    pub catalog: Option<String>,
    pub db_schema: Option<String>,
    pub table_name: Option<String>,
    pub table_types: Option<Vec<String>>,
    pub column_name: Option<String>,
}

fn not_implemented<T>(what: &str) -> DriverResult<T> {
    Err(AdbcError::with_message_and_status(
        format!("{} not implemented", what),
        Status::NotImplemented,
    )
    .into())
}

/// An open connection to the database.
///
/// Optional operations default to `NOT_IMPLEMENTED`.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Change an option after `AdbcConnectionInit`.
    fn set_option(&mut self, key: &str, value: &str) -> DriverResult<()> {
        let _ = value;
        not_implemented(&format!("Connection option '{}'", key))
    }

    /// Create a statement bound to this connection.
    fn new_statement(&mut self) -> DriverResult<Box<dyn Statement>>;

    /// Driver and database metadata for the requested info codes.
    ///
    /// An empty slice requests every code the driver knows.
    async fn get_info(&self, codes: &[u32]) -> DriverResult<BoxedReader> {
        let _ = codes;
        not_implemented("get_info")
    }

    /// Hierarchical catalog metadata.
    async fn get_objects(&self, depth: ObjectDepth, filter: &ObjectFilter) -> DriverResult<BoxedReader> {
        let _ = (depth, filter);
        not_implemented("get_objects")
    }

    /// Arrow schema of a single table.
    async fn get_table_schema(
        &self,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table_name: &str,
    ) -> DriverResult<Schema> {
        let _ = (catalog, db_schema, table_name);
        not_implemented("get_table_schema")
    }

    /// Table types the database supports.
    async fn get_table_types(&self) -> DriverResult<BoxedReader> {
        not_implemented("get_table_types")
    }

    /// Resume one partition produced by `execute_partitions`.
    async fn read_partition(&self, partition: &[u8]) -> DriverResult<BoxedReader> {
        let _ = partition;
        not_implemented("read_partition")
    }

    async fn commit(&mut self) -> DriverResult<()> {
        not_implemented("commit")
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        not_implemented("rollback")
    }

    /// Close the connection. Called once from `AdbcConnectionRelease`.
    fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_depth_from_c() {
        assert_eq!(ObjectDepth::try_from(0), Ok(ObjectDepth::All));
        assert_eq!(ObjectDepth::try_from(1), Ok(ObjectDepth::Catalogs));
        assert_eq!(ObjectDepth::try_from(2), Ok(ObjectDepth::DbSchemas));
        assert_eq!(ObjectDepth::try_from(3), Ok(ObjectDepth::Tables));
        assert_eq!(ObjectDepth::try_from(9), Err(9));
    }
}
