//! Statement capability.
//!
//! A statement is created by [`Connection::new_statement`](crate::adbc::Connection::new_statement)
//! and is configured, optionally prepared and bound, then executed. The bridge
//! calls these methods in whatever order the native caller issues them; the
//! driver decides which sequences are valid.

use adbc_core::error::{Error as AdbcError, Status};
use arrow_array::RecordBatch;
use arrow_schema::{Schema, SchemaRef};
use async_trait::async_trait;

use crate::adbc::connection::BoxedReader;
use crate::error::DriverResult;

/// Result of a partitioned execution.
#[derive(Debug, Clone, Default)]
pub struct PartitionedResult {
    /// Schema shared by every partition, if known up front
    pub schema: Option<SchemaRef>,
    /// Opaque partition identifiers, resumed with `read_partition`
    pub partitions: Vec<Vec<u8>>,
    /// Rows affected, or -1 if unknown
    pub rows_affected: i64,
}

fn not_implemented<T>(what: &str) -> DriverResult<T> {
    Err(AdbcError::with_message_and_status(
        format!("{} not implemented", what),
        Status::NotImplemented,
    )
    .into())
}

/// A query or update bound to a connection.
#[async_trait]
pub trait Statement: Send {
    /// Set the SQL text executed by the next `execute_*` call.
    fn set_sql_query(&mut self, query: &str) -> DriverResult<()>;

    fn set_substrait_plan(&mut self, plan: &[u8]) -> DriverResult<()> {
        let _ = plan;
        not_implemented("Substrait plans")
    }

    fn set_option(&mut self, key: &str, value: &str) -> DriverResult<()> {
        let _ = value;
        not_implemented(&format!("Statement option '{}'", key))
    }

    /// Schema of the bind parameters, available after `prepare`.
    fn get_parameter_schema(&self) -> DriverResult<Schema> {
        not_implemented("get_parameter_schema")
    }

    async fn prepare(&mut self) -> DriverResult<()> {
        not_implemented("prepare")
    }

    /// Attach a single batch of parameter values.
    async fn bind(&mut self, batch: RecordBatch) -> DriverResult<()> {
        let _ = batch;
        not_implemented("bind")
    }

    /// Attach a stream of parameter batches.
    ///
    /// The reader is lazy; the driver pulls batches while executing.
    async fn bind_stream(&mut self, reader: BoxedReader) -> DriverResult<()> {
        let _ = reader;
        not_implemented("bind_stream")
    }

    /// Execute and return the result reader plus rows affected (-1 if unknown).
    async fn execute_query(&mut self) -> DriverResult<(BoxedReader, i64)>;

    /// Execute without a result set.
    async fn execute_update(&mut self) -> DriverResult<i64>;

    async fn execute_partitions(&mut self) -> DriverResult<PartitionedResult> {
        not_implemented("execute_partitions")
    }

    /// Close the statement. Called once from `AdbcStatementRelease`.
    fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub Stmt {}

        #[async_trait]
        impl Statement for Stmt {
            fn set_sql_query(&mut self, query: &str) -> DriverResult<()>;
            async fn execute_query(&mut self) -> DriverResult<(BoxedReader, i64)>;
            async fn execute_update(&mut self) -> DriverResult<i64>;
        }
    }

    fn status_of(err: crate::error::DriverError) -> Status {
        err.downcast_ref::<AdbcError>()
            .map(|e| e.status)
            .unwrap_or(Status::Unknown)
    }

    #[tokio::test]
    async fn test_optional_operations_default_to_not_implemented() {
        let mut stmt = MockStmt::new();

        assert_eq!(
            status_of(stmt.prepare().await.unwrap_err()),
            Status::NotImplemented
        );
        assert_eq!(
            status_of(stmt.execute_partitions().await.unwrap_err()),
            Status::NotImplemented
        );
        assert_eq!(
            status_of(stmt.set_substrait_plan(b"plan").unwrap_err()),
            Status::NotImplemented
        );
        let err = stmt.set_option("adbc.ingest.mode", "append").unwrap_err();
        assert!(err.to_string().contains("adbc.ingest.mode"));
        assert!(stmt.close().is_ok());
    }

    #[tokio::test]
    async fn test_required_operations_reach_driver() {
        let mut stmt = MockStmt::new();
        stmt.expect_set_sql_query()
            .withf(|q| q == "DELETE FROM t")
            .times(1)
            .returning(|_| Ok(()));
        stmt.expect_execute_update().times(1).returning(|| Ok(3));

        stmt.set_sql_query("DELETE FROM t").unwrap();
        assert_eq!(stmt.execute_update().await.unwrap(), 3);
    }

    /// Keeps the bound reader until execution. `BoxedReader` is `Send` but
    /// not `Sync`.
    struct DeferredStmt {
        pending: Option<BoxedReader>,
    }

    #[async_trait]
    impl Statement for DeferredStmt {
        fn set_sql_query(&mut self, _query: &str) -> DriverResult<()> {
            Ok(())
        }

        async fn bind_stream(&mut self, reader: BoxedReader) -> DriverResult<()> {
            self.pending = Some(reader);
            Ok(())
        }

        async fn execute_query(&mut self) -> DriverResult<(BoxedReader, i64)> {
            not_implemented("queries")
        }

        async fn execute_update(&mut self) -> DriverResult<i64> {
            let Some(reader) = self.pending.take() else {
                return Ok(0);
            };
            let rows = reader
                .map(|batch| batch.map(|b| b.num_rows() as i64))
                .sum::<Result<i64, _>>()?;
            Ok(rows)
        }
    }

    #[tokio::test]
    async fn test_statement_can_hold_bound_stream() {
        use arrow_array::{Int64Array, RecordBatchIterator};
        use arrow_schema::{DataType, Field};
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(vec![1, 2, 3]))])
            .unwrap();
        let reader: BoxedReader = Box::new(RecordBatchIterator::new(vec![Ok(batch)], schema));

        let mut stmt: Box<dyn Statement> = Box::new(DeferredStmt { pending: None });
        stmt.bind_stream(reader).await.unwrap();
        assert_eq!(stmt.execute_update().await.unwrap(), 3);
        assert_eq!(stmt.execute_update().await.unwrap(), 0);
    }

    #[test]
    fn test_partitioned_result_default() {
        let result = PartitionedResult::default();
        assert!(result.schema.is_none());
        assert!(result.partitions.is_empty());
    }
}
