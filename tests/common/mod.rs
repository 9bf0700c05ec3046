//! Common test utilities for adbc-bridge integration tests.
//!
//! The tests load an in-memory driver through its exported entry point and
//! call the bridge exclusively through the populated `AdbcDriver` table,
//! exactly as a native driver manager would.
//!
//! Every test works against its own `mem://` URI. The driver keeps one
//! [`Store`] per URI where tests can observe what reached the driver.
//!
//! # Logging
//!
//! ```bash
//! RUST_LOG=adbc_bridge=debug cargo test --test bridge_tests -- --nocapture
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once, OnceLock};

use adbc_bridge::adbc_ffi::{
    FFI_AdbcConnection, FFI_AdbcDatabase, FFI_AdbcDriver, FFI_AdbcError, FFI_AdbcStatement,
    ADBC_STATUS_OK, ADBC_VERSION_1_0_0,
};
use adbc_bridge::options::keys;
use adbc_bridge::{
    BoxedReader, Connection, Database, Driver, DriverInfo, DriverResult, ObjectDepth,
    ObjectFilter, Options, PartitionedResult, Statement,
};
use adbc_core::error::{Error as AdbcError, Status};
use arrow::compute::concat_batches;
use arrow_array::{Int64Array, RecordBatch, RecordBatchIterator, RecordBatchReader, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use parking_lot::Mutex;

// ============================================================================
// Observation Store
// ============================================================================

/// What the driver saw for one URI.
#[derive(Default)]
pub struct Store {
    pub database_options: Mutex<Option<Options>>,
    pub connection_options: Mutex<Option<Options>>,
    pub connection_set_options: Mutex<Vec<(String, String)>>,
    pub bound: Mutex<Vec<RecordBatch>>,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub databases_dropped: AtomicUsize,
    pub connections_closed: AtomicUsize,
    pub statements_closed: AtomicUsize,
}

/// The store for `uri`, created on first use.
pub fn store(uri: &str) -> Arc<Store> {
    static STORES: OnceLock<Mutex<HashMap<String, Arc<Store>>>> = OnceLock::new();
    let stores = STORES.get_or_init(|| Mutex::new(HashMap::new()));
    Arc::clone(stores.lock().entry(uri.to_string()).or_default())
}

/// A URI no other test uses.
pub fn unique_uri(name: &str) -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("mem://{}-{}", name, NEXT.fetch_add(1, Ordering::SeqCst))
}

// ============================================================================
// In-Memory Driver
// ============================================================================

/// URI prefix whose databases fail construction with a plain error.
pub const FAILING_URI: &str = "fail://";

/// SQL text the memory statement rejects with a structured error.
pub const FAILING_SQL: &str = "RAISE";

pub const VENDOR_CODE: i32 = 4711;
pub const SQLSTATE: &[u8; 5] = b"42000";

#[derive(Default)]
pub struct MemoryDriver;

impl Driver for MemoryDriver {
    const INFO: DriverInfo = DriverInfo {
        name: "Memory",
        vendor: "adbc-bridge tests",
        version: "0.1.0",
    };

    fn new_database(&self, options: &Options) -> DriverResult<Box<dyn Database>> {
        let uri = options.require(keys::URI)?;
        if uri.starts_with(FAILING_URI) {
            return Err(format!("cannot reach {}", uri).into());
        }
        let store = store(uri);
        *store.database_options.lock() = Some(options.clone());
        Ok(Box::new(MemoryDatabase { store }))
    }
}

adbc_bridge::export_driver!(AdbcDriverMemoryInit, MemoryDriver);

struct MemoryDatabase {
    store: Arc<Store>,
}

impl Drop for MemoryDatabase {
    fn drop(&mut self) {
        self.store.databases_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn open(&self, options: &Options) -> DriverResult<Box<dyn Connection>> {
        if options.get_bool(keys::READ_ONLY)? == Some(true) {
            return Err(AdbcError::with_message_and_status(
                "read-only connections are not supported",
                Status::NotImplemented,
            )
            .into());
        }
        *self.store.connection_options.lock() = Some(options.clone());
        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.store),
        }))
    }
}

pub fn numbers_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]))
}

pub fn numbers(values: Vec<i64>) -> RecordBatch {
    RecordBatch::try_new(numbers_schema(), vec![Arc::new(Int64Array::from(values))])
        .expect("valid numbers batch")
}

fn reader(schema: SchemaRef, batches: Vec<RecordBatch>) -> BoxedReader {
    Box::new(RecordBatchIterator::new(batches.into_iter().map(Ok), schema))
}

fn single_column(name: &str, values: Vec<&str>) -> BoxedReader {
    let schema = Arc::new(Schema::new(vec![Field::new(name, DataType::Utf8, false)]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(StringArray::from(values))])
        .expect("valid string batch");
    reader(schema, vec![batch])
}

struct MemoryConnection {
    store: Arc<Store>,
}

#[async_trait]
impl Connection for MemoryConnection {
    fn set_option(&mut self, key: &str, value: &str) -> DriverResult<()> {
        self.store
            .connection_set_options
            .lock()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn new_statement(&mut self) -> DriverResult<Box<dyn Statement>> {
        Ok(Box::new(MemoryStatement {
            store: Arc::clone(&self.store),
            sql: None,
            stream: None,
        }))
    }

    async fn get_info(&self, codes: &[u32]) -> DriverResult<BoxedReader> {
        let known: [(u32, &str); 4] = [
            (0, "Memory"),
            (1, "0"),
            (100, MemoryDriver::INFO.name),
            (101, MemoryDriver::INFO.version),
        ];
        let rows: Vec<_> = known
            .iter()
            .filter(|(code, _)| codes.is_empty() || codes.contains(code))
            .collect();

        let schema = Arc::new(Schema::new(vec![
            Field::new("info_name", DataType::UInt32, false),
            Field::new("info_value", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(UInt32Array::from_iter_values(rows.iter().map(|(c, _)| *c))),
                Arc::new(StringArray::from_iter_values(rows.iter().map(|(_, v)| *v))),
            ],
        )?;
        Ok(reader(schema, vec![batch]))
    }

    async fn get_objects(&self, depth: ObjectDepth, filter: &ObjectFilter) -> DriverResult<BoxedReader> {
        let catalogs = match filter.catalog.as_deref() {
            Some("memory") | None => vec!["memory"],
            Some(_) => vec![],
        };
        let name = match depth {
            ObjectDepth::Catalogs => "catalog_name",
            _ => "catalog_name_deep",
        };
        Ok(single_column(name, catalogs))
    }

    async fn get_table_schema(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        table_name: &str,
    ) -> DriverResult<Schema> {
        match table_name {
            "numbers" => Ok(numbers_schema().as_ref().clone()),
            other => Err(AdbcError::with_message_and_status(
                format!("table '{}' not found", other),
                Status::NotFound,
            )
            .into()),
        }
    }

    async fn get_table_types(&self) -> DriverResult<BoxedReader> {
        Ok(single_column("table_type", vec!["TABLE", "VIEW"]))
    }

    async fn read_partition(&self, partition: &[u8]) -> DriverResult<BoxedReader> {
        let id = std::str::from_utf8(partition)?;
        Ok(single_column("partition", vec![id]))
    }

    async fn commit(&mut self) -> DriverResult<()> {
        self.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        self.store.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.store.connections_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MemoryStatement {
    store: Arc<Store>,
    sql: Option<String>,
    stream: Option<BoxedReader>,
}

impl MemoryStatement {
    fn check_sql(&self) -> DriverResult<()> {
        match self.sql.as_deref() {
            None => Err(AdbcError::with_message_and_status(
                "no query set",
                Status::InvalidState,
            )
            .into()),
            Some(FAILING_SQL) => {
                let mut err = AdbcError::with_message_and_status("syntax error", Status::InvalidArguments);
                err.vendor_code = VENDOR_CODE;
                err.sqlstate = SQLSTATE.map(|b| b as std::os::raw::c_char);
                Err(err.into())
            }
            Some(_) => Ok(()),
        }
    }
}

#[async_trait]
impl Statement for MemoryStatement {
    fn set_sql_query(&mut self, query: &str) -> DriverResult<()> {
        self.sql = Some(query.to_string());
        Ok(())
    }

    fn set_option(&mut self, key: &str, _value: &str) -> DriverResult<()> {
        match key {
            keys::INGEST_TARGET_TABLE | keys::INGEST_MODE => Ok(()),
            other => Err(AdbcError::with_message_and_status(
                format!("unknown statement option '{}'", other),
                Status::NotImplemented,
            )
            .into()),
        }
    }

    fn get_parameter_schema(&self) -> DriverResult<Schema> {
        self.check_sql()?;
        Ok(numbers_schema().as_ref().clone())
    }

    async fn prepare(&mut self) -> DriverResult<()> {
        self.check_sql()
    }

    async fn bind(&mut self, batch: RecordBatch) -> DriverResult<()> {
        self.store.bound.lock().push(batch);
        Ok(())
    }

    async fn bind_stream(&mut self, reader: BoxedReader) -> DriverResult<()> {
        self.stream = Some(reader);
        Ok(())
    }

    async fn execute_query(&mut self) -> DriverResult<(BoxedReader, i64)> {
        self.check_sql()?;
        let batch = numbers(vec![1, 2, 3]);
        Ok((reader(numbers_schema(), vec![batch]), -1))
    }

    async fn execute_update(&mut self) -> DriverResult<i64> {
        self.check_sql()?;
        let Some(stream) = self.stream.take() else {
            return Ok(0);
        };
        let schema = stream.schema();
        let batches = stream.collect::<Result<Vec<_>, _>>()?;
        let combined = concat_batches(&schema, &batches)?;
        let rows = combined.num_rows() as i64;
        self.store.bound.lock().push(combined);
        Ok(rows)
    }

    async fn execute_partitions(&mut self) -> DriverResult<PartitionedResult> {
        self.check_sql()?;
        Ok(PartitionedResult {
            schema: Some(numbers_schema()),
            partitions: vec![b"A".to_vec(), b"BB".to_vec()],
            rows_affected: -1,
        })
    }

    fn close(&mut self) -> DriverResult<()> {
        self.store.statements_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Function Table Helpers
// ============================================================================

/// Install a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Call a function from the loaded table.
macro_rules! call {
    ($bridge:expr, $func:ident $(, $arg:expr)* $(,)?) => {
        unsafe {
            ($bridge
                .table
                .$func
                .expect(concat!(stringify!($func), " not populated")))($($arg),*)
        }
    };
}

/// A driver table loaded through `AdbcDriverMemoryInit`.
pub struct Bridge {
    pub table: FFI_AdbcDriver,
}

impl Bridge {
    pub fn load() -> Self {
        init_tracing();
        let mut table = MaybeUninit::<FFI_AdbcDriver>::uninit();
        let mut error = FFI_AdbcError::empty();
        let status = unsafe {
            AdbcDriverMemoryInit(ADBC_VERSION_1_0_0, table.as_mut_ptr().cast(), &mut error)
        };
        assert_eq!(status, ADBC_STATUS_OK, "driver init failed: {}", message(&error));
        Bridge {
            table: unsafe { table.assume_init() },
        }
    }

    /// New + SetOption(uri) + Init.
    pub fn open_database(&self, uri: &str) -> FFI_AdbcDatabase {
        let mut database = FFI_AdbcDatabase::empty();
        let mut error = FFI_AdbcError::empty();
        let key = cstr(keys::URI);
        let value = cstr(uri);

        assert_eq!(call!(self, database_new, &mut database, &mut error), ADBC_STATUS_OK);
        assert_eq!(
            call!(self, database_set_option, &mut database, key.as_ptr(), value.as_ptr(), &mut error),
            ADBC_STATUS_OK
        );
        assert_eq!(
            call!(self, database_init, &mut database, &mut error),
            ADBC_STATUS_OK,
            "{}",
            message(&error)
        );
        database
    }

    pub fn open_connection(&self, database: &mut FFI_AdbcDatabase) -> FFI_AdbcConnection {
        let mut connection = FFI_AdbcConnection::empty();
        let mut error = FFI_AdbcError::empty();
        assert_eq!(call!(self, connection_new, &mut connection, &mut error), ADBC_STATUS_OK);
        assert_eq!(
            call!(self, connection_init, &mut connection, database, &mut error),
            ADBC_STATUS_OK,
            "{}",
            message(&error)
        );
        connection
    }

    pub fn new_statement(&self, connection: &mut FFI_AdbcConnection, sql: &str) -> FFI_AdbcStatement {
        let mut statement = FFI_AdbcStatement::empty();
        let mut error = FFI_AdbcError::empty();
        let sql = cstr(sql);
        assert_eq!(
            call!(self, statement_new, connection, &mut statement, &mut error),
            ADBC_STATUS_OK,
            "{}",
            message(&error)
        );
        assert_eq!(
            call!(self, statement_set_sql_query, &mut statement, sql.as_ptr(), &mut error),
            ADBC_STATUS_OK
        );
        statement
    }
}

pub fn cstr(value: &str) -> CString {
    CString::new(value).expect("no interior NUL")
}

/// Message currently held by an error slot, or an empty string.
pub fn message(error: &FFI_AdbcError) -> String {
    if error.message.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(error.message) }
        .to_string_lossy()
        .into_owned()
}
