//! Driver-side capabilities exported through the bridge.
//!
//! A driver crate implements these traits; the bridge in
//! [`adbc_ffi`](crate::adbc_ffi) owns the C structs, enforces the resource
//! lifecycle and calls into the traits once a call is known to be valid.
//!
//! # Architecture
//!
//! - `Driver` - metadata and factory for databases
//! - `Database` - factory for connections
//! - `Connection` - metadata queries, transactions and statements
//! - `Statement` - query configuration, parameter binding and execution

pub mod connection;
pub mod database;
pub mod driver;
pub mod statement;

pub use connection::{BoxedReader, Connection, ObjectDepth, ObjectFilter};
pub use database::Database;
pub use driver::{Driver, DriverInfo};
pub use statement::{PartitionedResult, Statement};
