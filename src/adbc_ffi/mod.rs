//! ADBC 1.0.0 C interface for any [`Driver`](crate::Driver).
//!
//! This module turns a Rust driver into a C-compatible shared library. Native
//! callers never hold Rust pointers: every `AdbcDatabase`, `AdbcConnection`
//! and `AdbcStatement` carries a handle slot in `private_data` that resolves
//! through the process-wide [`handle`](crate::handle) registry.
//!
//! Driver calls are async; each exported function blocks the calling thread
//! on a shared tokio runtime until the driver future completes.
//!
//! # FFI Export
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct MemoryDriver;
//!
//! impl adbc_bridge::Driver for MemoryDriver { /* ... */ }
//!
//! adbc_bridge::export_driver!(AdbcDriverMemoryInit, MemoryDriver);
//! ```
//!
//! Built as a `cdylib`, the library exports `AdbcDriverMemoryInit` and can
//! be loaded by any ADBC driver manager.
//!
//! ## Using with ADBC Driver Manager (Python)
//!
//! ```python
//! import adbc_driver_manager
//!
//! with adbc_driver_manager.AdbcDatabase(
//!     driver="/path/to/libmemory_driver.so",
//!     entrypoint="AdbcDriverMemoryInit",
//!     uri="mem://demo",
//! ) as db:
//!     with adbc_driver_manager.AdbcConnection(db) as conn:
//!         with adbc_driver_manager.AdbcStatement(conn) as stmt:
//!             stmt.set_sql_query("SELECT 1")
//!             reader, _ = stmt.execute_query()
//! ```
//!
//! # Ownership rules
//!
//! | Struct | Produced by | Released by |
//! |--------|-------------|-------------|
//! | `AdbcError` message | bridge | caller, via `release` |
//! | `AdbcPartitions` | bridge | caller, via `release` |
//! | exported `ArrowArrayStream` / `ArrowSchema` | bridge | caller |
//! | bound `ArrowArray` / `ArrowSchema` / `ArrowArrayStream` | caller | bridge, on every path |

mod arrow;
mod connection;
mod database;
mod entry;
mod error;
mod partitions;
mod runtime;
mod slot;
mod statement;
mod types;

pub use entry::driver_init;
pub use error::{set_error, ErrorRecord};
pub use types::*;
