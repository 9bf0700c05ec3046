//! # adbc-bridge
//!
//! Export a Rust database driver through the ADBC 1.0.0 C interface.
//!
//! A driver implements the async capability traits in [`adbc`] (`Driver`,
//! `Database`, `Connection`, `Statement`) and exports itself with
//! [`export_driver!`]. The bridge then owns everything native callers see:
//! opaque handles, the resource lifecycle, error records, and Arrow C Data
//! Interface marshaling of streams, batches and partition descriptors.
//!
//! ## Example
//!
//! ```ignore
//! use adbc_bridge::{Database, Driver, DriverInfo, DriverResult, Options};
//!
//! #[derive(Default)]
//! struct MemoryDriver;
//!
//! impl Driver for MemoryDriver {
//!     const INFO: DriverInfo = DriverInfo {
//!         name: "Memory",
//!         vendor: "Example",
//!         version: env!("CARGO_PKG_VERSION"),
//!     };
//!
//!     fn new_database(&self, options: &Options) -> DriverResult<Box<dyn Database>> {
//!         Ok(Box::new(MemoryDatabase::new(options)?))
//!     }
//! }
//!
//! adbc_bridge::export_driver!(AdbcDriverMemoryInit, MemoryDriver);
//! ```

// Module declarations
pub mod adbc;
pub mod adbc_ffi;
pub mod error;
pub mod handle;
pub mod options;

// Re-export public API
pub use adbc::{
    BoxedReader, Connection, Database, Driver, DriverInfo, ObjectDepth, ObjectFilter,
    PartitionedResult, Statement,
};
pub use error::{BridgeError, DriverError, DriverResult, HandleError};
pub use handle::{Handle, HandleRegistry};
pub use options::Options;
