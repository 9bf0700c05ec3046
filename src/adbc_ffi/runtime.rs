//! Blocking execution of driver futures on the caller's thread.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::BridgeError;

/// Global tokio runtime for async-to-sync bridging, built on first use.
fn get_runtime(operation: &'static str) -> Result<&'static Runtime, BridgeError> {
    static RUNTIME: OnceLock<std::io::Result<Runtime>> = OnceLock::new();
    RUNTIME
        .get_or_init(|| {
            Builder::new_multi_thread()
                .enable_all()
                .thread_name("adbc-bridge")
                .build()
        })
        .as_ref()
        .map_err(|e| BridgeError::Runtime {
            operation,
            message: format!("failed to start async runtime: {}", e),
        })
}

/// Drive `future` to completion, blocking the calling thread.
///
/// Callers that are themselves inside a tokio runtime cannot block on it, so
/// the future is then driven from a scoped helper thread instead.
pub(crate) fn block_on<F>(operation: &'static str, future: F) -> Result<F::Output, BridgeError>
where
    F: Future + Send,
    F::Output: Send,
{
    let runtime = get_runtime(operation)?;
    if Handle::try_current().is_err() {
        return Ok(runtime.block_on(future));
    }

    std::thread::scope(|scope| scope.spawn(move || runtime.block_on(future)).join()).map_err(|_| {
        BridgeError::Panic {
            operation,
            message: "driver future panicked".to_string(),
        }
    })
}
