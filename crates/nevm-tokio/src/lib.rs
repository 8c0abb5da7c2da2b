mod abortable_task;
pub mod task;
pub mod unblock;

use std::sync::OnceLock;
use tokio::runtime::Handle;

pub use abortable_task::AbortableTask;

pub(crate) static TOKIO: OnceLock<Handle> = OnceLock::new();

/// Register the runtime the native side started us on, used when spawning from a thread
/// that is not inside a runtime (ffi callbacks)
pub fn init() {
    if TOKIO.get().is_some() {
        return;
    }

    let _ = TOKIO.set(Handle::current());
}
