use crate::TOKIO;

use core::future::Future;
use tokio::{runtime::Handle, task::JoinHandle};

/// Prefer the runtime we are currently running on, fall back to the registered one
fn handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| {
        TOKIO.get().expect("tokio runtime not initialized, call nevm_tokio::init first").clone()
    })
}

pub fn spawn<T>(task: T) -> JoinHandle<T::Output>
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    handle().spawn(task)
}

pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    handle().spawn_blocking(f)
}
