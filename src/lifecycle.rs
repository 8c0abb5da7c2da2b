//! Foreground / background state pushed in by the native app

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, uniffi::Enum, derive_more::Display)]
pub enum Visibility {
    Foreground,
    Background,
}

#[derive(Debug)]
pub struct AppLifecycle {
    visibility: watch::Sender<Visibility>,
}

nevm_macros::impl_default_for!(AppLifecycle);
impl AppLifecycle {
    /// Starts in the foreground, the app is visible when the core is created
    pub fn new() -> Self {
        let (visibility, _) = watch::channel(Visibility::Foreground);
        Self { visibility }
    }

    /// Record a visibility change, subscribers only wake when it actually changed
    pub fn set(&self, visibility: Visibility) {
        let changed = self.visibility.send_if_modified(|current| {
            let changed = *current != visibility;
            *current = visibility;
            changed
        });

        if changed {
            debug!("app moved to the {visibility}");
        }
    }

    pub fn current(&self) -> Visibility {
        *self.visibility.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.visibility.subscribe()
    }
}
