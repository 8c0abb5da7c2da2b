//! Send updates from rust to the frontend

use nevm_types::{ImportedToken, NetworkInfo, TxRecord, TxStatus};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
#[allow(clippy::enum_variant_names)]
pub enum AppStateReconcileMessage {
    /// network config finished loading from disk
    NetworksReady,
    SelectedNetworkChanged(NetworkInfo),
    /// a custom network or an override was added, edited or removed
    NetworksChanged(Vec<NetworkInfo>),
    TxHistoryChanged(Vec<TxRecord>),
    TxStatusChanged { hash: String, status: TxStatus },
    ImportedTokensChanged(Vec<ImportedToken>),
}

// alias for easier imports on the rust side
pub type Update = AppStateReconcileMessage;

/// Sending half of the update channel, handed to every service that reports to the frontend
#[derive(Debug, Clone)]
pub struct Updater(flume::Sender<AppStateReconcileMessage>);

impl Updater {
    pub fn new(sender: flume::Sender<AppStateReconcileMessage>) -> Self {
        Self(sender)
    }

    /// Create an updater with its receiving end
    pub fn channel() -> (Self, flume::Receiver<AppStateReconcileMessage>) {
        let (sender, receiver) = flume::bounded(1000);
        (Self(sender), receiver)
    }

    /// Updater nobody listens to, messages are dropped
    pub fn disconnected() -> Self {
        let (sender, _) = flume::bounded(1);
        Self(sender)
    }

    pub fn send_update(&self, message: AppStateReconcileMessage) {
        if let Err(error) = self.0.try_send(message) {
            warn!("unable to send update to the frontend: {error}");
        }
    }
}

#[uniffi::export(callback_interface)]
pub trait FfiReconcile: Send + Sync + 'static {
    /// Essentially a callback to the frontend
    fn reconcile(&self, message: AppStateReconcileMessage);
}
