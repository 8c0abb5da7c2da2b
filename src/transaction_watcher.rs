//! Watches submitted transactions until they are confirmed or failed
//!
//! Every tracked hash gets two detectors: one waiting on the chain for the transaction to be
//! mined, one checking for a receipt right away and again every time the app comes back to the
//! foreground (the first one can stall while the app is suspended). Whichever reports first
//! decides the outcome, the other one is aborted and anything it reports later is ignored.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, Weak},
};

use nevm_tokio::AbortableTask;
use nevm_types::{NetworkKey, TxStatus};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    consts::TX_CONFIRMATIONS,
    lifecycle::{AppLifecycle, Visibility},
    rpc::ChainClient,
    tx_history::TxHistory,
};

#[derive(Debug, Clone, Copy, derive_more::Display)]
enum Detector {
    #[display("chain event")]
    Event,
    #[display("foreground check")]
    Foreground,
}

/// Single assignment result of one tracked transaction
#[derive(Debug)]
struct Outcome {
    hash: String,
    network: Option<NetworkKey>,
    status: OnceLock<TxStatus>,
}

impl Outcome {
    fn is_settled(&self) -> bool {
        self.status.get().is_some()
    }
}

#[derive(Debug)]
struct TrackedTx {
    outcome: Arc<Outcome>,
    /// dropping these aborts both detectors
    _tasks: Vec<AbortableTask<()>>,
}

#[derive(Debug)]
struct Inner {
    history: Arc<TxHistory>,
    lifecycle: Arc<AppLifecycle>,
    tracked: Mutex<HashMap<String, TrackedTx>>,
}

#[derive(Debug, Clone)]
pub struct TransactionWatcher {
    inner: Arc<Inner>,
}

impl TransactionWatcher {
    pub fn new(history: Arc<TxHistory>, lifecycle: Arc<AppLifecycle>) -> Self {
        let inner = Inner { history, lifecycle, tracked: Mutex::new(HashMap::new()) };
        Self { inner: Arc::new(inner) }
    }

    /// Start both detectors for `hash` on the active network, returns false if it is already
    /// being tracked
    pub fn track(&self, client: Arc<dyn ChainClient>, hash: &str) -> bool {
        self.arm(client, self.inner.history.network(), hash)
    }

    /// Same as [`TransactionWatcher::track`] for a transaction sent on `network`, its outcome is
    /// written to that network's history even if another one is active by then
    pub fn track_on(
        &self,
        client: Arc<dyn ChainClient>,
        network: NetworkKey,
        hash: &str,
    ) -> bool {
        self.arm(client, Some(network), hash)
    }

    fn arm(&self, client: Arc<dyn ChainClient>, network: Option<NetworkKey>, hash: &str) -> bool {
        let mut tracked = self.inner.tracked.lock();
        if tracked.contains_key(hash) {
            debug!("already tracking {hash}");
            return false;
        }

        let outcome = Arc::new(Outcome {
            hash: hash.to_string(),
            network,
            status: OnceLock::new(),
        });

        let weak = Arc::downgrade(&self.inner);

        let event = AbortableTask::spawn(event_detector(
            weak.clone(),
            client.clone(),
            outcome.clone(),
        ));

        let foreground = AbortableTask::spawn(foreground_detector(
            weak,
            client,
            outcome.clone(),
            self.inner.lifecycle.subscribe(),
        ));

        debug!("tracking transaction {hash}");
        tracked.insert(hash.to_string(), TrackedTx { outcome, _tasks: vec![event, foreground] });

        true
    }

    /// Track every pending transaction of the active history, returns how many were armed
    pub fn resume(&self, client: Arc<dyn ChainClient>) -> usize {
        let pending = self.inner.history.pending();

        let armed = pending.iter().filter(|record| self.track(client.clone(), &record.hash)).count();

        if armed > 0 {
            info!("resumed watching {armed} pending transactions");
        }

        armed
    }

    /// Abort every detector, their transactions stay pending in the history
    pub fn stop_all(&self) {
        let stopped = std::mem::take(&mut *self.inner.tracked.lock());

        if !stopped.is_empty() {
            debug!("stopped watching {} transactions", stopped.len());
        }

        drop(stopped);
    }

    pub fn tracked_count(&self) -> usize {
        self.inner.tracked.lock().len()
    }

    pub fn is_tracking(&self, hash: &str) -> bool {
        self.inner.tracked.lock().contains_key(hash)
    }
}

impl Inner {
    /// First report wins, later ones are dropped
    fn settle(&self, outcome: &Arc<Outcome>, status: TxStatus, detector: Detector) {
        if outcome.status.set(status).is_err() {
            debug!("{} already settled, ignoring {status} from {detector}", outcome.hash);
            return;
        }

        info!("transaction {} {status}, reported by {detector}", outcome.hash);

        match &outcome.network {
            Some(network) => self.history.update_status_on(network, &outcome.hash, status),
            None => self.history.update_status(&outcome.hash, status),
        };

        // only remove our own entry, the hash may have been re-tracked after a stop
        let finished = {
            let mut tracked = self.tracked.lock();
            match tracked.get(&outcome.hash) {
                Some(entry) if Arc::ptr_eq(&entry.outcome, outcome) => {
                    tracked.remove(&outcome.hash)
                }
                _ => None,
            }
        };

        // aborts the sibling detector
        drop(finished);
    }
}

async fn event_detector(inner: Weak<Inner>, client: Arc<dyn ChainClient>, outcome: Arc<Outcome>) {
    let status = match client.wait_for_transaction(&outcome.hash, TX_CONFIRMATIONS).await {
        Ok(receipt) => receipt.tx_status(),
        Err(error) => {
            warn!("waiting for {} failed, marking it failed: {error}", outcome.hash);
            TxStatus::Failed
        }
    };

    if let Some(inner) = inner.upgrade() {
        inner.settle(&outcome, status, Detector::Event);
    }
}

async fn foreground_detector(
    inner: Weak<Inner>,
    client: Arc<dyn ChainClient>,
    outcome: Arc<Outcome>,
    mut visibility: watch::Receiver<Visibility>,
) {
    loop {
        if outcome.is_settled() {
            return;
        }

        match client.get_transaction_receipt(&outcome.hash).await {
            Ok(Some(receipt)) => {
                if let Some(inner) = inner.upgrade() {
                    inner.settle(&outcome, receipt.tx_status(), Detector::Foreground);
                }

                return;
            }
            Ok(None) => debug!("{} not mined yet", outcome.hash),
            Err(error) => {
                warn!("unable to check {}, trying again next foreground: {error}", outcome.hash)
            }
        }

        if !next_foreground(&mut visibility).await {
            // lifecycle is gone, leave it to the event detector
            std::future::pending::<()>().await;
        }
    }
}

/// Wait for the next move back to the foreground, false once the lifecycle is dropped
async fn next_foreground(visibility: &mut watch::Receiver<Visibility>) -> bool {
    loop {
        if visibility.changed().await.is_err() {
            return false;
        }

        if *visibility.borrow_and_update() == Visibility::Foreground {
            return true;
        }
    }
}
