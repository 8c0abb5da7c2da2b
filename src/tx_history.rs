//! Submitted transactions of the active network, most recent first

use nevm_types::{NetworkKey, TxRecord, TxStatus};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    app::reconcile::{Update, Updater},
    database::tx_history::TxHistoryTable,
};

#[derive(Debug, Default)]
struct HistoryState {
    network: Option<NetworkKey>,
    records: Vec<TxRecord>,
}

/// In memory history of one network bucket, every change is written through to the database
///
/// Persistence failures are logged, the in memory list stays the source of truth
#[derive(Debug)]
pub struct TxHistory {
    state: RwLock<HistoryState>,
    table: TxHistoryTable,
    updater: Updater,
}

impl TxHistory {
    pub fn new(table: TxHistoryTable, updater: Updater) -> Self {
        Self { state: RwLock::new(HistoryState::default()), table, updater }
    }

    /// Scope the history to `network`, loading its bucket
    pub fn init(&self, network: NetworkKey) {
        let records = self.table.get(&network).unwrap_or_else(|error| {
            error!("unable to load tx history for {network}: {error}");
            Vec::new()
        });

        debug!("loaded {} transactions for {network}", records.len());

        let mut state = self.state.write();
        *state = HistoryState { network: Some(network), records };
        self.notify(&state);
    }

    pub fn network(&self) -> Option<NetworkKey> {
        self.state.read().network.clone()
    }

    pub fn list(&self) -> Vec<TxRecord> {
        self.state.read().records.clone()
    }

    pub fn pending(&self) -> Vec<TxRecord> {
        self.state.read().records.iter().filter(|record| record.is_pending()).cloned().collect()
    }

    pub fn get(&self, hash: &str) -> Option<TxRecord> {
        self.state.read().records.iter().find(|record| record.hash == hash).cloned()
    }

    /// Put a new record at the head of the history
    ///
    /// A record whose hash is already in the history is rejected and `false` is returned
    pub fn add(&self, record: TxRecord) -> bool {
        let mut state = self.state.write();
        self.add_to_state(&mut state, record)
    }

    /// Same as [`TxHistory::add`], into the bucket of `network` whether or not it is active
    pub fn add_on(&self, network: &NetworkKey, record: TxRecord) -> bool {
        let mut state = self.state.write();

        if state.network.as_ref() == Some(network) {
            return self.add_to_state(&mut state, record);
        }

        // the lock is held so an `init` cannot load this bucket halfway through
        let Some(mut records) = self.load_bucket(network) else {
            return false;
        };

        if records.iter().any(|existing| existing.hash == record.hash) {
            warn!("transaction {} is already in the history of {network}, ignoring", record.hash);
            return false;
        }

        info!("adding transaction {} to {network}", record.hash);
        records.insert(0, record);
        self.save_bucket(network, records);

        true
    }

    /// Move a pending transaction to its final status, returns `true` if anything changed
    ///
    /// Unknown hashes, records that already have a final status and `Pending` as the new
    /// status are all ignored
    pub fn update_status(&self, hash: &str, status: TxStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }

        let mut state = self.state.write();
        self.update_in_state(&mut state, hash, status)
    }

    /// Same as [`TxHistory::update_status`], for a transaction that may belong to a network
    /// other than the active one
    pub fn update_status_on(&self, network: &NetworkKey, hash: &str, status: TxStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }

        let mut state = self.state.write();

        if state.network.as_ref() == Some(network) {
            return self.update_in_state(&mut state, hash, status);
        }

        let Some(mut records) = self.load_bucket(network) else {
            return false;
        };

        let Some(record) = records.iter_mut().find(|record| record.hash == hash) else {
            return false;
        };

        if record.status.is_terminal() {
            return false;
        }

        info!("transaction {hash} on {network} is {status}");
        record.status = status;
        self.save_bucket(network, records);

        true
    }

    /// Wipe the history of every network
    pub fn clear(&self) {
        if let Err(error) = self.table.clear_all() {
            error!("unable to clear tx history: {error}");
        }

        let mut state = self.state.write();
        state.records.clear();

        info!("cleared tx history");
        self.notify(&state);
    }

    fn add_to_state(&self, state: &mut HistoryState, record: TxRecord) -> bool {
        if state.records.iter().any(|existing| existing.hash == record.hash) {
            warn!("transaction {} is already in the history, ignoring", record.hash);
            return false;
        }

        info!("adding transaction {} ({})", record.hash, record.status);
        state.records.insert(0, record);

        self.persist(state);
        self.notify(state);

        true
    }

    fn update_in_state(&self, state: &mut HistoryState, hash: &str, status: TxStatus) -> bool {
        let Some(record) = state.records.iter_mut().find(|record| record.hash == hash) else {
            debug!("no transaction {hash} in the history, nothing to update");
            return false;
        };

        if record.status.is_terminal() {
            debug!("transaction {hash} is already {}, keeping it", record.status);
            return false;
        }

        info!("transaction {hash} is {status}");
        record.status = status;

        self.persist(state);
        self.notify(state);
        self.updater.send_update(Update::TxStatusChanged { hash: hash.to_string(), status });

        true
    }

    /// Bucket of an inactive network, `None` if it could not be read
    fn load_bucket(&self, network: &NetworkKey) -> Option<Vec<TxRecord>> {
        self.table
            .get(network)
            .inspect_err(|error| error!("unable to load tx history for {network}: {error}"))
            .ok()
    }

    fn save_bucket(&self, network: &NetworkKey, records: Vec<TxRecord>) {
        if let Err(error) = self.table.set(network, records) {
            error!("unable to save tx history for {network}: {error}");
        }
    }

    fn persist(&self, state: &HistoryState) {
        let Some(network) = &state.network else {
            warn!("tx history has no network yet, keeping changes in memory only");
            return;
        };

        if let Err(error) = self.table.set(network, state.records.clone()) {
            error!("unable to save tx history for {network}: {error}");
        }
    }

    fn notify(&self, state: &HistoryState) {
        self.updater.send_update(Update::TxHistoryChanged(state.records.clone()));
    }
}
