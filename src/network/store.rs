//! The selected network plus the user's custom networks and overrides

use std::collections::BTreeMap;

use nevm_types::{NetworkInfo, NetworkKey, NetworkOverride};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    app::reconcile::{Update, Updater},
    consts::DEFAULT_NETWORK_KEY,
    database::global_config::GlobalConfigTable,
};

use super::{NetworkError, default_network, is_predefined, predefined_networks, resolve};

type Result<T, E = NetworkError> = std::result::Result<T, E>;

/// Everything about networks the user changed, saved as a single document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub custom_networks: BTreeMap<NetworkKey, NetworkInfo>,

    #[serde(default)]
    pub overrides: BTreeMap<NetworkKey, NetworkOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionState {
    selected: NetworkKey,
    config: NetworkConfig,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self { selected: NetworkKey::from(DEFAULT_NETWORK_KEY), config: NetworkConfig::default() }
    }
}

impl SelectionState {
    fn resolve(&self, key: &str) -> Result<NetworkInfo> {
        resolve(key, &self.config.custom_networks, &self.config.overrides)
    }

    /// Effective predefined networks first, then custom ones in key order
    fn all_networks(&self) -> Vec<NetworkInfo> {
        let predefined = predefined_networks().map(|info| {
            match self.config.overrides.get(info.key.as_str()) {
                Some(patch) => patch.apply_to(info),
                None => info,
            }
        });

        let custom = self.config.custom_networks.keys().filter_map(|key| self.resolve(key).ok());

        predefined.chain(custom).collect()
    }

    /// Key of the network already using `chain_id`, ignoring `except`
    ///
    /// Compared against the definitions of the networks, overrides do not free up a chain id
    fn chain_id_owner(&self, chain_id: u64, except: Option<&str>) -> Option<String> {
        let custom = self.config.custom_networks.values().cloned();

        predefined_networks()
            .chain(custom)
            .filter(|info| Some(info.key.as_str()) != except)
            .find(|info| info.chain_id == chain_id)
            .map(|info| info.key)
    }

    fn ensure_chain_id_free(&self, chain_id: u64, except: Option<&str>) -> Result<()> {
        match self.chain_id_owner(chain_id, except) {
            Some(existing) => Err(NetworkError::DuplicateChainId { chain_id, existing }),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct NetworkStore {
    state: RwLock<SelectionState>,
    table: GlobalConfigTable,
    updater: Updater,
    ready: watch::Sender<bool>,
}

impl NetworkStore {
    pub fn new(table: GlobalConfigTable, updater: Updater) -> Self {
        let (ready, _) = watch::channel(false);

        Self { state: RwLock::new(SelectionState::default()), table, updater, ready }
    }

    /// Read the selection and network config from disk, flips `ready` the first time
    ///
    /// Unreadable entries are logged and replaced by the defaults
    pub fn load(&self) {
        let selected = self
            .table
            .selected_network()
            .inspect_err(|error| error!("unable to read selected network: {error}"))
            .ok()
            .flatten()
            .unwrap_or_else(|| NetworkKey::from(DEFAULT_NETWORK_KEY));

        let config = self
            .table
            .network_config()
            .inspect_err(|error| error!("unable to read network config: {error}"))
            .ok()
            .flatten()
            .unwrap_or_default();

        debug!(
            "loaded network config, selected: {selected}, custom: {}, overrides: {}",
            config.custom_networks.len(),
            config.overrides.len()
        );

        *self.state.write() = SelectionState { selected, config };

        let became_ready = self.ready.send_if_modified(|ready| !std::mem::replace(ready, true));
        if became_ready {
            info!("network store ready");
            self.updater.send_update(Update::NetworksReady);
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once [`NetworkStore::load`] has run
    pub async fn wait_ready(&self) {
        let mut receiver = self.ready.subscribe();

        // the sender lives as long as self, so this only returns once ready
        let _ = receiver.wait_for(|ready| *ready).await;
    }

    // MARK: reads

    pub fn selected_key(&self) -> NetworkKey {
        self.state.read().selected.clone()
    }

    /// The selected network with its override applied
    pub fn selected_info(&self) -> Result<NetworkInfo> {
        let state = self.state.read();
        state.resolve(&state.selected)
    }

    /// Like [`NetworkStore::selected_info`] but never fails, for display
    pub fn selected_info_or_default(&self) -> NetworkInfo {
        self.selected_info().unwrap_or_else(|error| {
            warn!("{error}, falling back to the default network");
            default_network()
        })
    }

    pub fn info(&self, key: &str) -> Result<NetworkInfo> {
        self.state.read().resolve(key)
    }

    pub fn all_networks(&self) -> Vec<NetworkInfo> {
        self.state.read().all_networks()
    }

    pub fn custom_networks(&self) -> Vec<NetworkInfo> {
        self.state.read().config.custom_networks.values().cloned().collect()
    }

    pub fn override_for(&self, key: &str) -> Option<NetworkOverride> {
        self.state.read().config.overrides.get(key).cloned()
    }

    // MARK: commands

    /// Select a network, the key is not checked, an unknown key only fails on read
    pub fn select(&self, key: NetworkKey) -> Result<()> {
        let mut state = self.state.write();
        debug!("selecting network {key}, previous: {}", state.selected);

        state.selected = key;
        self.persist(&state)
    }

    pub fn add_custom(&self, info: NetworkInfo) -> Result<()> {
        let mut state = self.state.write();

        let key = info.network_key();
        if is_predefined(&key) || state.config.custom_networks.contains_key(&key) {
            return Err(NetworkError::DuplicateKey(key.to_string()));
        }

        state.ensure_chain_id_free(info.chain_id, None)?;
        super::validate_rpc_url(&info.rpc_url)?;

        info!("adding custom network {key} (chain id {})", info.chain_id);
        state.config.custom_networks.insert(key, info);

        self.persist_and_notify(&state)
    }

    /// Edit a custom network in place, blank fields in `patch` are left unchanged
    pub fn update_custom(&self, key: &str, patch: NetworkOverride) -> Result<()> {
        let mut state = self.state.write();

        let Some(existing) = state.config.custom_networks.get(key).cloned() else {
            return Err(NetworkError::UnknownNetwork(key.to_string()));
        };

        let patch = patch.without_blank_fields();
        if let Some(rpc_url) = &patch.rpc_url {
            super::validate_rpc_url(rpc_url)?;
        }

        let updated = patch.apply_to(existing);
        state.ensure_chain_id_free(updated.chain_id, Some(key))?;

        state.config.custom_networks.insert(updated.network_key(), updated);
        self.persist_and_notify(&state)
    }

    /// Remove a custom network and its override, returns false if there was no such network
    ///
    /// Removing the selected network moves the selection back to the default one
    pub fn remove_custom(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write();

        if state.config.custom_networks.remove(key).is_none() {
            return Ok(false);
        }

        state.config.overrides.remove(key);

        if state.selected.as_str() == key {
            info!("removed the selected network {key}, selecting {DEFAULT_NETWORK_KEY}");
            state.selected = NetworkKey::from(DEFAULT_NETWORK_KEY);
        }

        self.persist_and_notify(&state)?;
        Ok(true)
    }

    /// Merge `patch` into the network's override, blank fields are ignored and an override
    /// left empty is dropped
    pub fn set_override(&self, key: &str, patch: NetworkOverride) -> Result<()> {
        let mut state = self.state.write();
        state.resolve(key)?;

        let patch = patch.without_blank_fields();
        if let Some(rpc_url) = &patch.rpc_url {
            super::validate_rpc_url(rpc_url)?;
        }

        let merged = state.config.overrides.remove(key).unwrap_or_default().merged_with(patch);

        if !merged.is_empty() {
            state.config.overrides.insert(NetworkKey::from(key), merged);
        }

        self.persist_and_notify(&state)
    }

    /// Drop every override of a network, back to its original definition
    pub fn clear_override(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.config.overrides.remove(key).is_none() {
            return Ok(());
        }

        self.persist_and_notify(&state)
    }

    fn persist_and_notify(&self, state: &SelectionState) -> Result<()> {
        let result = self.persist(state);
        self.updater.send_update(Update::NetworksChanged(state.all_networks()));
        result
    }

    /// Both keys are written even if the first fails, the first error is returned
    fn persist(&self, state: &SelectionState) -> Result<()> {
        let config = self
            .table
            .set_network_config(&state.config)
            .inspect_err(|error| error!("unable to save network config: {error}"));

        let selected = self
            .table
            .set_selected_network(&state.selected)
            .inspect_err(|error| error!("unable to save selected network: {error}"));

        Ok(config.and(selected)?)
    }
}
