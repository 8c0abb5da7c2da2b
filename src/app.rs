//! The app core, owns every service and wires them together

pub mod reconcile;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tap::TapFallible as _;
use tracing::{debug, error, info, warn};

use nevm_device::{Keychain, KeychainAccess, KeychainError};
use nevm_types::{ImportedToken, NetworkInfo, NetworkKey, NetworkOverride, TxDraft, TxRecord};
use nevm_util::units::parse_units;

use crate::{
    balance_watcher::{BalanceUpdate, BalanceWatcher, OnBalanceUpdate, WatchHandle},
    database::{self, Database},
    lifecycle::{AppLifecycle, Visibility},
    mnemonic::{NumberOfBip39Words, parse_mnemonic},
    network::{NetworkError, store::NetworkStore},
    rpc::{self, ChainClient, ConnectionFactory, RpcConnectionFactory, RpcError, erc20},
    token_list::TokenList,
    transaction_watcher::TransactionWatcher,
    tx_history::TxHistory,
};

use reconcile::{AppStateReconcileMessage as AppMessage, FfiReconcile, Updater};

/// Amounts are validated against the native coin precision
const AMOUNT_DECIMALS: u8 = 18;

static APP: OnceCell<App> = OnceCell::new();

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// the node refused the transaction, the error is passed through untouched
    #[error("transaction was not submitted: {0}")]
    Submission(RpcError),

    #[error(transparent)]
    Database(#[from] database::Error),

    #[error(transparent)]
    Keychain(#[from] KeychainError),

    #[error("invalid recovery phrase: {0}")]
    InvalidMnemonic(String),

    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("node check failed: {0}")]
    NodeCheck(String),
}

type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug)]
pub struct App {
    networks: Arc<NetworkStore>,
    history: Arc<TxHistory>,
    lifecycle: Arc<AppLifecycle>,
    tx_watcher: TransactionWatcher,
    balance_watcher: BalanceWatcher,
    tokens: TokenList,
    keychain: Keychain,
    connections: Arc<dyn ConnectionFactory>,
    /// connection of the effective network, rebuilt when the network or its rpc url changes
    connection: Mutex<Option<(NetworkInfo, Arc<dyn ChainClient>)>>,
    updater: Updater,
    update_receiver: flume::Receiver<AppMessage>,
}

impl App {
    pub fn new(
        database: Database,
        keychain: Keychain,
        connections: Arc<dyn ConnectionFactory>,
    ) -> Self {
        let (updater, update_receiver) = Updater::channel();

        let networks = Arc::new(NetworkStore::new(database.global_config, updater.clone()));
        let history = Arc::new(TxHistory::new(database.tx_history, updater.clone()));
        let lifecycle = Arc::new(AppLifecycle::new());
        let tx_watcher = TransactionWatcher::new(history.clone(), lifecycle.clone());
        let tokens = TokenList::new(database.imported_tokens, updater.clone());

        Self {
            networks,
            history,
            lifecycle,
            tx_watcher,
            balance_watcher: BalanceWatcher::new(),
            tokens,
            keychain,
            connections,
            connection: Mutex::new(None),
            updater,
            update_receiver,
        }
    }

    /// Load the saved network config, then bring history and watchers up for the selected network
    pub async fn start(&self) -> Result<NetworkInfo> {
        let networks = self.networks.clone();
        nevm_tokio::unblock::run_blocking(move || networks.load()).await;
        self.networks.wait_ready().await;

        self.on_network_changed()
    }

    /// Re-scope everything network specific to the currently selected network
    fn on_network_changed(&self) -> Result<NetworkInfo> {
        self.tx_watcher.stop_all();
        self.balance_watcher.stop();

        let network = self.networks.selected_info_or_default();
        info!("active network is {} ({})", network.key, network.chain_id);

        self.history.init(network.network_key());
        self.updater.send_update(AppMessage::SelectedNetworkChanged(network.clone()));

        let client = self
            .connection_for(&network)
            .tap_err(|error| error!("unable to connect to {}: {error}", network.key))?;

        self.tx_watcher.resume(client);

        Ok(network)
    }

    /// Run the network change hook if `change` altered the effective selected network
    fn with_network_change<T>(&self, change: impl FnOnce() -> Result<T, NetworkError>) -> Result<T> {
        let before = self.current_network();
        let result = change();

        if self.current_network() != before {
            self.on_network_changed()?;
        }

        Ok(result?)
    }

    fn connection_for(&self, network: &NetworkInfo) -> Result<Arc<dyn ChainClient>, RpcError> {
        let mut connection = self.connection.lock();

        if let Some((info, client)) = connection.as_ref() {
            if info == network {
                return Ok(client.clone());
            }
        }

        debug!("connecting to {} at {}", network.key, network.rpc_url);
        let client = self.connections.connect(network)?;
        *connection = Some((network.clone(), client.clone()));

        Ok(client)
    }

    /// Connection for the current network
    pub fn client(&self) -> Result<Arc<dyn ChainClient>> {
        Ok(self.connection_for(&self.current_network())?)
    }

    // MARK: networks

    pub fn current_network(&self) -> NetworkInfo {
        self.networks.selected_info_or_default()
    }

    pub fn all_networks(&self) -> Vec<NetworkInfo> {
        self.networks.all_networks()
    }

    pub fn select_network(&self, key: NetworkKey) -> Result<NetworkInfo> {
        self.networks.select(key)?;
        self.on_network_changed()
    }

    pub fn add_custom_network(&self, network: NetworkInfo) -> Result<()> {
        Ok(self.networks.add_custom(network)?)
    }

    /// Try a network before saving it, returns the node's latest block
    pub async fn check_network(&self, network: &NetworkInfo) -> Result<u64> {
        let client = self.connections.connect(network)?;

        rpc::check_node(client.as_ref(), network)
            .await
            .map_err(|error| AppError::NodeCheck(format!("{error:#}")))
    }

    pub fn update_custom_network(&self, key: &str, patch: NetworkOverride) -> Result<()> {
        self.with_network_change(|| self.networks.update_custom(key, patch))
    }

    pub fn remove_custom_network(&self, key: &str) -> Result<bool> {
        self.with_network_change(|| self.networks.remove_custom(key))
    }

    pub fn set_network_override(&self, key: &str, patch: NetworkOverride) -> Result<()> {
        self.with_network_change(|| self.networks.set_override(key, patch))
    }

    pub fn clear_network_override(&self, key: &str) -> Result<()> {
        self.with_network_change(|| self.networks.clear_override(key))
    }

    // MARK: transactions

    /// Broadcast a signed transaction, then record and watch it
    pub async fn send_transaction(&self, draft: TxDraft, signed_raw_tx: Vec<u8>) -> Result<TxRecord> {
        parse_units(&draft.amount, AMOUNT_DECIMALS).map_err(|error| AppError::InvalidAmount {
            amount: draft.amount.clone(),
            reason: error.to_string(),
        })?;

        // the network may change while the node answers, the record belongs to this one
        let network = self.current_network();
        let network_key = network.network_key();
        let client = self.connection_for(&network)?;

        let hash = client
            .send_raw_transaction(&signed_raw_tx)
            .await
            .tap_err(|error| warn!("transaction rejected by node: {error}"))
            .map_err(AppError::Submission)?;

        let timestamp = jiff::Timestamp::now().as_millisecond();
        let record = TxRecord::pending(hash, draft, timestamp);

        self.history.add_on(&network_key, record.clone());

        // otherwise it stays pending and is resumed when its network is selected again
        if self.history.network().as_ref() == Some(&network_key) {
            self.tx_watcher.track_on(client, network_key, &record.hash);
        } else {
            info!("network changed while sending {}, not watching it for now", record.hash);
        }

        Ok(record)
    }

    pub fn tx_history(&self) -> Vec<TxRecord> {
        self.history.list()
    }

    pub fn explorer_tx_url(&self, hash: &str) -> Option<String> {
        self.current_network().explorer_tx_url(hash)
    }

    // MARK: balances and tokens

    /// Watch `address` on the current network, with the tokens imported on it
    pub fn watch_balance(&self, address: String, on_update: OnBalanceUpdate) -> Result<WatchHandle> {
        let network = self.current_network();
        let client = self.connection_for(&network)?;
        let tokens = self.tokens.tokens(&network.network_key());

        Ok(self.balance_watcher.watch(client, address, tokens, on_update, None))
    }

    pub fn stop_balance_watch(&self) {
        self.balance_watcher.stop();
    }

    /// Read the token's metadata from its contract and add it to the current network
    pub async fn import_token(&self, address: &str) -> Result<ImportedToken> {
        let network = self.current_network().network_key();
        let client = self.client()?;

        let token = erc20::token_metadata(client.as_ref(), address).await?;
        if !self.tokens.add(&network, token.clone())? {
            debug!("token {address} was already imported on {network}");
        }

        Ok(token)
    }

    pub fn imported_tokens(&self) -> Vec<ImportedToken> {
        self.tokens.tokens(&self.current_network().network_key())
    }

    pub fn remove_token(&self, address: &str) -> Result<bool> {
        Ok(self.tokens.remove(&self.current_network().network_key(), address)?)
    }

    // MARK: lifecycle

    pub fn set_visibility(&self, visibility: Visibility) {
        self.lifecycle.set(visibility);
    }

    // MARK: wallet secrets

    /// Generate a new seed phrase and keep it in the keychain, returns its words
    pub fn create_wallet(&self, words: NumberOfBip39Words) -> Result<Vec<String>> {
        let mnemonic = words
            .generate_mnemonic()
            .map_err(|error| AppError::InvalidMnemonic(error.to_string()))?;

        self.keychain.save_mnemonic(&mnemonic)?;
        Ok(mnemonic.words().map(ToString::to_string).collect())
    }

    pub fn import_wallet(&self, phrase: &str) -> Result<()> {
        let mnemonic =
            parse_mnemonic(phrase).map_err(|error| AppError::InvalidMnemonic(error.to_string()))?;

        Ok(self.keychain.save_mnemonic(&mnemonic)?)
    }

    pub fn set_wallet_password(&self, password: &str) -> Result<()> {
        Ok(self.keychain.save_password(password)?)
    }

    pub fn has_wallet(&self) -> bool {
        self.keychain.has_wallet()
    }

    /// Forget the wallet: secrets, every network's history and anything being watched
    pub fn delete_wallet(&self) -> Result<()> {
        self.keychain.delete_all()?;

        self.tx_watcher.stop_all();
        self.balance_watcher.stop();
        self.history.clear();

        info!("wallet deleted");
        Ok(())
    }

    pub fn listen_for_updates(&self, updater: Box<dyn FfiReconcile>) {
        let update_receiver = self.update_receiver.clone();

        std::thread::spawn(move || {
            while let Ok(message) = update_receiver.recv() {
                updater.reconcile(message);
            }
        });
    }
}

/// Native side listener for balance updates
#[uniffi::export(callback_interface)]
pub trait BalanceListener: Send + Sync + 'static {
    fn on_balance(&self, update: BalanceUpdate);
}

/// Representation of our app over FFI. Essentially a wrapper of [`App`].
#[derive(Debug, uniffi::Object)]
pub struct FfiApp {
    app: &'static App,
}

#[uniffi::export(async_runtime = "tokio")]
impl FfiApp {
    /// Set up the global app on first call, later calls share it
    #[uniffi::constructor]
    pub fn new(keychain: Box<dyn KeychainAccess>) -> Result<Arc<Self>> {
        // one time init
        crate::logging::init();

        let app = APP.get_or_try_init(|| {
            let database = Database::open_default()?;
            let keychain = Keychain::new(keychain);
            let connections = Arc::new(RpcConnectionFactory);

            Ok::<_, AppError>(App::new(database, keychain, connections))
        })?;

        Ok(Arc::new(Self { app }))
    }

    pub async fn start(&self) -> Result<NetworkInfo> {
        nevm_tokio::init();
        self.app.start().await
    }

    pub fn listen_for_updates(&self, updater: Box<dyn FfiReconcile>) {
        self.app.listen_for_updates(updater);
    }

    // MARK: networks

    pub fn current_network(&self) -> NetworkInfo {
        self.app.current_network()
    }

    pub fn all_networks(&self) -> Vec<NetworkInfo> {
        self.app.all_networks()
    }

    pub fn select_network(&self, key: NetworkKey) -> Result<NetworkInfo> {
        self.app.select_network(key)
    }

    pub fn add_custom_network(&self, network: NetworkInfo) -> Result<()> {
        self.app.add_custom_network(network)
    }

    pub async fn check_network(&self, network: NetworkInfo) -> Result<u64> {
        self.app.check_network(&network).await
    }

    pub fn update_custom_network(&self, key: String, patch: NetworkOverride) -> Result<()> {
        self.app.update_custom_network(&key, patch)
    }

    pub fn remove_custom_network(&self, key: String) -> Result<bool> {
        self.app.remove_custom_network(&key)
    }

    pub fn set_network_override(&self, key: String, patch: NetworkOverride) -> Result<()> {
        self.app.set_network_override(&key, patch)
    }

    pub fn clear_network_override(&self, key: String) -> Result<()> {
        self.app.clear_network_override(&key)
    }

    // MARK: transactions

    pub async fn send_transaction(
        &self,
        draft: TxDraft,
        signed_raw_tx: Vec<u8>,
    ) -> Result<TxRecord> {
        self.app.send_transaction(draft, signed_raw_tx).await
    }

    pub fn tx_history(&self) -> Vec<TxRecord> {
        self.app.tx_history()
    }

    pub fn explorer_tx_url(&self, hash: String) -> Option<String> {
        self.app.explorer_tx_url(&hash)
    }

    // MARK: balances and tokens

    pub fn watch_balance(&self, address: String, listener: Box<dyn BalanceListener>) -> Result<()> {
        let listener: Arc<dyn BalanceListener> = Arc::from(listener);
        let on_update: OnBalanceUpdate = Arc::new(move |update| listener.on_balance(update));

        self.app.watch_balance(address, on_update)?;
        Ok(())
    }

    pub fn stop_balance_watch(&self) {
        self.app.stop_balance_watch();
    }

    pub async fn import_token(&self, address: String) -> Result<ImportedToken> {
        self.app.import_token(&address).await
    }

    pub fn imported_tokens(&self) -> Vec<ImportedToken> {
        self.app.imported_tokens()
    }

    pub fn remove_token(&self, address: String) -> Result<bool> {
        self.app.remove_token(&address)
    }

    // MARK: lifecycle

    pub fn app_foregrounded(&self) {
        self.app.set_visibility(Visibility::Foreground);
    }

    pub fn app_backgrounded(&self) {
        self.app.set_visibility(Visibility::Background);
    }

    // MARK: wallet

    #[uniffi::method(default(words = None))]
    pub fn create_wallet(&self, words: Option<NumberOfBip39Words>) -> Result<Vec<String>> {
        self.app.create_wallet(words.unwrap_or(NumberOfBip39Words::Twelve))
    }

    pub fn import_wallet(&self, phrase: String) -> Result<()> {
        self.app.import_wallet(&phrase)
    }

    pub fn set_wallet_password(&self, password: String) -> Result<()> {
        self.app.set_wallet_password(&password)
    }

    pub fn has_wallet(&self) -> bool {
        self.app.has_wallet()
    }

    /// DANGER: removes the wallet's secrets and all transaction history on this device
    pub fn delete_wallet(&self) -> Result<()> {
        self.app.delete_wallet()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use nevm_types::TxStatus;

    use super::*;
    use crate::{
        database::test_db::TestDatabase,
        network::default_network,
        test_support::{
            MemoryKeychain, MockChainClient, MockConnectionFactory, eventually, pending_record,
            receipt,
        },
    };

    const ALICE: &str = "0x00000000000000000000000000000000000000aa";

    struct Harness {
        app: App,
        client: Arc<MockChainClient>,
        factory: Arc<MockConnectionFactory>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let TestDatabase { db, dir } = TestDatabase::new();

        let client = Arc::new(MockChainClient::new());
        let factory = Arc::new(MockConnectionFactory::new(client.clone()));
        let keychain = Keychain::new(Box::new(MemoryKeychain::default()));

        let app = App::new(db, keychain, factory.clone());
        Harness { app, client, factory, _dir: dir }
    }

    fn draft() -> TxDraft {
        TxDraft {
            from: ALICE.into(),
            to: "0x00000000000000000000000000000000000000bb".into(),
            amount: "0.25".into(),
            symbol: "SYS".into(),
        }
    }

    fn devnet() -> NetworkInfo {
        NetworkInfo {
            key: "devnet".into(),
            label: "Devnet".into(),
            chain_id: 31337,
            native_symbol: "DEV".into(),
            rpc_url: "http://localhost:8545".into(),
            block_explorer: None,
        }
    }

    #[tokio::test]
    async fn test_start_uses_default_network() {
        let h = harness();

        let network = h.app.start().await.unwrap();
        assert_eq!(network, default_network());
        assert_eq!(h.app.history.network(), Some(NetworkKey::from("syscoin")));
        assert_eq!(h.factory.connected(), vec![default_network()]);

        // the cached connection is reused
        h.app.client().unwrap();
        assert_eq!(h.factory.connected().len(), 1);
    }

    #[tokio::test]
    async fn test_send_transaction_records_and_tracks() {
        let h = harness();
        h.app.start().await.unwrap();
        h.client.set_send_result(Ok("0xfeed".into()));

        let waiter = h.client.waiter("0xfeed");
        h.app.set_visibility(Visibility::Background);

        let record = h.app.send_transaction(draft(), vec![0xf8, 0x6b]).await.unwrap();
        assert_eq!(record.hash, "0xfeed");
        assert_eq!(record.status, TxStatus::Pending);
        assert!(record.timestamp > 0);
        assert_eq!(h.client.sent(), vec![vec![0xf8, 0x6b]]);
        assert_eq!(h.app.tx_history(), vec![record.clone()]);
        assert!(h.app.tx_watcher.is_tracking("0xfeed"));

        // mined while in the background, picked up on the way back
        eventually(|| h.client.receipt_calls() >= 1).await;
        h.client.set_receipt("0xfeed", Some(receipt("0xfeed", Some(1))));
        h.app.set_visibility(Visibility::Foreground);

        eventually(|| h.app.tx_history()[0].status == TxStatus::Confirmed).await;

        // a rejection arriving afterwards changes nothing
        let _ = waiter.send(Err(RpcError::Transport("gone".into())));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.app.tx_history()[0].status, TxStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_send_keeps_the_network_it_was_sent_on() {
        let h = harness();
        h.app.start().await.unwrap();
        h.client.set_send_result(Ok("0xsyscoin_tx".into()));

        let gate = h.client.gate_send();
        let switch_while_sending = async {
            eventually(|| h.client.sent().len() == 1).await;
            h.app.select_network(NetworkKey::from("rollux")).unwrap();
            gate.send(()).unwrap();
        };

        let (record, ()) =
            tokio::join!(h.app.send_transaction(draft(), vec![0xf8]), switch_while_sending);
        let record = record.unwrap();

        assert_eq!(h.app.history.network(), Some(NetworkKey::from("rollux")));
        assert!(h.app.tx_history().is_empty());
        assert!(!h.app.tx_watcher.is_tracking("0xsyscoin_tx"));

        // back on syscoin it is there and watched again
        h.app.select_network(NetworkKey::from("syscoin")).unwrap();
        assert_eq!(h.app.tx_history(), vec![record]);
        assert!(h.app.tx_watcher.is_tracking("0xsyscoin_tx"));
    }

    #[tokio::test]
    async fn test_submission_errors_propagate() {
        let h = harness();
        h.app.start().await.unwrap();

        let rejection = RpcError::Rpc { code: -32000, message: "insufficient funds".into() };
        h.client.set_send_result(Err(rejection.clone()));

        let result = h.app.send_transaction(draft(), vec![1]).await;
        assert_eq!(result, Err(AppError::Submission(rejection)));
        assert!(h.app.tx_history().is_empty());
        assert_eq!(h.app.tx_watcher.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_amount_is_not_sent() {
        let h = harness();
        h.app.start().await.unwrap();

        let draft = TxDraft { amount: "1.2.3".into(), ..draft() };
        let result = h.app.send_transaction(draft, vec![1]).await;

        assert!(matches!(result, Err(AppError::InvalidAmount { .. })));
        assert!(h.client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_select_network_rescopes_history_and_resumes() {
        let h = harness();

        h.app.history.init(NetworkKey::from("rollux"));
        h.app.history.add(pending_record("0xr1"));
        h.app.history.add(pending_record("0xr2"));
        h.app.history.update_status("0xr2", TxStatus::Failed);

        h.app.start().await.unwrap();
        assert!(h.app.tx_history().is_empty());
        assert_eq!(h.app.tx_watcher.tracked_count(), 0);

        let network = h.app.select_network(NetworkKey::from("rollux")).unwrap();
        assert_eq!(network.chain_id, 570);
        assert_eq!(h.app.tx_history().len(), 2);
        assert!(h.app.tx_watcher.is_tracking("0xr1"));
        assert_eq!(h.app.tx_watcher.tracked_count(), 1);

        let connected = h.factory.connected();
        assert_eq!(connected.last().map(|info| info.key.as_str()), Some("rollux"));

        // switching away stops the watchers of the previous network
        h.app.select_network(NetworkKey::from("syscoin")).unwrap();
        assert_eq!(h.app.tx_watcher.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_override_of_selected_network_rebuilds_connection() {
        let h = harness();
        h.app.start().await.unwrap();

        let other = NetworkOverride { rpc_url: Some("https://other.node".into()), ..Default::default() };
        h.app.set_network_override("polygon", other).unwrap();
        assert_eq!(h.factory.connected().len(), 1);

        let mine = NetworkOverride { rpc_url: Some("https://my.node".into()), ..Default::default() };
        h.app.set_network_override("syscoin", mine).unwrap();

        let connected = h.factory.connected();
        assert_eq!(connected.len(), 2);
        assert_eq!(connected[1].rpc_url, "https://my.node");
        assert_eq!(h.app.current_network().rpc_url, "https://my.node");

        h.app.clear_network_override("syscoin").unwrap();
        assert_eq!(h.app.current_network(), default_network());
    }

    #[tokio::test]
    async fn test_removing_selected_custom_network_falls_back() {
        let h = harness();
        h.app.start().await.unwrap();

        h.app.add_custom_network(devnet()).unwrap();
        h.app.select_network(NetworkKey::from("devnet")).unwrap();
        assert_eq!(h.app.history.network(), Some(NetworkKey::from("devnet")));

        assert!(h.app.remove_custom_network("devnet").unwrap());
        assert_eq!(h.app.current_network(), default_network());
        assert_eq!(h.app.history.network(), Some(NetworkKey::from("syscoin")));
    }

    #[tokio::test]
    async fn test_check_network() {
        let h = harness();
        h.app.start().await.unwrap();

        h.client.set_chain_id(Ok(31337));
        assert_eq!(h.app.check_network(&devnet()).await, Ok(1));

        h.client.set_chain_id(Ok(1));
        let mismatch = h.app.check_network(&devnet()).await;
        assert!(matches!(mismatch, Err(AppError::NodeCheck(message)) if message.contains("31337")));

        h.client.set_chain_id(Err(RpcError::Transport("connection refused".into())));
        let Err(AppError::NodeCheck(message)) = h.app.check_network(&devnet()).await else {
            panic!("expected a node check error");
        };
        assert!(message.contains("unable to reach node"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_import_token_reads_contract() {
        let h = harness();
        h.app.start().await.unwrap();

        let address = "0x00000000000000000000000000000000000000c1";
        h.client.set_token_metadata(address, "Wrapped SYS", "WSYS", 18);

        let token = h.app.import_token(address).await.unwrap();
        assert_eq!(token.symbol, "WSYS");
        assert_eq!(token.name, "Wrapped SYS");
        assert_eq!(token.decimals, 18);

        // importing twice keeps one entry
        h.app.import_token(address).await.unwrap();
        assert_eq!(h.app.imported_tokens(), vec![token]);

        let unknown = h.app.import_token("0x00000000000000000000000000000000000000c9").await;
        assert!(matches!(unknown, Err(AppError::Rpc(_))));

        assert!(h.app.remove_token(address).unwrap());
        assert!(h.app.imported_tokens().is_empty());
    }

    #[tokio::test]
    async fn test_watch_balance_uses_current_network_tokens() {
        let h = harness();
        h.app.start().await.unwrap();

        let token = "0x00000000000000000000000000000000000000c1";
        h.client.set_token_metadata(token, "USD Coin", "USDC", 6);
        h.client.set_token_balance(token, ALICE, 1_000_000);
        h.client.set_balance(ALICE, 3_000_000_000_000_000_000);
        h.app.import_token(token).await.unwrap();

        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let handle = h
            .app
            .watch_balance(ALICE.into(), Arc::new(move |update| sink.lock().push(update)))
            .unwrap();

        eventually(|| !updates.lock().is_empty()).await;
        let update = updates.lock()[0].clone();
        assert_eq!(update.native.as_deref(), Some("3.0"));
        assert_eq!(update.tokens.get(token).map(String::as_str), Some("1.0"));

        // changing network stops the watch
        h.app.select_network(NetworkKey::from("rollux")).unwrap();
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_wallet_secrets() {
        let h = harness();
        h.app.start().await.unwrap();
        assert!(!h.app.has_wallet());

        let words = h.app.create_wallet(NumberOfBip39Words::Twelve).unwrap();
        assert_eq!(words.len(), 12);
        assert!(h.app.has_wallet());

        assert!(matches!(h.app.import_wallet("not a phrase"), Err(AppError::InvalidMnemonic(_))));

        h.app.set_wallet_password("hunter2").unwrap();
        h.client.set_send_result(Ok("0x1".into()));
        h.app.send_transaction(draft(), vec![1]).await.unwrap();

        h.app.delete_wallet().unwrap();
        assert!(!h.app.has_wallet());
        assert!(h.app.tx_history().is_empty());
        assert_eq!(h.app.tx_watcher.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_updates_reach_the_frontend() {
        let h = harness();
        h.app.start().await.unwrap();

        let messages = h.app.update_receiver.drain().collect::<Vec<_>>();
        assert!(messages.contains(&AppMessage::NetworksReady));
        assert!(messages.contains(&AppMessage::SelectedNetworkChanged(default_network())));
    }
}
