//! Test doubles shared by the unit tests

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use num_bigint::BigUint;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};

use nevm_device::{KeychainAccess, KeychainError};
use nevm_types::{NetworkInfo, TxRecord, TxStatus};

use crate::rpc::{
    ChainClient, ConnectionFactory, RpcError, TxReceipt,
    erc20::{self, abi},
};

type Waiter = oneshot::Receiver<Result<TxReceipt, RpcError>>;

/// Scriptable chain, unknown balances are zero and unknown receipts are not mined
#[derive(Debug)]
pub struct MockChainClient {
    balances: Mutex<HashMap<String, Result<BigUint, RpcError>>>,
    token_balances: Mutex<HashMap<(String, String), Result<BigUint, RpcError>>>,
    token_metadata: Mutex<HashMap<String, (String, String, u8)>>,
    receipts: Mutex<HashMap<String, Result<Option<TxReceipt>, RpcError>>>,
    waiters: Mutex<HashMap<String, Waiter>>,
    send_result: Mutex<Option<Result<String, RpcError>>>,
    send_gate: Mutex<Option<oneshot::Receiver<()>>>,
    sent: Mutex<Vec<Vec<u8>>>,
    blocks: broadcast::Sender<u64>,
    chain_id: Mutex<Result<u64, RpcError>>,
    polling_interval: Mutex<Duration>,
    balance_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
    wait_calls: AtomicUsize,
}

fn lower(value: &str) -> String {
    value.to_ascii_lowercase()
}

impl MockChainClient {
    pub fn new() -> Self {
        let (blocks, _) = broadcast::channel(64);

        Self {
            balances: Mutex::default(),
            token_balances: Mutex::default(),
            token_metadata: Mutex::default(),
            receipts: Mutex::default(),
            waiters: Mutex::default(),
            send_result: Mutex::default(),
            send_gate: Mutex::default(),
            sent: Mutex::default(),
            blocks,
            chain_id: Mutex::new(Ok(57)),
            polling_interval: Mutex::new(Duration::from_secs(4)),
            balance_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_balance(&self, address: &str, wei: u64) {
        self.balances.lock().insert(lower(address), Ok(BigUint::from(wei)));
    }

    pub fn fail_balance(&self, address: &str) {
        let error = RpcError::Transport("balance unavailable".into());
        self.balances.lock().insert(lower(address), Err(error));
    }

    pub fn set_token_balance(&self, token: &str, owner: &str, amount: u64) {
        let key = (lower(token), lower(owner));
        self.token_balances.lock().insert(key, Ok(BigUint::from(amount)));
    }

    pub fn fail_token_balance(&self, token: &str, owner: &str) {
        let key = (lower(token), lower(owner));
        let error = RpcError::Rpc { code: 3, message: "execution reverted".into() };
        self.token_balances.lock().insert(key, Err(error));
    }

    pub fn set_token_metadata(&self, token: &str, name: &str, symbol: &str, decimals: u8) {
        let metadata = (name.to_string(), symbol.to_string(), decimals);
        self.token_metadata.lock().insert(lower(token), metadata);
    }

    pub fn set_receipt(&self, hash: &str, receipt: Option<TxReceipt>) {
        self.receipts.lock().insert(hash.to_string(), Ok(receipt));
    }

    pub fn fail_receipt(&self, hash: &str, error: RpcError) {
        self.receipts.lock().insert(hash.to_string(), Err(error));
    }

    /// Control when `wait_for_transaction(hash)` resolves, without a waiter it never does
    pub fn waiter(&self, hash: &str) -> oneshot::Sender<Result<TxReceipt, RpcError>> {
        let (sender, receiver) = oneshot::channel();
        self.waiters.lock().insert(hash.to_string(), receiver);
        sender
    }

    pub fn set_chain_id(&self, chain_id: Result<u64, RpcError>) {
        *self.chain_id.lock() = chain_id;
    }

    pub fn set_send_result(&self, result: Result<String, RpcError>) {
        *self.send_result.lock() = Some(result);
    }

    /// Hold the next `send_raw_transaction` until the returned sender fires
    pub fn gate_send(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *self.send_gate.lock() = Some(receiver);
        sender
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    pub fn new_block(&self, number: u64) {
        let _ = self.blocks.send(number);
    }

    pub fn block_subscribers(&self) -> usize {
        self.blocks.receiver_count()
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChainClient {
    async fn get_balance(&self, address: &str) -> Result<BigUint, RpcError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balances.lock().get(&lower(address)).cloned().unwrap_or_else(|| Ok(BigUint::default()))
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TxReceipt>, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.receipts.lock().get(hash).cloned().unwrap_or(Ok(None))
    }

    async fn wait_for_transaction(
        &self,
        hash: &str,
        _confirmations: u64,
    ) -> Result<TxReceipt, RpcError> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);

        let waiter = self.waiters.lock().remove(hash);
        match waiter {
            Some(waiter) => match waiter.await {
                Ok(result) => result,
                Err(_) => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        Ok(1)
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        self.chain_id.lock().clone()
    }

    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        if let Some(owner) = erc20::balance_of_owner(data) {
            let key = (lower(to), format!("0x{}", hex::encode(owner)));
            let balance = self.token_balances.lock().get(&key).cloned();
            return balance.unwrap_or_else(|| Ok(BigUint::default())).map(abi::uint);
        }

        let Some((name, symbol, decimals)) = self.token_metadata.lock().get(&lower(to)).cloned()
        else {
            return Err(RpcError::Rpc { code: 3, message: "execution reverted".into() });
        };

        match <[u8; 4]>::try_from(data) {
            Ok(erc20::NAME) => Ok(abi::string(&name)),
            Ok(erc20::SYMBOL) => Ok(abi::string(&symbol)),
            Ok(erc20::DECIMALS) => Ok(abi::uint(decimals)),
            _ => Err(RpcError::InvalidResponse("unknown selector".into())),
        }
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, RpcError> {
        self.sent.lock().push(raw_tx.to_vec());

        let gate = self.send_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.send_result
            .lock()
            .clone()
            .unwrap_or_else(|| Ok(format!("0x{}", hex::encode(&raw_tx[..raw_tx.len().min(32)]))))
    }

    fn subscribe_blocks(&self) -> broadcast::Receiver<u64> {
        self.blocks.subscribe()
    }

    fn set_polling_interval(&self, interval: Duration) {
        *self.polling_interval.lock() = interval;
    }

    fn polling_interval(&self) -> Duration {
        *self.polling_interval.lock()
    }
}

/// Hands out the same mock for every network and remembers what it was asked for
#[derive(Debug)]
pub struct MockConnectionFactory {
    pub client: Arc<MockChainClient>,
    connected: Mutex<Vec<NetworkInfo>>,
}

impl MockConnectionFactory {
    pub fn new(client: Arc<MockChainClient>) -> Self {
        Self { client, connected: Mutex::default() }
    }

    pub fn connected(&self) -> Vec<NetworkInfo> {
        self.connected.lock().clone()
    }
}

impl ConnectionFactory for MockConnectionFactory {
    fn connect(&self, network: &NetworkInfo) -> Result<Arc<dyn ChainClient>, RpcError> {
        self.connected.lock().push(network.clone());
        Ok(self.client.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeychain {
    pub items: Mutex<HashMap<String, String>>,
}

impl KeychainAccess for MemoryKeychain {
    fn save(&self, key: String, value: String) -> Result<(), KeychainError> {
        self.items.lock().insert(key, value);
        Ok(())
    }

    fn get(&self, key: String) -> Option<String> {
        self.items.lock().get(&key).cloned()
    }

    fn delete(&self, key: String) -> Result<(), KeychainError> {
        self.items.lock().remove(&key);
        Ok(())
    }
}

pub fn receipt(hash: &str, status: Option<u64>) -> TxReceipt {
    TxReceipt { transaction_hash: hash.to_string(), block_number: 100, status }
}

pub fn pending_record(hash: &str) -> TxRecord {
    TxRecord {
        hash: hash.to_string(),
        from: "0x00000000000000000000000000000000000000aa".to_string(),
        to: "0x00000000000000000000000000000000000000bb".to_string(),
        amount: "1.0".to_string(),
        symbol: "SYS".to_string(),
        timestamp: 1_700_000_000_000,
        status: TxStatus::Pending,
    }
}

/// Poll `condition` until it holds, panics after a few seconds
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("condition not met in time");
}
