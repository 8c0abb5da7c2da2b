//! Minimal JSON-RPC client over reqwest

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use num_bigint::BigUint;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use url::Url;

use nevm_util::strip_hex_prefix;

use super::{ChainClient, RpcError, TxReceipt, parse_address};
use crate::consts::DEFAULT_RPC_POLL_INTERVAL;

type Result<T, E = RpcError> = std::result::Result<T, E>;

/// Cheap to clone, clones share the http client and the block poller
#[derive(Debug, Clone)]
pub struct RpcClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    url: Url,
    http: reqwest::Client,
    next_id: AtomicU64,
    polling_interval_ms: AtomicU64,
    blocks: broadcast::Sender<u64>,
    /// set while a poller task is alive
    poller_running: Mutex<bool>,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        let (blocks, _) = broadcast::channel(16);

        let inner = Inner {
            url,
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            polling_interval_ms: AtomicU64::new(DEFAULT_RPC_POLL_INTERVAL.as_millis() as u64),
            blocks,
            poller_running: Mutex::new(false),
        };

        Self { inner: Arc::new(inner) }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request { jsonrpc: "2.0", id, method, params };
        trace!("rpc request {id} {method}");

        let response = self
            .inner
            .http
            .post(self.inner.url.clone())
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| RpcError::Transport(error.to_string()))?;

        let response: Response = response
            .json()
            .await
            .map_err(|error| RpcError::InvalidResponse(format!("{method}: {error}")))?;

        decode_response(method, response)
    }

    fn start_block_poller(&self) {
        let mut running = self.inner.poller_running.lock();
        if *running {
            return;
        }

        *running = true;
        debug!("starting block poller for {}", self.inner.url);
        nevm_tokio::task::spawn(poll_blocks(Arc::downgrade(&self.inner)));
    }
}

/// Emits every new block number, exits once the client is dropped or nobody is subscribed
async fn poll_blocks(inner: Weak<Inner>) {
    let mut last_seen: Option<u64> = None;

    loop {
        let Some(inner) = inner.upgrade() else { return };

        {
            let mut running = inner.poller_running.lock();
            if inner.blocks.receiver_count() == 0 {
                debug!("no block subscribers left, stopping poller for {}", inner.url);
                *running = false;
                return;
            }
        }

        let client = RpcClient { inner };
        match client.block_number().await {
            Ok(block) if Some(block) > last_seen => {
                last_seen = Some(block);
                let _ = client.inner.blocks.send(block);
            }
            Ok(_) => {}
            Err(error) => warn!("unable to poll block number: {error}"),
        }

        let interval = client.polling_interval();
        drop(client);

        tokio::time::sleep(interval).await;
    }
}

#[async_trait::async_trait]
impl ChainClient for RpcClient {
    async fn get_balance(&self, address: &str) -> Result<BigUint> {
        parse_address(address)?;

        let balance: String = self.request("eth_getBalance", json!([address, "latest"])).await?;
        parse_big_quantity(&balance)
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TxReceipt>> {
        let receipt: Option<RawReceipt> =
            self.request("eth_getTransactionReceipt", json!([hash])).await?;

        receipt.map(receipt_from_raw).transpose().map(Option::flatten)
    }

    async fn block_number(&self) -> Result<u64> {
        let block: String = self.request("eth_blockNumber", json!([])).await?;
        parse_quantity(&block)
    }

    async fn chain_id(&self) -> Result<u64> {
        let chain_id: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&chain_id)
    }

    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>> {
        parse_address(to)?;

        let call = json!({ "to": to, "data": format!("0x{}", hex::encode(data)) });
        let result: String = self.request("eth_call", json!([call, "latest"])).await?;

        nevm_util::decode_prefixed_hex(&result)
            .map_err(|error| RpcError::InvalidResponse(format!("eth_call: {error}")))
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String> {
        let raw_tx = format!("0x{}", hex::encode(raw_tx));
        self.request("eth_sendRawTransaction", json!([raw_tx])).await
    }

    fn subscribe_blocks(&self) -> broadcast::Receiver<u64> {
        let receiver = self.inner.blocks.subscribe();
        self.start_block_poller();
        receiver
    }

    fn set_polling_interval(&self, interval: Duration) {
        let millis = interval.as_millis().max(1) as u64;
        self.inner.polling_interval_ms.store(millis, Ordering::Relaxed);
    }

    fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.inner.polling_interval_ms.load(Ordering::Relaxed))
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, response: Response) -> Result<T> {
    if let Some(ErrorObject { code, message }) = response.error {
        return Err(RpcError::Rpc { code, message });
    }

    let result = response.result.unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|error| RpcError::InvalidResponse(format!("{method}: {error}")))
}

/// Receipts of transactions in a pending block have no block number yet
fn receipt_from_raw(raw: RawReceipt) -> Result<Option<TxReceipt>> {
    let Some(block_number) = raw.block_number else {
        return Ok(None);
    };

    let receipt = TxReceipt {
        transaction_hash: raw.transaction_hash,
        block_number: parse_quantity(&block_number)?,
        status: raw.status.as_deref().map(parse_quantity).transpose()?,
    };

    Ok(Some(receipt))
}

fn parse_quantity(quantity: &str) -> Result<u64> {
    let digits = strip_hex_prefix(quantity);
    if digits.is_empty() {
        return Ok(0);
    }

    u64::from_str_radix(digits, 16)
        .map_err(|error| RpcError::InvalidResponse(format!("bad quantity {quantity}: {error}")))
}

fn parse_big_quantity(quantity: &str) -> Result<BigUint> {
    let digits = strip_hex_prefix(quantity);
    if digits.is_empty() {
        return Ok(BigUint::default());
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| RpcError::InvalidResponse(format!("bad quantity {quantity}")))
}
