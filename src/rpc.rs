//! Connection to an EVM chain over JSON-RPC

pub mod client;
pub mod erc20;

use std::{fmt::Debug, sync::Arc, time::Duration};

use eyre::{Context as _, bail};
use num_bigint::BigUint;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use nevm_types::{NetworkInfo, TxStatus};

pub use client::RpcClient;

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum RpcError {
    #[error("invalid rpc url: {0}")]
    InvalidUrl(String),

    #[error("unable to reach node: {0}")]
    Transport(String),

    #[error("node returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response from node: {0}")]
    InvalidResponse(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("block subscription closed")]
    SubscriptionClosed,
}

impl RpcError {
    /// Errors worth trying again, the node could not be reached
    pub fn is_transient(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}

/// A mined transaction
#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Record)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    /// `1` success, `0` reverted, missing on pre-byzantium chains
    pub status: Option<u64>,
}

impl TxReceipt {
    pub fn tx_status(&self) -> TxStatus {
        TxStatus::from_receipt_status(self.status)
    }
}

/// Live handle to a chain, one per effective network
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync + Debug {
    /// Native balance in wei
    async fn get_balance(&self, address: &str) -> Result<BigUint, RpcError>;

    /// `None` while the transaction is not mined
    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<TxReceipt>, RpcError>;

    async fn block_number(&self) -> Result<u64, RpcError>;

    /// Chain id the node reports
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_call` against the latest block
    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, RpcError>;

    /// Broadcast a signed transaction, returns its hash
    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, RpcError>;

    /// New block numbers, dropping the receiver unsubscribes
    fn subscribe_blocks(&self) -> broadcast::Receiver<u64>;

    fn set_polling_interval(&self, interval: Duration);
    fn polling_interval(&self) -> Duration;

    /// Resolves once the transaction is mined and has `confirmations` blocks on top of it
    /// (the block including it counts as one)
    ///
    /// Transport errors are retried on the next block, any other error is returned
    async fn wait_for_transaction(
        &self,
        hash: &str,
        confirmations: u64,
    ) -> Result<TxReceipt, RpcError> {
        let mut blocks = self.subscribe_blocks();

        loop {
            match confirmed_receipt(self, hash, confirmations).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(error) if error.is_transient() => {
                    warn!("unable to check transaction {hash}, retrying next block: {error}");
                }
                Err(error) => return Err(error),
            }

            match blocks.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return Err(RpcError::SubscriptionClosed),
            }
        }
    }
}

async fn confirmed_receipt<C: ChainClient + ?Sized>(
    client: &C,
    hash: &str,
    confirmations: u64,
) -> Result<Option<TxReceipt>, RpcError> {
    let Some(receipt) = client.get_transaction_receipt(hash).await? else {
        return Ok(None);
    };

    if confirmations <= 1 {
        return Ok(Some(receipt));
    }

    let head = client.block_number().await?;
    let depth = head.saturating_sub(receipt.block_number) + 1;

    Ok((depth >= confirmations).then_some(receipt))
}

/// Check the node answers and serves the chain the network claims, returns its latest block
pub async fn check_node(client: &dyn ChainClient, network: &NetworkInfo) -> eyre::Result<u64> {
    let chain_id = client
        .chain_id()
        .await
        .wrap_err_with(|| format!("unable to reach node at {}", network.rpc_url))?;

    if chain_id != network.chain_id {
        bail!(
            "node at {} serves chain id {chain_id}, expected {}",
            network.rpc_url,
            network.chain_id
        );
    }

    let block = client.block_number().await.wrap_err("unable to get the latest block")?;
    Ok(block)
}

/// Builds connections, swapped out in tests
pub trait ConnectionFactory: Send + Sync + Debug {
    fn connect(&self, network: &NetworkInfo) -> Result<Arc<dyn ChainClient>, RpcError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RpcConnectionFactory;

impl ConnectionFactory for RpcConnectionFactory {
    fn connect(&self, network: &NetworkInfo) -> Result<Arc<dyn ChainClient>, RpcError> {
        let client = build_connection(network)?;
        Ok(Arc::new(client))
    }
}

/// A JSON-RPC connection for a resolved network, only its rpc url is used
pub fn build_connection(network: &NetworkInfo) -> Result<RpcClient, RpcError> {
    let url = url::Url::parse(network.rpc_url.trim())
        .map_err(|error| RpcError::InvalidUrl(format!("{}: {error}", network.rpc_url)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RpcError::InvalidUrl(format!("unsupported scheme {}", url.scheme())));
    }

    Ok(RpcClient::new(url))
}

/// Parse a `0x` prefixed 20 byte address
pub fn parse_address(address: &str) -> Result<[u8; 20], RpcError> {
    let bytes = nevm_util::decode_prefixed_hex(address.trim())
        .map_err(|error| RpcError::InvalidAddress(format!("{address}: {error}")))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        RpcError::InvalidAddress(format!("{address}: expected 20 bytes, got {}", bytes.len()))
    })
}
