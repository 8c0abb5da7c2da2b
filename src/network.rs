//! Network registry, the predefined networks and how a key resolves to a [`NetworkInfo`]

pub mod store;

use std::collections::BTreeMap;

use nevm_types::{NetworkInfo, NetworkKey, NetworkOverride};

use crate::database;

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum NetworkError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("chain id {chain_id} is already used by network {existing}")]
    DuplicateChainId { chain_id: u64, existing: String },

    #[error("a network with key {0} already exists")]
    DuplicateKey(String),

    #[error("invalid rpc url {url}: {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("unable to save network config: {0}")]
    Storage(#[from] database::Error),
}

/// Networks that ship with the app, can be overridden but never removed
#[derive(
    Debug,
    Copy,
    Clone,
    Hash,
    Eq,
    PartialEq,
    uniffi::Enum,
    strum::EnumIter,
    strum::IntoStaticStr,
    strum::EnumString,
)]
pub enum PredefinedNetwork {
    #[strum(serialize = "syscoin")]
    Syscoin,

    #[strum(serialize = "syscoinTestnet")]
    SyscoinTestnet,

    #[strum(serialize = "ethereum")]
    Ethereum,

    #[strum(serialize = "ethereumSepolia")]
    EthereumSepolia,

    #[strum(serialize = "polygon")]
    Polygon,

    #[strum(serialize = "rollux")]
    Rollux,
}

impl PredefinedNetwork {
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn info(self) -> NetworkInfo {
        use PredefinedNetwork as P;

        let (label, chain_id, symbol, rpc_url, explorer) = match self {
            P::Syscoin => {
                ("Syscoin NEVM", 57, "SYS", "https://rpc.syscoin.org", "https://explorer.syscoin.org")
            }
            P::SyscoinTestnet => (
                "Syscoin NEVM testnet",
                5700,
                "tSYS",
                "https://rpc.tanenbaum.io",
                "https://explorer.tanenbaum.io",
            ),
            P::Ethereum => {
                ("Ethereum Mainnet", 1, "ETH", "https://eth.llamarpc.com", "https://etherscan.io")
            }
            P::EthereumSepolia => (
                "Ethereum Sepolia",
                11_155_111,
                "ETH",
                "https://eth-sepolia.public.blastapi.io",
                "https://sepolia.etherscan.io",
            ),
            P::Polygon => ("Polygon", 137, "POL", "https://polygon-rpc.com", "https://polygonscan.com"),
            P::Rollux => {
                ("Rollux", 570, "SYS", "https://rpc.rollux.com", "https://explorer.rollux.com")
            }
        };

        NetworkInfo {
            key: self.key().to_string(),
            label: label.to_string(),
            chain_id,
            native_symbol: symbol.to_string(),
            rpc_url: rpc_url.to_string(),
            block_explorer: Some(explorer.to_string()),
        }
    }
}

pub fn default_network() -> NetworkInfo {
    PredefinedNetwork::Syscoin.info()
}

pub fn predefined(key: &str) -> Option<NetworkInfo> {
    key.parse::<PredefinedNetwork>().ok().map(PredefinedNetwork::info)
}

pub fn is_predefined(key: &str) -> bool {
    key.parse::<PredefinedNetwork>().is_ok()
}

pub fn predefined_networks() -> impl Iterator<Item = NetworkInfo> {
    use strum::IntoEnumIterator as _;
    PredefinedNetwork::iter().map(PredefinedNetwork::info)
}

/// Resolve `key` against the predefined networks then the custom ones, and layer the
/// network's override (if any) on top
pub fn resolve(
    key: &str,
    custom: &BTreeMap<NetworkKey, NetworkInfo>,
    overrides: &BTreeMap<NetworkKey, NetworkOverride>,
) -> Result<NetworkInfo, NetworkError> {
    let base = predefined(key)
        .or_else(|| custom.get(key).cloned())
        .ok_or_else(|| NetworkError::UnknownNetwork(key.to_string()))?;

    let info = match overrides.get(key) {
        Some(patch) => patch.apply_to(base),
        None => base,
    };

    Ok(info)
}

/// Only absolute http(s) urls with a host are usable as rpc endpoints
pub fn validate_rpc_url(rpc_url: &str) -> Result<(), NetworkError> {
    let invalid = |reason: String| NetworkError::InvalidRpcUrl { url: rpc_url.to_string(), reason };

    let url = url::Url::parse(rpc_url).map_err(|error| invalid(error.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(())
}

mod ffi {
    use super::*;

    #[uniffi::export]
    pub fn predefined_network_info(network: PredefinedNetwork) -> NetworkInfo {
        network.info()
    }

    #[uniffi::export]
    pub fn all_predefined_networks() -> Vec<NetworkInfo> {
        predefined_networks().collect()
    }
}
