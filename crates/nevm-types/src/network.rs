use serde::{Deserialize, Serialize};

use crate::NetworkKey;

/// Identity and connection metadata for one EVM chain
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct NetworkInfo {
    pub key: String,
    pub label: String,
    pub chain_id: u64,
    pub native_symbol: String,
    pub rpc_url: String,
    pub block_explorer: Option<String>,
}

/// User edits layered on top of a network, every field is optional
///
/// A field that is `Some` is present in the override and wins during the merge, even when it
/// holds an empty string. The one exception is `rpc_url`, a blank url is never applied.
#[derive(
    Debug, Clone, Default, Hash, Eq, PartialEq, Serialize, Deserialize, uniffi::Record,
)]
pub struct NetworkOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer: Option<String>,
}

impl NetworkInfo {
    pub fn network_key(&self) -> NetworkKey {
        NetworkKey::from(self.key.as_str())
    }

    /// Link to a transaction on the block explorer, if the network has one
    pub fn explorer_tx_url(&self, hash: &str) -> Option<String> {
        let explorer = self.block_explorer.as_deref()?.trim_end_matches('/');
        if explorer.is_empty() {
            return None;
        }

        Some(format!("{explorer}/tx/{hash}"))
    }
}

impl NetworkOverride {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.chain_id.is_none()
            && self.native_symbol.is_none()
            && self.rpc_url.is_none()
            && self.block_explorer.is_none()
    }

    /// Drop fields holding a blank string, they mean "no change" when coming from a form
    pub fn without_blank_fields(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|value| !value.trim().is_empty())
        }

        Self {
            label: keep(self.label),
            chain_id: self.chain_id,
            native_symbol: keep(self.native_symbol),
            rpc_url: keep(self.rpc_url.map(|url| url.trim().to_string())),
            block_explorer: keep(self.block_explorer),
        }
    }

    /// Combine two overrides, fields present in `newer` replace ours
    pub fn merged_with(self, newer: NetworkOverride) -> Self {
        Self {
            label: newer.label.or(self.label),
            chain_id: newer.chain_id.or(self.chain_id),
            native_symbol: newer.native_symbol.or(self.native_symbol),
            rpc_url: newer.rpc_url.or(self.rpc_url),
            block_explorer: newer.block_explorer.or(self.block_explorer),
        }
    }

    /// Layer this override on top of `base`
    pub fn apply_to(&self, base: NetworkInfo) -> NetworkInfo {
        let rpc_url = match &self.rpc_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => base.rpc_url,
        };

        NetworkInfo {
            key: base.key,
            label: self.label.clone().unwrap_or(base.label),
            chain_id: self.chain_id.unwrap_or(base.chain_id),
            native_symbol: self.native_symbol.clone().unwrap_or(base.native_symbol),
            rpc_url,
            block_explorer: self.block_explorer.clone().or(base.block_explorer),
        }
    }
}
