use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Copy,
    Clone,
    Hash,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::Display,
    uniffi::Enum,
)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[display("pending")]
    Pending,
    #[display("confirmed")]
    Confirmed,
    #[display("failed")]
    Failed,
}

impl TxStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Failed)
    }

    /// Map an on-chain receipt status code, `1` is success
    pub const fn from_receipt_status(status: Option<u64>) -> Self {
        match status {
            Some(1) => TxStatus::Confirmed,
            _ => TxStatus::Failed,
        }
    }
}

/// One submitted transaction as shown in the history
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct TxRecord {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// decimal string, e.g. "0.05"
    pub amount: String,
    pub symbol: String,
    /// submission time in milliseconds since the unix epoch
    pub timestamp: i64,
    pub status: TxStatus,
}

/// What the user asked to send, before it has a hash
#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Record)]
pub struct TxDraft {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub symbol: String,
}

impl TxRecord {
    pub fn pending(hash: String, draft: TxDraft, timestamp: i64) -> Self {
        Self {
            hash,
            from: draft.from,
            to: draft.to,
            amount: draft.amount,
            symbol: draft.symbol,
            timestamp,
            status: TxStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }
}
