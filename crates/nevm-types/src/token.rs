use serde::{Deserialize, Serialize};

/// An ERC-20 token the user imported on a network
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct ImportedToken {
    /// contract address
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl ImportedToken {
    /// Contract addresses are compared without regard to checksum casing
    pub fn has_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}
