uniffi::setup_scaffolding!();

mod network_key;

pub mod network;
pub mod redb;
pub mod token;
pub mod transaction;

// export the types
pub use network::{NetworkInfo, NetworkOverride};
pub use network_key::NetworkKey;
pub use token::ImportedToken;
pub use transaction::{TxDraft, TxRecord, TxStatus};
