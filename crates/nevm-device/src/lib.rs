uniffi::setup_scaffolding!();

pub mod keychain;

pub use keychain::{Keychain, KeychainAccess, KeychainError, SecretKey};
