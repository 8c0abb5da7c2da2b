//! Module for interacting with the platform secure storage

use std::{str::FromStr as _, sync::Arc};

use bip39::Mnemonic;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum KeychainError {
    #[error("unable to save: {0}")]
    Save(String),

    #[error("unable to delete: {0}")]
    Delete(String),

    #[error("unable to parse saved value: {0}")]
    ParseSavedValue(String),

    #[error("unexpected keychain callback error: {0}")]
    Unexpected(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for KeychainError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Unexpected(error.reason)
    }
}

/// Implemented by the native app on top of the platform keychain / keystore
#[uniffi::export(callback_interface)]
pub trait KeychainAccess: Send + Sync + std::fmt::Debug + 'static {
    fn save(&self, key: String, value: String) -> Result<(), KeychainError>;
    fn get(&self, key: String) -> Option<String>;
    fn delete(&self, key: String) -> Result<(), KeychainError>;
}

/// The fixed set of secrets we keep in secure storage
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, strum::IntoStaticStr, strum::EnumIter)]
pub enum SecretKey {
    #[strum(serialize = "walletPassword")]
    WalletPassword,

    #[strum(serialize = "mnemonic")]
    Mnemonic,
}

#[derive(Debug, Clone)]
pub struct Keychain(Arc<Box<dyn KeychainAccess>>);

impl Keychain {
    pub fn new(keychain: Box<dyn KeychainAccess>) -> Self {
        Self(Arc::new(keychain))
    }

    pub fn save_mnemonic(&self, mnemonic: &Mnemonic) -> Result<(), KeychainError> {
        self.save(SecretKey::Mnemonic, mnemonic.to_string())
    }

    pub fn mnemonic(&self) -> Result<Option<Mnemonic>, KeychainError> {
        let Some(words) = self.get(SecretKey::Mnemonic) else {
            return Ok(None);
        };

        let mnemonic = Mnemonic::from_str(&words).map_err(|error| {
            KeychainError::ParseSavedValue(format!("saved mnemonic is invalid: {error}"))
        })?;

        Ok(Some(mnemonic))
    }

    pub fn save_password(&self, password: &str) -> Result<(), KeychainError> {
        self.save(SecretKey::WalletPassword, password.to_string())
    }

    pub fn password(&self) -> Option<String> {
        self.get(SecretKey::WalletPassword)
    }

    pub fn has_wallet(&self) -> bool {
        self.get(SecretKey::Mnemonic).is_some()
    }

    /// Remove every secret we own, stops at the first failure
    pub fn delete_all(&self) -> Result<(), KeychainError> {
        use strum::IntoEnumIterator as _;

        for key in SecretKey::iter() {
            self.delete(key)?;
        }

        Ok(())
    }

    pub fn delete(&self, key: SecretKey) -> Result<(), KeychainError> {
        let name: &'static str = key.into();
        debug!("deleting {name} from keychain");

        self.0.delete(name.to_string()).inspect_err(|error| {
            error!("failed to delete {name} from keychain: {error}");
        })
    }

    fn save(&self, key: SecretKey, value: String) -> Result<(), KeychainError> {
        let name: &'static str = key.into();

        self.0.save(name.to_string(), value).inspect_err(|error| {
            error!("failed to save {name} to keychain: {error}");
        })
    }

    fn get(&self, key: SecretKey) -> Option<String> {
        let name: &'static str = key.into();
        let value = self.0.get(name.to_string());

        if value.is_none() {
            warn!("no value in keychain for {name}");
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Default)]
    struct MemoryKeychain {
        items: Mutex<HashMap<String, String>>,
        fail_writes: bool,
    }

    impl KeychainAccess for MemoryKeychain {
        fn save(&self, key: String, value: String) -> Result<(), KeychainError> {
            if self.fail_writes {
                return Err(KeychainError::Save(key));
            }

            self.items.lock().insert(key, value);
            Ok(())
        }

        fn get(&self, key: String) -> Option<String> {
            self.items.lock().get(&key).cloned()
        }

        fn delete(&self, key: String) -> Result<(), KeychainError> {
            if self.fail_writes {
                return Err(KeychainError::Delete(key));
            }

            self.items.lock().remove(&key);
            Ok(())
        }
    }

    const WORDS: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_mnemonic_round_trip_and_delete() {
        let keychain = Keychain::new(Box::new(MemoryKeychain::default()));
        assert!(keychain.mnemonic().unwrap().is_none());

        let mnemonic = Mnemonic::from_str(WORDS).unwrap();
        keychain.save_mnemonic(&mnemonic).unwrap();
        keychain.save_password("hunter2").unwrap();

        assert_eq!(keychain.mnemonic().unwrap(), Some(mnemonic));
        assert_eq!(keychain.password().as_deref(), Some("hunter2"));
        assert!(keychain.has_wallet());

        keychain.delete_all().unwrap();
        assert!(keychain.mnemonic().unwrap().is_none());
        assert!(keychain.password().is_none());
    }

    #[test]
    fn test_write_failures_propagate() {
        let access = MemoryKeychain { fail_writes: true, ..Default::default() };
        let keychain = Keychain::new(Box::new(access));

        assert!(matches!(keychain.save_password("pw"), Err(KeychainError::Save(_))));
        assert!(matches!(keychain.delete_all(), Err(KeychainError::Delete(_))));
    }

    #[test]
    fn test_corrupt_mnemonic_is_a_parse_error() {
        let access = MemoryKeychain::default();
        access.items.lock().insert("mnemonic".into(), "not a mnemonic".into());

        let keychain = Keychain::new(Box::new(access));
        assert!(matches!(keychain.mnemonic(), Err(KeychainError::ParseSavedValue(_))));
    }

    #[test]
    fn test_secret_key_names() {
        let name: &'static str = SecretKey::WalletPassword.into();
        assert_eq!(name, "walletPassword");

        let name: &'static str = SecretKey::Mnemonic.into();
        assert_eq!(name, "mnemonic");
    }
}
