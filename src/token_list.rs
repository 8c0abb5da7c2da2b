//! ERC-20 tokens the user imported, kept per network

use nevm_types::{ImportedToken, NetworkKey};
use parking_lot::Mutex;
use tracing::{error, info};

use crate::{
    app::reconcile::{Update, Updater},
    database::{self, imported_tokens::ImportedTokensTable},
};

#[derive(Debug)]
pub struct TokenList {
    table: ImportedTokensTable,
    updater: Updater,
    /// serializes read-modify-write of a network's list
    write_lock: Mutex<()>,
}

impl TokenList {
    pub fn new(table: ImportedTokensTable, updater: Updater) -> Self {
        Self { table, updater, write_lock: Mutex::new(()) }
    }

    /// Tokens in the order they were imported, empty if they cannot be read
    pub fn tokens(&self, network: &NetworkKey) -> Vec<ImportedToken> {
        self.table.get(network).unwrap_or_else(|error| {
            error!("unable to read imported tokens for {network}: {error}");
            Vec::new()
        })
    }

    /// Append a token, false if a token with the same contract address is already there
    ///
    /// Nothing is written when the current list cannot be read
    pub fn add(
        &self,
        network: &NetworkKey,
        token: ImportedToken,
    ) -> Result<bool, database::Error> {
        let _guard = self.write_lock.lock();

        let mut tokens = self.stored(network)?;
        if tokens.iter().any(|existing| existing.has_address(&token.address)) {
            return Ok(false);
        }

        info!("importing token {} ({}) on {network}", token.symbol, token.address);
        tokens.push(token);
        self.save(network, tokens);

        Ok(true)
    }

    pub fn remove(&self, network: &NetworkKey, address: &str) -> Result<bool, database::Error> {
        let _guard = self.write_lock.lock();

        let mut tokens = self.stored(network)?;
        let before = tokens.len();

        tokens.retain(|token| !token.has_address(address));
        if tokens.len() == before {
            return Ok(false);
        }

        info!("removed token {address} on {network}");
        self.save(network, tokens);

        Ok(true)
    }

    fn stored(&self, network: &NetworkKey) -> Result<Vec<ImportedToken>, database::Error> {
        self.table.get(network).inspect_err(|error| {
            error!("unable to read imported tokens for {network}, leaving them untouched: {error}")
        })
    }

    fn save(&self, network: &NetworkKey, tokens: Vec<ImportedToken>) {
        if let Err(error) = self.table.set(network, tokens.clone()) {
            error!("unable to save imported tokens for {network}: {error}");
        }

        self.updater.send_update(Update::ImportedTokensChanged(tokens));
    }
}
