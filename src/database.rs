//! Module for interacting with redb database, to store network configuration, transaction
//! history and imported tokens. Secrets never go here, see [`nevm_device::Keychain`].

pub mod error;
pub mod global_config;
pub mod imported_tokens;
pub mod tx_history;

use std::{path::Path, sync::Arc};

use global_config::GlobalConfigTable;
use imported_tokens::ImportedTokensTable;
use tx_history::TxHistoryTable;

use nevm_util::ResultExt as _;
use tracing::{error, info};

use crate::consts::ROOT_DATA_DIR;

pub type Error = error::DatabaseError;

#[derive(Debug, Clone)]
pub struct Database {
    pub global_config: GlobalConfigTable,
    pub tx_history: TxHistoryTable,
    pub imported_tokens: ImportedTokensTable,
}

impl Database {
    /// Open (or create) the app database in the platform data directory
    pub fn open_default() -> Result<Self, Error> {
        Self::open(&ROOT_DATA_DIR.join("nevm.db"))
    }

    /// Open (or create) a database at `path`, tables are created if missing
    pub fn open(path: &Path) -> Result<Self, Error> {
        let db = get_or_create_database(path)?;

        let write_txn = db.begin_write().map_err_str(Error::DatabaseAccess)?;
        let db = Arc::new(db);

        let global_config = GlobalConfigTable::new(db.clone(), &write_txn)?;
        let tx_history = TxHistoryTable::new(db.clone(), &write_txn)?;
        let imported_tokens = ImportedTokensTable::new(db.clone(), &write_txn)?;

        write_txn.commit().map_err_str(Error::DatabaseAccess)?;

        Ok(Self { global_config, tx_history, imported_tokens })
    }
}

fn get_or_create_database(path: &Path) -> Result<redb::Database, Error> {
    if path.exists() {
        match redb::Database::open(path) {
            Ok(db) => return Ok(db),
            Err(error) => {
                error!("failed to open database, error: {error:?}, creating a new one");
            }
        }
    };

    info!("Creating a new database, at {}", path.display());
    redb::Database::create(path).map_err_str(Error::DatabaseAccess)
}
