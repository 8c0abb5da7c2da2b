use std::sync::Arc;

use nevm_types::{ImportedToken, NetworkKey, redb::Json};
use nevm_util::ResultExt as _;
use redb::TableDefinition;

use super::Error;

pub const TABLE: TableDefinition<NetworkKey, Json<Vec<ImportedToken>>> =
    TableDefinition::new("imported_tokens");

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct ImportedTokensTable {
    db: Arc<redb::Database>,
}

impl ImportedTokensTable {
    pub fn new(db: Arc<redb::Database>, write_txn: &redb::WriteTransaction) -> Result<Self> {
        write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

        Ok(Self { db })
    }

    pub fn get(&self, network: &NetworkKey) -> Result<Vec<ImportedToken>> {
        let read_txn = self.db.begin_read().map_err_str(Error::DatabaseAccess)?;
        let table = read_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

        let tokens = table
            .get(network)
            .map_err_str(Error::Read)?
            .map(|value| value.value())
            .unwrap_or_default();

        Ok(tokens)
    }

    pub fn set(&self, network: &NetworkKey, tokens: Vec<ImportedToken>) -> Result<()> {
        let write_txn = self.db.begin_write().map_err_str(Error::DatabaseAccess)?;

        {
            let mut table = write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

            if tokens.is_empty() {
                table.remove(network).map_err_str(Error::Save)?;
            } else {
                table.insert(network, tokens).map_err_str(Error::Save)?;
            }
        }

        write_txn.commit().map_err_str(Error::DatabaseAccess)?;

        Ok(())
    }
}
