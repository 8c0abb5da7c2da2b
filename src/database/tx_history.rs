use std::sync::Arc;

use nevm_types::{NetworkKey, TxRecord, redb::Json};
use nevm_util::ResultExt as _;
use redb::{TableDefinition, TableHandle as _};

use super::Error;

/// Submitted transactions, one most-recent-first bucket per network
pub const TABLE: TableDefinition<NetworkKey, Json<Vec<TxRecord>>> =
    TableDefinition::new("tx_history");

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct TxHistoryTable {
    db: Arc<redb::Database>,
}

impl TxHistoryTable {
    pub fn new(db: Arc<redb::Database>, write_txn: &redb::WriteTransaction) -> Result<Self> {
        // create table if it doesn't exist
        write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

        Ok(Self { db })
    }

    pub fn get(&self, network: &NetworkKey) -> Result<Vec<TxRecord>> {
        let read_txn = self.db.begin_read().map_err_str(Error::DatabaseAccess)?;
        let table = read_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

        let records = table
            .get(network)
            .map_err_str(Error::Read)?
            .map(|value| value.value())
            .unwrap_or_default();

        Ok(records)
    }

    pub fn set(&self, network: &NetworkKey, records: Vec<TxRecord>) -> Result<()> {
        let write_txn = self.db.begin_write().map_err_str(Error::DatabaseAccess)?;

        {
            let mut table = write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;
            table.insert(network, records).map_err_str(Error::Save)?;
        }

        write_txn.commit().map_err_str(Error::DatabaseAccess)?;

        Ok(())
    }

    /// Drop every network's bucket
    pub fn clear_all(&self) -> Result<()> {
        let write_txn = self.db.begin_write().map_err_str(Error::DatabaseAccess)?;

        write_txn.delete_table(TABLE).map_err_str(Error::TableAccess)?;
        write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;
        write_txn.commit().map_err_str(Error::DatabaseAccess)?;

        tracing::debug!("cleared table {}", TABLE.name());
        Ok(())
    }
}
