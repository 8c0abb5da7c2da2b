use std::sync::Arc;

use nevm_types::NetworkKey;
use nevm_util::ResultExt as _;
use redb::TableDefinition;

use crate::network::store::NetworkConfig;

use super::Error;

pub const TABLE: TableDefinition<&'static str, String> = TableDefinition::new("global_config");

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, strum::IntoStaticStr)]
pub enum GlobalConfigKey {
    #[strum(serialize = "selected_network")]
    SelectedNetwork,

    /// custom networks and overrides, one json document
    #[strum(serialize = "network_config")]
    NetworkConfig,
}

#[derive(Debug, Clone)]
pub struct GlobalConfigTable {
    db: Arc<redb::Database>,
}

impl GlobalConfigTable {
    pub fn new(db: Arc<redb::Database>, write_txn: &redb::WriteTransaction) -> Result<Self> {
        // create table if it doesn't exist
        write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

        Ok(Self { db })
    }

    pub fn selected_network(&self) -> Result<Option<NetworkKey>> {
        let key = self.get(GlobalConfigKey::SelectedNetwork)?;
        Ok(key.map(NetworkKey::from))
    }

    pub fn set_selected_network(&self, key: &NetworkKey) -> Result<()> {
        self.set(GlobalConfigKey::SelectedNetwork, key.to_string())
    }

    pub fn network_config(&self) -> Result<Option<NetworkConfig>> {
        let Some(json) = self.get(GlobalConfigKey::NetworkConfig)? else {
            return Ok(None);
        };

        let config = serde_json::from_str(&json).map_err_str(Error::Serialization)?;
        Ok(Some(config))
    }

    pub fn set_network_config(&self, config: &NetworkConfig) -> Result<()> {
        let json = serde_json::to_string(config).map_err_str(Error::Serialization)?;
        self.set(GlobalConfigKey::NetworkConfig, json)
    }

    pub fn get(&self, key: GlobalConfigKey) -> Result<Option<String>> {
        let read_txn = self.db.begin_read().map_err_str(Error::DatabaseAccess)?;
        let table = read_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

        let key: &'static str = key.into();
        let value = table.get(key).map_err_str(Error::Read)?.map(|value| value.value());

        Ok(value)
    }

    pub fn set(&self, key: GlobalConfigKey, value: String) -> Result<()> {
        let write_txn = self.db.begin_write().map_err_str(Error::DatabaseAccess)?;

        {
            let mut table = write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

            let key: &'static str = key.into();
            table.insert(key, value).map_err_str(Error::Save)?;
        }

        write_txn.commit().map_err_str(Error::DatabaseAccess)?;

        Ok(())
    }

    pub fn delete(&self, key: GlobalConfigKey) -> Result<()> {
        let write_txn = self.db.begin_write().map_err_str(Error::DatabaseAccess)?;

        {
            let mut table = write_txn.open_table(TABLE).map_err_str(Error::TableAccess)?;

            let key: &'static str = key.into();
            table.remove(key).map_err_str(Error::Save)?;
        }

        write_txn.commit().map_err_str(Error::DatabaseAccess)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::database::test_db::TestDatabase;

    #[test]
    fn test_config_keys() {
        let key: &str = GlobalConfigKey::SelectedNetwork.into();
        assert_eq!(key, "selected_network");

        let key: &str = GlobalConfigKey::NetworkConfig.into();
        assert_eq!(key, "network_config");
    }

    #[test]
    fn test_selected_network_survives_reopen() {
        let test_db = TestDatabase::new();
        let table = &test_db.db.global_config;

        assert_eq!(table.selected_network().unwrap(), None);
        table.set_selected_network(&NetworkKey::from("rollux")).unwrap();

        let test_db = test_db.reopen();
        let table = &test_db.db.global_config;
        assert_eq!(table.selected_network().unwrap(), Some(NetworkKey::from("rollux")));

        table.delete(GlobalConfigKey::SelectedNetwork).unwrap();
        assert_eq!(table.selected_network().unwrap(), None);
    }

    #[test]
    fn test_corrupt_network_config_is_a_serialization_error() {
        let test_db = TestDatabase::new();
        let table = &test_db.db.global_config;

        table.set(GlobalConfigKey::NetworkConfig, "{not json".to_string()).unwrap();
        assert!(matches!(table.network_config(), Err(Error::Serialization(_))));
    }
}
