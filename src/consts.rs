use std::{path::PathBuf, sync::LazyLock, time::Duration};

pub static ROOT_DATA_DIR: LazyLock<PathBuf> = LazyLock::new(data_dir_init);

/// Network selected on first launch and the fallback when the selection cannot be resolved
pub const DEFAULT_NETWORK_KEY: &str = "syscoin";

/// Minimum delay between native balance refreshes
pub const BALANCE_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Minimum delay between token balance refreshes
pub const TOKEN_BALANCE_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Block polling interval of a freshly built rpc client
pub const DEFAULT_RPC_POLL_INTERVAL: Duration = Duration::from_millis(4000);

/// Confirmations the event detector waits for before a transaction counts as confirmed
pub const TX_CONFIRMATIONS: u64 = 1;

fn data_dir_init() -> PathBuf {
    let dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("nevm-wallet");

    if let Err(error) = std::fs::create_dir_all(&dir) {
        tracing::error!("failed to create data directory at {}: {error}", dir.display());
    }

    dir
}
