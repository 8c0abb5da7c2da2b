pub mod app;
pub mod balance_watcher;
pub mod consts;
pub mod database;
pub mod lifecycle;
pub mod mnemonic;
pub mod network;
pub mod rpc;
pub mod token_list;
pub mod transaction_watcher;
pub mod tx_history;

pub(crate) mod logging;

#[cfg(test)]
mod test_support;

uniffi::setup_scaffolding!();
