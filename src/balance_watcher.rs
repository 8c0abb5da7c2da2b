//! Keeps the native and token balances of one address fresh
//!
//! Only one address is watched at a time, starting a new watch stops the previous one.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use arc_swap::ArcSwapOption;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use nevm_tokio::AbortableTask;
use nevm_types::ImportedToken;
use nevm_util::units::format_units;

use crate::{
    consts::{BALANCE_POLL_INTERVAL, TOKEN_BALANCE_POLL_INTERVAL},
    rpc::{ChainClient, erc20},
};

/// Native coins on every supported chain use 18 decimals
const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct BalanceUpdate {
    pub address: String,
    /// formatted native balance, `None` when it could not be fetched this time
    pub native: Option<String>,
    /// formatted balance per token contract address, tokens that failed are left out
    pub tokens: HashMap<String, String>,
}

pub type OnBalanceUpdate = Arc<dyn Fn(BalanceUpdate) + Send + Sync>;

#[derive(Debug)]
struct WatchInner {
    active: Arc<AtomicBool>,
    task: Mutex<Option<AbortableTask<()>>>,
}

/// Handle to a running watch, stopping is idempotent
#[derive(Debug, Clone)]
pub struct WatchHandle(Arc<WatchInner>);

impl WatchHandle {
    fn new() -> Self {
        let inner = WatchInner { active: Arc::new(AtomicBool::new(true)), task: Mutex::new(None) };
        Self(Arc::new(inner))
    }

    pub fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.0.stop();
    }
}

impl WatchInner {
    fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        debug!("stopping balance watch");
        drop(self.task.lock().take());
    }

    fn set_task(&self, task: AbortableTask<()>) {
        let mut slot = self.task.lock();

        // stopped before the task was handed over
        if !self.active.load(Ordering::SeqCst) {
            drop(task);
            return;
        }

        *slot = Some(task);
    }
}

#[derive(Debug, Default)]
pub struct BalanceWatcher {
    current: ArcSwapOption<WatchInner>,
}

impl BalanceWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `address`, reporting right away and then on every new block
    ///
    /// `min_interval` is the block polling interval, defaults to 5s or 2s when tokens are
    /// watched
    pub fn watch(
        &self,
        client: Arc<dyn ChainClient>,
        address: String,
        tokens: Vec<ImportedToken>,
        on_update: OnBalanceUpdate,
        min_interval: Option<Duration>,
    ) -> WatchHandle {
        let handle = WatchHandle::new();

        if let Some(previous) = self.current.swap(Some(handle.0.clone())) {
            previous.stop();
        }

        let interval = min_interval.unwrap_or(if tokens.is_empty() {
            BALANCE_POLL_INTERVAL
        } else {
            TOKEN_BALANCE_POLL_INTERVAL
        });

        debug!("watching balances of {address}, {} tokens, every {interval:?}", tokens.len());
        client.set_polling_interval(interval);

        // subscribe before the first fetch so no block is missed in between
        let mut blocks = client.subscribe_blocks();

        let watch = Watch { client, address, tokens, on_update, active: handle.0.active.clone() };

        let task = AbortableTask::spawn(async move {
            watch.refresh().await;

            loop {
                match blocks.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => watch.refresh().await,
                    Err(RecvError::Closed) => {
                        warn!("block subscription closed, balance watch of {} ends", watch.address);
                        return;
                    }
                }
            }
        });

        handle.0.set_task(task);
        handle
    }

    /// Stop whatever is being watched
    pub fn stop(&self) {
        if let Some(current) = self.current.swap(None) {
            current.stop();
        }
    }
}

struct Watch {
    client: Arc<dyn ChainClient>,
    address: String,
    tokens: Vec<ImportedToken>,
    on_update: OnBalanceUpdate,
    active: Arc<AtomicBool>,
}

impl Watch {
    async fn refresh(&self) {
        let client = self.client.as_ref();
        let address = self.address.as_str();

        let native = client.get_balance(address);
        let tokens = join_all(self.tokens.iter().map(|token| async move {
            (token, erc20::token_balance(client, token, address).await)
        }));

        let (native, tokens) = futures::join!(native, tokens);

        if !self.active.load(Ordering::SeqCst) {
            debug!("balance watch of {address} was stopped, discarding results");
            return;
        }

        let native = match native {
            Ok(wei) => Some(format_units(&wei, NATIVE_DECIMALS)),
            Err(error) => {
                warn!("unable to get balance of {address}: {error}");
                None
            }
        };

        let tokens = tokens
            .into_iter()
            .filter_map(|(token, balance)| match balance {
                Ok(balance) => Some((token.address.clone(), balance)),
                Err(error) => {
                    warn!("unable to get {} balance of {address}: {error}", token.symbol);
                    None
                }
            })
            .collect();

        (self.on_update)(BalanceUpdate { address: address.to_string(), native, tokens });
    }
}
