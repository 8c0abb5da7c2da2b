use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Install the global subscriber, filter comes from `RUST_LOG` and defaults to `info`
///
/// `log` records from dependencies are forwarded into tracing
pub fn init() {
    INIT.call_once(|| {
        if let Err(error) = tracing_log::LogTracer::init() {
            eprintln!("log forwarding already installed: {error}");
        }

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(filter).with(fmt::layer());

        if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing subscriber already installed: {error}");
        }
    });
}
