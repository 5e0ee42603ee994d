//! Tracing subscriber setup for the server binary.

use crate::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins; otherwise debug-level crate logs for debug profiles, info for the rest.
pub fn init_tracing(settings: &Settings) {
    let default_directive = if settings.debug {
        "cryptoscore=debug,tower_http=debug,info"
    } else {
        "cryptoscore=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
