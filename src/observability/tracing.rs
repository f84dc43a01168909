use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Initializes the tracing subscriber exactly once.
///
/// Filtering follows `RUST_LOG` when set and defaults to `info`. Events are
/// emitted as JSON lines so the worker's cache-hit/query logging stays
/// machine-parseable.
///
/// # Errors
/// Returns an error when the subscriber fails to install.
pub fn init() -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false).json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;

        info!("tracing initialized");
        Ok::<(), Error>(())
    })?;
    Ok(())
}
