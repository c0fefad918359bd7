//! Tracing initialisation.
//!
//! Log output goes to stdout through `tracing-subscriber`, either human-readable (`pretty`, the
//! default) or one JSON object per line (`json`), selected by `logging.format`. The level filter
//! comes from `RUST_LOG` and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=folio=debug,tower_http=info folio -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .try_init()?;
        }
    }

    info!(?format, "Telemetry initialized");
    Ok(())
}
