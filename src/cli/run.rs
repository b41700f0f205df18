//! Handler for the `run` command.

use std::path::Path;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Load the registry, start the flush task and serve until Ctrl-C.
pub async fn execute(config_path: &Path, args: &RunArgs) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    config.init_logging();

    info!(
        store = config.store.backend(),
        debounce_ms = config.registry.debounce_ms,
        "factionkeep starting"
    );

    let runtime = bootstrap::build(&config)?;
    let registry = runtime.registry;
    registry.load_all().await?;
    registry.start()?;

    signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("Shutdown signal received");

    match registry.shutdown().await {
        Ok(written) => {
            let stats = registry.stats();
            info!(
                written,
                flushes = stats.flushes,
                records_written = stats.records_written,
                write_failures = stats.write_failures,
                "factionkeep stopped"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Final save failed");
            Err(e.into())
        }
    }
}
