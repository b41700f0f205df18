//! Handler for the `check` command.

use std::path::Path;

use anyhow::Context;

use crate::cli::output;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::store::StoreConfig;

/// Validate the configuration, open the store and decode every record.
///
/// Nothing is written back: repairs are reported, not applied.
pub async fn execute(config_path: &Path) -> anyhow::Result<()> {
    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Configuration");

    let config = Config::load_or_default(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if config_path.exists() {
        output::success(&format!("{} is valid", config_path.display()));
    } else {
        output::warning(&format!(
            "{} not found, using defaults",
            config_path.display()
        ));
    }

    output::field("store", config.store.backend());
    match &config.store {
        StoreConfig::Memory => output::note("memory store: nothing is persisted"),
        StoreConfig::Sqlite { path } => output::field("path", path),
        StoreConfig::Directory { path } => output::field("path", path.display()),
    }
    output::field("debounce", format!("{} ms", config.registry.debounce_ms));
    output::field(
        "safety flush",
        format!("{} s", config.registry.safety_flush_secs),
    );

    output::section("Records");
    let runtime = bootstrap::build(&config)?;
    let report = runtime
        .registry
        .load_all()
        .await
        .context("reading stored factions")?;

    output::field("loaded", report.loaded);
    output::field("repaired", report.repaired);
    output::field("skipped", report.skipped);

    if report.skipped > 0 {
        output::warning(&format!(
            "{} record(s) could not be decoded; see the warnings above",
            report.skipped
        ));
    } else if report.repaired > 0 {
        output::warning(&format!(
            "{} record(s) need repair; they are rewritten on the next run",
            report.repaired
        ));
    } else {
        output::success("All records are healthy");
    }
    Ok(())
}
