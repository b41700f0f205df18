//! One-shot faction commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::json;
use tabled::Tabled;

use crate::application::registry::{NewFaction, Registry, DEFAULT_COLOR};
use crate::cli::output;
use crate::cli::{AmountArgs, CreateArgs, RenameRankArgs};
use crate::domain::{Faction, RankId};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

#[derive(Tabled)]
struct FactionRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Ranks")]
    ranks: usize,
    #[tabled(rename = "Warehouse")]
    warehouse: String,
}

impl FactionRow {
    fn from_faction(faction: &Faction) -> Self {
        let used = faction
            .warehouse_contents()
            .iter()
            .filter(|slot| slot.is_some())
            .count();
        Self {
            id: faction.id().to_string(),
            name: faction.name(),
            kind: faction.kind().to_string(),
            balance: faction.balance().to_string(),
            ranks: faction.ranks().len(),
            warehouse: format!("{used}/{}", faction.warehouse_size()),
        }
    }
}

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "Id")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Default")]
    default_name: String,
    #[tabled(rename = "Salary")]
    salary: String,
    #[tabled(rename = "Permissions")]
    permissions: usize,
}

/// Load the configured registry.
pub(crate) async fn open(config_path: &Path) -> anyhow::Result<Registry> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let runtime = bootstrap::build(&config)?;
    runtime.registry.load_all().await?;
    Ok(runtime.registry)
}

/// Write every change back and stop the registry.
async fn finish(registry: &Registry) -> anyhow::Result<()> {
    registry
        .shutdown()
        .await
        .context("saving factions")?;
    Ok(())
}

fn require(registry: &Registry, id: &str) -> anyhow::Result<Arc<Faction>> {
    match registry.get(id) {
        Some(faction) => Ok(faction),
        None => bail!("unknown faction '{id}'"),
    }
}

pub async fn list(config_path: &Path) -> anyhow::Result<()> {
    let registry = open(config_path).await?;
    let factions = registry.factions();

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(&format!("Factions ({})", factions.len()));

    if factions.is_empty() {
        output::note("No factions stored");
        return Ok(());
    }

    let json_rows = factions
        .iter()
        .map(|f| {
            json!({
                "id": f.id().as_str(),
                "name": f.name(),
                "type": f.kind().as_str(),
                "balance": f.balance().to_string(),
                "ranks": f.ranks().len(),
                "warehouseSize": f.warehouse_size(),
            })
        })
        .collect();
    let rows = factions.iter().map(|f| FactionRow::from_faction(f)).collect();
    output::table("factions", rows, json_rows);
    Ok(())
}

pub async fn show(config_path: &Path, id: &str) -> anyhow::Result<()> {
    let registry = open(config_path).await?;
    let faction = require(&registry, id)?;
    let profile = faction.profile();

    output::section(&profile.name);
    output::field("id", faction.id());
    output::field("type", profile.kind);
    output::field("color", &profile.color);
    output::field("prefix", &profile.prefix);
    output::field("balance", faction.balance());
    output::field("warehouse", FactionRow::from_faction(&faction).warehouse);

    let ranks = faction.ranks();
    let json_rows = ranks
        .iter()
        .map(|r| {
            json!({
                "id": r.id().get(),
                "displayName": r.display_name(),
                "defaultName": r.default_name(),
                "salary": r.salary().to_string(),
                "permissions": r.permissions(),
            })
        })
        .collect();
    let rows = ranks
        .iter()
        .rev()
        .map(|r| RankRow {
            id: r.id().get(),
            name: r.display_name().to_string(),
            default_name: r.default_name().to_string(),
            salary: r.salary().to_string(),
            permissions: r.permissions().len(),
        })
        .collect();

    output::section("Ranks");
    output::table("ranks", rows, json_rows);
    Ok(())
}

pub async fn create(config_path: &Path, args: &CreateArgs) -> anyhow::Result<()> {
    let registry = open(config_path).await?;

    let mut new = NewFaction::new(&args.id, &args.name)
        .kind(args.kind)
        .color(args.color.as_deref().unwrap_or(DEFAULT_COLOR))
        .prefix(&args.prefix)
        .initial_balance(args.balance);
    if let Some(size) = args.warehouse_size {
        new = new.warehouse_size(size);
    }

    let faction = registry.create(new)?;
    finish(&registry).await?;

    output::success(&format!(
        "Created {} ({}) with {} warehouse slots",
        output::highlight(faction.id()),
        faction.name(),
        faction.warehouse_size()
    ));
    Ok(())
}

pub async fn delete(config_path: &Path, id: &str) -> anyhow::Result<()> {
    let registry = open(config_path).await?;
    let cleared = registry.delete(id).await?;
    finish(&registry).await?;

    output::success(&format!("Deleted {}", output::highlight(id)));
    if cleared > 0 {
        output::note(&format!("{cleared} member binding(s) cleared"));
    }
    Ok(())
}

pub async fn deposit(config_path: &Path, args: &AmountArgs) -> anyhow::Result<()> {
    let registry = open(config_path).await?;
    let faction = require(&registry, &args.id)?;

    if !faction.deposit(args.amount) {
        bail!("deposit amount must be greater than 0");
    }
    finish(&registry).await?;

    output::success(&format!(
        "Deposited {} into {}; balance {}",
        args.amount,
        output::highlight(faction.id()),
        faction.balance()
    ));
    Ok(())
}

pub async fn withdraw(config_path: &Path, args: &AmountArgs) -> anyhow::Result<()> {
    let registry = open(config_path).await?;
    let faction = require(&registry, &args.id)?;

    if !faction.withdraw(args.amount) {
        bail!(
            "cannot withdraw {} from '{}': balance is {}",
            args.amount,
            faction.id(),
            faction.balance()
        );
    }
    finish(&registry).await?;

    output::success(&format!(
        "Withdrew {} from {}; balance {}",
        args.amount,
        output::highlight(faction.id()),
        faction.balance()
    ));
    Ok(())
}

pub async fn rename_rank(config_path: &Path, args: &RenameRankArgs) -> anyhow::Result<()> {
    let registry = open(config_path).await?;
    let faction = require(&registry, &args.id)?;

    let Some(mut rank) = faction.rank(RankId::new(args.rank)) else {
        bail!("faction '{}' has no rank {}", faction.id(), args.rank);
    };
    match (&args.name, args.reset) {
        (Some(name), false) => rank.set_display_name(name),
        _ => rank.reset_display_name(),
    }
    let display_name = rank.display_name().to_string();
    faction.update_rank(rank);
    finish(&registry).await?;

    output::success(&format!(
        "Rank {} of {} is now {}",
        args.rank,
        output::highlight(faction.id()),
        output::highlight(display_name)
    ));
    Ok(())
}
