//! Builders for factions and stored records used across tests.

use rust_decimal::Decimal;
use serde_json::json;

use crate::application::registry::NewFaction;
use crate::domain::{FactionKind, Money};
use crate::port::outbound::StoredRecord;

/// The police faction used by the treasury scenarios: balance 0, nine
/// warehouse slots.
pub fn police() -> NewFaction {
    NewFaction::new("pd", "Police Department")
        .kind(FactionKind::State)
        .color("#1E90FF")
        .prefix("[PD]")
        .warehouse_size(9)
}

/// A criminal faction with a starting balance.
pub fn gang(id: &str, balance: Money) -> NewFaction {
    NewFaction::new(id, format!("Gang {id}"))
        .kind(FactionKind::Criminal)
        .color("#8B0000")
        .initial_balance(balance)
}

/// Minimal well-formed record body with an entry and a leader rank.
pub fn record(key: &str, name: &str, balance: Decimal) -> StoredRecord {
    let body = json!({
        "name": name,
        "type": "OTHER",
        "color": "#FFFFFF",
        "prefix": "",
        "balance": balance.to_string(),
        "warehouseSize": 9,
        "ranks": {
            "1": { "defaultName": "Recruit", "salary": "0", "permissions": [] },
            "10": { "defaultName": "Leader", "salary": "0", "permissions": ["faction.kick"] }
        }
    });
    StoredRecord::new(key, body.to_string())
}

/// Record body missing its entry rank.
pub fn record_without_entry_rank(key: &str) -> StoredRecord {
    let body = json!({
        "name": "Headless",
        "type": "OTHER",
        "balance": "5",
        "warehouseSize": 9,
        "ranks": {
            "10": { "defaultName": "Leader", "salary": "0", "permissions": [] }
        }
    });
    StoredRecord::new(key, body.to_string())
}
