//! Persisted record shape and conversion to and from faction parts.
//!
//! Record body (JSON, one per faction, keyed by id):
//!
//! ```text
//! name, type, color, prefix, balance, warehouseSize,
//! warehouseContents?   absent <=> every slot empty
//! ranks: { "<id>": { defaultName, displayName?, salary, permissions } }
//! ```
//!
//! `displayName` is only written when it differs from `defaultName`.
//! Decoding repairs what it safely can and reports each repair; only a body
//! that is not a record at all is rejected.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::config::RegistryConfig;
use crate::domain::{
    empty_slots, FactionId, FactionKind, FactionParts, FactionProfile, Money, Rank, RankId,
    RankSpec, Slots,
};
use crate::error::{Error, Result};

/// One persisted faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactionRecord {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FactionKind,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub balance: Money,
    #[serde(default)]
    pub warehouse_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_contents: Option<String>,
    #[serde(default)]
    pub ranks: BTreeMap<u32, RankRecord>,
}

/// One persisted rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankRecord {
    pub default_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub salary: Money,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// A decoded faction plus the repairs applied on the way in.
#[derive(Debug)]
pub struct Decoded {
    pub parts: FactionParts,
    pub repairs: Vec<String>,
}

/// Convert a faction snapshot into its record.
///
/// # Errors
/// Returns an error if the warehouse cannot be encoded.
pub fn to_record(parts: &FactionParts) -> Result<FactionRecord> {
    let warehouse_contents = if parts.warehouse.iter().all(Option::is_none) {
        None
    } else {
        Some(serde_json::to_string(&parts.warehouse)?)
    };

    let ranks = parts
        .ranks
        .iter()
        .map(|rank| {
            let record = RankRecord {
                default_name: rank.default_name().to_string(),
                display_name: rank
                    .has_custom_display_name()
                    .then(|| rank.display_name().to_string()),
                salary: rank.salary(),
                permissions: rank.permissions().iter().cloned().collect(),
            };
            (rank.id().get(), record)
        })
        .collect();

    Ok(FactionRecord {
        name: parts.profile.name.clone(),
        kind: parts.profile.kind,
        color: parts.profile.color.clone(),
        prefix: parts.profile.prefix.clone(),
        balance: parts.balance,
        warehouse_size: parts.warehouse_size,
        warehouse_contents,
        ranks,
    })
}

/// Encode a faction snapshot as a record body.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode(parts: &FactionParts) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_record(parts)?)?)
}

/// Decode a stored body into faction parts, repairing recoverable damage.
///
/// # Errors
/// Returns an error if the key is not a valid faction id or the body is not
/// a faction record.
pub fn decode(key: &str, body: &str, config: &RegistryConfig) -> Result<Decoded> {
    let id = FactionId::new(key);
    if !id.is_valid() {
        return Err(Error::Parse(format!("invalid faction key '{key}'")));
    }
    let record: FactionRecord = serde_json::from_str(body)?;
    Ok(from_record(id, record, config))
}

/// Build faction parts from a record.
pub fn from_record(id: FactionId, record: FactionRecord, config: &RegistryConfig) -> Decoded {
    let mut repairs = Vec::new();

    let warehouse_size = if record.warehouse_size == 0 {
        repairs.push(format!(
            "warehouse size 0 replaced by {}",
            config.default_warehouse_size
        ));
        config.default_warehouse_size
    } else {
        record.warehouse_size
    };

    let balance = if record.balance < Decimal::ZERO {
        repairs.push(format!("negative balance {} reset to 0", record.balance));
        Decimal::ZERO
    } else {
        record.balance
    };

    let warehouse = decode_warehouse(record.warehouse_contents.as_deref(), warehouse_size, &mut repairs);

    let mut ranks: Vec<Rank> = Vec::with_capacity(record.ranks.len() + 1);
    for (rank_id, rank) in record.ranks {
        if rank_id == 0 {
            repairs.push("dropped rank with id 0".to_string());
            continue;
        }
        ranks.push(Rank::new(RankSpec {
            id: RankId::new(rank_id),
            default_name: rank.default_name,
            display_name: rank.display_name,
            salary: rank.salary,
            permissions: rank.permissions,
        }));
    }
    if !ranks.iter().any(|r| r.id() == RankId::ENTRY) {
        repairs.push("missing entry rank synthesized".to_string());
        ranks.insert(
            0,
            Rank::new(RankSpec::new(RankId::ENTRY.get(), config.entry_rank_name.clone())),
        );
    }

    Decoded {
        parts: FactionParts {
            id,
            profile: FactionProfile {
                name: record.name,
                kind: record.kind,
                color: record.color,
                prefix: record.prefix,
            },
            balance,
            ranks,
            warehouse_size,
            warehouse,
        },
        repairs,
    }
}

fn decode_warehouse(blob: Option<&str>, size: usize, repairs: &mut Vec<String>) -> Slots {
    let Some(blob) = blob else {
        return empty_slots(size);
    };
    match serde_json::from_str::<Slots>(blob) {
        Ok(slots) if slots.len() == size => slots,
        Ok(slots) => {
            repairs.push(format!(
                "warehouse had {} slots instead of {size}, emptied",
                slots.len()
            ));
            empty_slots(size)
        }
        Err(e) => {
            repairs.push(format!("unreadable warehouse emptied: {e}"));
            empty_slots(size)
        }
    }
}
