//! Item encoding.
//!
//! Converts registry items to the portable `items.json` shape. Two engine
//! conventions are rewritten on the way out:
//!
//! - `alias` is a `(name, value)` pair and becomes `{"name": .., "value": ..}`,
//!   or is dropped when it is `None`
//! - an uncapped `progressive` or `bottle` count (positive infinity) becomes `-1`
//!
//! Everything else in `special` is copied as is, nested values included.
//! Consumers must treat the key order of `special` as unspecified.

use serde::Serialize;
use thiserror::Error;

use crate::dict;
use crate::model::ItemRecord;
use crate::value::{Dict, Value};

/// Portable stand-in for an uncapped count
pub const UNCAPPED_COUNT: i64 = -1;

/// `special` keys whose uncapped value is rewritten
const CAPPED_KEYS: [&str; 2] = ["progressive", "bottle"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("item {item:?} has a malformed alias: expected a (name, value) pair, found {found}")]
    MalformedAlias { item: String, found: String },
}

/// An item as written to `items.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortableItem {
    pub name: String,
    pub advancement: bool,
    pub priority: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub special: Dict,
}

pub fn encode_item(record: &ItemRecord) -> Result<PortableItem, EncodeError> {
    let mut special = record.special.clone();

    // A `None` alias is dropped
    if let Some(alias) = special
        .shift_remove("alias")
        .filter(|alias| *alias != Value::None)
    {
        let Some([name, value]) = alias.as_sequence() else {
            return Err(EncodeError::MalformedAlias {
                item: record.name.clone(),
                found: alias.describe(),
            });
        };
        let alias = dict! {
            "name" => name.clone(),
            "value" => value.clone(),
        };
        special.insert("alias".to_string(), Value::Dict(alias));
    }

    for key in CAPPED_KEYS {
        if let Some(value) = special.get_mut(key) {
            if value.is_uncapped() {
                *value = Value::Int(UNCAPPED_COUNT);
            }
        }
    }

    Ok(PortableItem {
        name: record.name.clone(),
        advancement: record.advancement,
        priority: record.priority,
        kind: record.kind.clone(),
        special,
    })
}

/// Encode every item, keeping registry order
pub fn encode_items(records: &[ItemRecord]) -> Result<Vec<PortableItem>, EncodeError> {
    records.iter().map(encode_item).collect()
}
