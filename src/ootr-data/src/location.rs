//! Location table shaping.
//!
//! Each location row is reduced to the columns downstream tools use. The
//! `scene`, `default` and `addresses` columns describe where the engine patches
//! the ROM and never leave this module.

use serde::Serialize;
use thiserror::Error;

use crate::model::LocationRecord;
use crate::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("location {name:?} has no type column")]
    MissingType { name: String },
}

/// A location as written to `locations.json`
///
/// `vanilla` and `categories` are only present when the source row is long
/// enough to hold them. A present column holding `None` is written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortableLocation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vanilla: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Value>,
}

/// Project one location row onto its portable columns
pub fn shape_location(record: &LocationRecord) -> Result<PortableLocation, ShapeError> {
    let kind = record
        .column("type")
        .cloned()
        .ok_or_else(|| ShapeError::MissingType {
            name: record.name.clone(),
        })?;

    Ok(PortableLocation {
        name: record.name.clone(),
        kind,
        vanilla: record.column("vanilla").cloned(),
        categories: record.column("categories").cloned(),
    })
}

/// Shape every location, keeping table order
pub fn shape_locations(records: &[LocationRecord]) -> Result<Vec<PortableLocation>, ShapeError> {
    records.iter().map(shape_location).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row(name: &str) -> LocationRecord {
        LocationRecord::new(
            name,
            vec![
                Value::from("NPC"),
                Value::Int(0x5B),
                Value::Int(0x0C),
                Value::Tuple(vec![Value::Int(0x0CA315F), Value::Int(0x2079571)]),
                Value::from("Kokiri Sword"),
                Value::Tuple(vec![Value::from("Kokiri Forest"), Value::from("Forest")]),
            ],
        )
    }

    #[test]
    fn test_internal_columns_are_dropped() {
        let shaped = shape_location(&full_row("KF Kokiri Sword Chest")).unwrap();
        let json = serde_json::to_value(&shaped).unwrap();
        let obj = json.as_object().unwrap();

        for dropped in ["scene", "default", "addresses"] {
            assert!(!obj.contains_key(dropped), "{dropped} leaked into output");
        }
        assert_eq!(
            json,
            serde_json::json!({
                "name": "KF Kokiri Sword Chest",
                "type": "NPC",
                "vanilla": "Kokiri Sword",
                "categories": ["Kokiri Forest", "Forest"],
            })
        );
    }

    #[test]
    fn test_internal_columns_dropped_even_when_none() {
        let row = LocationRecord::new(
            "Links Pocket",
            vec![
                Value::from("Boss"),
                Value::None,
                Value::None,
                Value::None,
                Value::from("Light Medallion"),
                Value::None,
            ],
        );
        let json = serde_json::to_value(shape_location(&row).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Links Pocket",
                "type": "Boss",
                "vanilla": "Light Medallion",
                "categories": null,
            })
        );
    }

    #[test]
    fn test_short_rows_keep_only_present_columns() {
        let mut row = full_row("Short");
        row.fields.truncate(5);
        let json = serde_json::to_value(shape_location(&row).unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("vanilla"));
        assert!(!obj.contains_key("categories"));

        row.fields.truncate(1);
        let json = serde_json::to_value(shape_location(&row).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Short", "type": "NPC"}));
    }

    #[test]
    fn test_key_order_follows_columns() {
        let json = serde_json::to_string(&shape_location(&full_row("A")).unwrap()).unwrap();
        let name = json.find("\"name\"").unwrap();
        let kind = json.find("\"type\"").unwrap();
        let vanilla = json.find("\"vanilla\"").unwrap();
        let categories = json.find("\"categories\"").unwrap();
        assert!(name < kind && kind < vanilla && vanilla < categories);
    }

    #[test]
    fn test_empty_row_is_rejected() {
        let row = LocationRecord::new("Broken", vec![]);
        assert_eq!(
            shape_location(&row),
            Err(ShapeError::MissingType {
                name: "Broken".into()
            })
        );
    }

    #[test]
    fn test_table_order_is_preserved() {
        let rows = vec![full_row("Zora"), full_row("Abyss"), full_row("Market")];
        let names: Vec<_> = shape_locations(&rows)
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Zora", "Abyss", "Market"]);
    }
}
