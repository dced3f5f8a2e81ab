//! Engine records and the accessor trait the exporter reads them through.

use std::path::PathBuf;

use crate::value::{Dict, Value};

/// Column names of the engine's location table, in positional order
pub const LOCATION_COLUMNS: [&str; 6] = [
    "type",
    "scene",
    "default",
    "addresses",
    "vanilla",
    "categories",
];

/// One collectible or placeable item from the engine's registry
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub name: String,
    /// Possessing the item can unlock logical progress
    pub advancement: bool,
    /// Placement priority hint
    pub priority: bool,
    pub kind: String,
    pub special: Dict,
}

impl ItemRecord {
    /// Build a record from an `item_table` row
    ///
    /// The engine keeps a single tri-state `progressive` flag per row:
    /// `True` marks advancement items, `False` priority items and `None`
    /// neither. A `None` special table is an empty one.
    pub fn from_table_row(
        name: impl Into<String>,
        kind: impl Into<String>,
        progressive: Option<bool>,
        special: Option<Dict>,
    ) -> Self {
        Self {
            name: name.into(),
            advancement: progressive == Some(true),
            priority: progressive == Some(false),
            kind: kind.into(),
            special: special.unwrap_or_default(),
        }
    }
}

/// One placement location: its name and the positional table columns
///
/// Rows normally carry all of [`LOCATION_COLUMNS`], but shorter rows are
/// kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub name: String,
    pub fields: Vec<Value>,
}

impl LocationRecord {
    pub fn new(name: impl Into<String>, fields: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Value of a named column, if the row is long enough to have it
    pub fn column(&self, column: &str) -> Option<&Value> {
        let index = LOCATION_COLUMNS.iter().position(|c| *c == column)?;
        self.fields.get(index)
    }
}

/// Where the engine keeps its logic rule files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicSources {
    /// Region files for glitchless logic
    pub glitchless: PathBuf,
    /// Region files for glitched logic
    pub glitched: PathBuf,
    /// Shared helper definitions
    pub helpers: PathBuf,
}

/// Read-only view of the randomizer's data model
pub trait EngineModel {
    /// Engine version, for status output only
    fn version(&self) -> &str;

    /// Item registry, in registry order
    fn items(&self) -> &[ItemRecord];

    /// Location table, in table order
    fn locations(&self) -> &[LocationRecord];

    fn logic_sources(&self) -> LogicSources;
}
