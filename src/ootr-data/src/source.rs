//! Engine source tree extraction.
//!
//! Reads the item registry, location table and version straight out of an
//! OOT-Randomizer checkout. The tables are plain Python literals, so they are
//! evaluated with [`pyliteral`](crate::pyliteral) instead of running the engine.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::model::{EngineModel, ItemRecord, LocationRecord, LogicSources};
use crate::pyliteral::{self, ParseError};
use crate::value::{Dict, Value};

pub const VERSION_FILE: &str = "version.py";
pub const ITEM_LIST_FILE: &str = "ItemList.py";
pub const LOCATION_LIST_FILE: &str = "LocationList.py";

pub const GLITCHLESS_LOGIC_DIR: &str = "data/World";
pub const GLITCHED_LOGIC_DIR: &str = "data/Glitched World";
pub const LOGIC_HELPERS_FILE: &str = "data/LogicHelpers.json";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{}: no top-level `{name}` assignment", path.display())]
    MissingAssignment { path: PathBuf, name: &'static str },

    #[error("{}: `{name}` must be {expected}, found {found}", path.display())]
    UnexpectedShape {
        path: PathBuf,
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{}: malformed entry {entry:?}: {reason}", path.display())]
    MalformedEntry {
        path: PathBuf,
        entry: String,
        reason: String,
    },
}

/// An OOT-Randomizer checkout
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    version: String,
    items: Vec<ItemRecord>,
    locations: Vec<LocationRecord>,
}

impl SourceTree {
    /// Read the engine tables under `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self, SourceError> {
        let root = root.as_ref().to_path_buf();

        let version = read_version(&root.join(VERSION_FILE))?;
        let items = read_items(&root.join(ITEM_LIST_FILE))?;
        let locations = read_locations(&root.join(LOCATION_LIST_FILE))?;

        debug!(
            root = %root.display(),
            items = items.len(),
            locations = locations.len(),
            "Read engine tables"
        );

        Ok(Self {
            root,
            version,
            items,
            locations,
        })
    }
}

impl EngineModel for SourceTree {
    fn version(&self) -> &str {
        &self.version
    }

    fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    fn locations(&self) -> &[LocationRecord] {
        &self.locations
    }

    fn logic_sources(&self) -> LogicSources {
        LogicSources {
            glitchless: self.root.join(GLITCHLESS_LOGIC_DIR),
            glitched: self.root.join(GLITCHED_LOGIC_DIR),
            helpers: self.root.join(LOGIC_HELPERS_FILE),
        }
    }
}

fn read_assignment(path: &Path, name: &'static str) -> Result<Value, SourceError> {
    let source = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    pyliteral::find_assignment(&source, name)
        .map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| SourceError::MissingAssignment {
            path: path.to_path_buf(),
            name,
        })
}

fn read_version(path: &Path) -> Result<String, SourceError> {
    match read_assignment(path, "__version__")? {
        Value::Str(version) => Ok(version),
        other => Err(SourceError::UnexpectedShape {
            path: path.to_path_buf(),
            name: "__version__",
            expected: "a string",
            found: other.kind(),
        }),
    }
}

fn read_table(path: &Path, name: &'static str) -> Result<Dict, SourceError> {
    match read_assignment(path, name)? {
        Value::Dict(table) => Ok(table),
        other => Err(SourceError::UnexpectedShape {
            path: path.to_path_buf(),
            name,
            expected: "a mapping",
            found: other.kind(),
        }),
    }
}

/// Items from `item_table`: `name -> (type, progressive, item_id, special)`
fn read_items(path: &Path) -> Result<Vec<ItemRecord>, SourceError> {
    let table = read_table(path, "item_table")?;
    let malformed = |entry: &str, reason: String| SourceError::MalformedEntry {
        path: path.to_path_buf(),
        entry: entry.to_string(),
        reason,
    };

    let mut items = Vec::with_capacity(table.len());
    for (name, row) in &table {
        let Some([kind, progressive, _item_id, special]) = row.as_sequence() else {
            let reason = format!("expected a 4-tuple, found {}", row.describe());
            return Err(malformed(name.as_str(), reason));
        };

        let Value::Str(kind) = kind else {
            let reason = format!("item type must be a string, found {}", kind.kind());
            return Err(malformed(name.as_str(), reason));
        };

        let progressive = match progressive {
            Value::Bool(b) => Some(*b),
            Value::None => None,
            other => {
                return Err(malformed(
                    name.as_str(),
                    format!("progressive flag must be a bool or None, found {}", other.kind()),
                ))
            }
        };

        let special = match special {
            Value::Dict(d) => Some(d.clone()),
            Value::None => None,
            other => {
                return Err(malformed(
                    name.as_str(),
                    format!("special must be a mapping or None, found {}", other.kind()),
                ))
            }
        };

        items.push(ItemRecord::from_table_row(name.as_str(), kind.as_str(), progressive, special));
    }

    Ok(items)
}

/// Locations from `location_table`, one positional row per name
fn read_locations(path: &Path) -> Result<Vec<LocationRecord>, SourceError> {
    let table = read_table(path, "location_table")?;

    table
        .into_iter()
        .map(|(name, row)| match row {
            Value::Tuple(fields) | Value::List(fields) => Ok(LocationRecord::new(name, fields)),
            other => Err(SourceError::MalformedEntry {
                path: path.to_path_buf(),
                entry: name,
                reason: format!("expected a tuple, found {}", other.kind()),
            }),
        })
        .collect()
}
