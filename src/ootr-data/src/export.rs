//! Dump pipeline.
//!
//! Writes the portable data set for one engine into an output root:
//!
//! ```text
//! <output>/
//!   data/items.json
//!   data/locations.json
//!   logic/glitchless/<region>.json
//!   logic/glitched/<region>.json
//!   logic/helpers.json
//! ```
//!
//! The output root is wiped before anything is written. Logic files are
//! copied byte for byte under normalized names.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::item::{encode_items, EncodeError};
use crate::location::{shape_locations, ShapeError};
use crate::model::EngineModel;

pub const ITEMS_FILE: &str = "data/items.json";
pub const LOCATIONS_FILE: &str = "data/locations.json";
pub const GLITCHLESS_DIR: &str = "logic/glitchless";
pub const GLITCHED_DIR: &str = "logic/glitched";
pub const HELPERS_FILE: &str = "logic/helpers.json";

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("logic file name is not valid UTF-8: {}", path.display())]
    NonUtf8FileName { path: PathBuf },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DumpError + '_ {
    move |source| DumpError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What a dump run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub version: String,
    pub items: usize,
    pub locations: usize,
    /// Region files copied across both logic sets
    pub logic_files: usize,
    pub items_sha256: String,
    pub locations_sha256: String,
}

/// Lowercase a logic file name and replace spaces with hyphens
///
/// ```
/// use ootr_data::export::normalize_logic_filename;
///
/// assert_eq!(normalize_logic_filename("Spirit Temple MQ.json"), "spirit-temple-mq.json");
/// ```
pub fn normalize_logic_filename(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Remove any previous output and create the directory skeleton
pub fn prepare_output(root: &Path) -> Result<(), DumpError> {
    if root.exists() {
        info!("Cleaning {}", root.display());
        fs::remove_dir_all(root).map_err(io_error(root))?;
    }

    for dir in ["data", GLITCHLESS_DIR, GLITCHED_DIR] {
        let path = root.join(dir);
        fs::create_dir_all(&path).map_err(io_error(&path))?;
    }

    Ok(())
}

/// Serialize `value` as 2-space indented JSON and return the file's SHA-256
///
/// Nothing is written when serialization fails.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<String, DumpError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| DumpError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, &json).map_err(io_error(path))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn copy_file(src: &Path, dest: &Path) -> Result<(), DumpError> {
    debug!("Copying {} to {}", src.display(), dest.display());
    let mut reader = File::open(src).map_err(io_error(src))?;
    let mut writer = File::create(dest).map_err(io_error(dest))?;
    io::copy(&mut reader, &mut writer).map_err(io_error(dest))?;
    Ok(())
}

/// Copy the files directly under `src` into `dest`, normalizing names
///
/// Symlinks are followed and copied under the link's name. Returns the number
/// of files copied.
pub fn copy_logic_dir(src: &Path, dest: &Path) -> Result<usize, DumpError> {
    info!("Copying {} to {}", src.display(), dest.display());

    let mut copied = 0;
    for entry in WalkDir::new(src)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            DumpError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            warn!("Skipping {}: not a regular file", entry.path().display());
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            return Err(DumpError::NonUtf8FileName {
                path: entry.path().to_path_buf(),
            });
        };
        copy_file(entry.path(), &dest.join(normalize_logic_filename(name)))?;
        copied += 1;
    }

    Ok(copied)
}

/// Write the full data set for `model` under `output`
pub fn dump_all<M: EngineModel + ?Sized>(
    model: &M,
    output: &Path,
) -> Result<DumpSummary, DumpError> {
    info!("Dumping from OOT-Randomizer v{}", model.version());
    prepare_output(output)?;

    let items_path = output.join(ITEMS_FILE);
    info!("Dumping items to {}", items_path.display());
    let items = encode_items(model.items())?;
    let items_sha256 = write_json(&items_path, &items)?;

    let locations_path = output.join(LOCATIONS_FILE);
    info!("Dumping locations to {}", locations_path.display());
    let locations = shape_locations(model.locations())?;
    let locations_sha256 = write_json(&locations_path, &locations)?;

    let sources = model.logic_sources();
    let mut logic_files = copy_logic_dir(&sources.glitchless, &output.join(GLITCHLESS_DIR))?;
    logic_files += copy_logic_dir(&sources.glitched, &output.join(GLITCHED_DIR))?;

    let helpers_path = output.join(HELPERS_FILE);
    info!("Copying {} to {}", sources.helpers.display(), helpers_path.display());
    copy_file(&sources.helpers, &helpers_path)?;

    let summary = DumpSummary {
        version: model.version().to_string(),
        items: items.len(),
        locations: locations.len(),
        logic_files,
        items_sha256,
        locations_sha256,
    };
    debug!(?summary, "Dump complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict;
    use crate::model::{ItemRecord, LocationRecord, LogicSources};
    use crate::source::{fixtures, SourceTree};
    use crate::value::Value;

    struct StubEngine {
        root: PathBuf,
        items: Vec<ItemRecord>,
        locations: Vec<LocationRecord>,
    }

    impl StubEngine {
        /// An engine with empty tables and a logic tree under `root`
        fn new(root: &Path) -> Self {
            fs::create_dir_all(root.join("World")).unwrap();
            fs::create_dir_all(root.join("Glitched")).unwrap();
            fs::write(root.join("helpers.json"), "{}").unwrap();
            Self {
                root: root.to_path_buf(),
                items: Vec::new(),
                locations: Vec::new(),
            }
        }
    }

    impl EngineModel for StubEngine {
        fn version(&self) -> &str {
            "0.0.0-stub"
        }

        fn items(&self) -> &[ItemRecord] {
            &self.items
        }

        fn locations(&self) -> &[LocationRecord] {
            &self.locations
        }

        fn logic_sources(&self) -> LogicSources {
            LogicSources {
                glitchless: self.root.join("World"),
                glitched: self.root.join("Glitched"),
                helpers: self.root.join("helpers.json"),
            }
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn dump_fixture() -> (tempfile::TempDir, DumpSummary) {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_tree(&dir.path().join("engine"));
        let tree = SourceTree::open(dir.path().join("engine")).unwrap();
        let summary = dump_all(&tree, &dir.path().join("out")).unwrap();
        (dir, summary)
    }

    #[test]
    fn test_normalize_logic_filename() {
        assert_eq!(normalize_logic_filename("Spirit Temple.json"), "spirit-temple.json");
        assert_eq!(normalize_logic_filename("Overworld.json"), "overworld.json");
        assert_eq!(normalize_logic_filename("Ice Cavern MQ.json"), "ice-cavern-mq.json");
    }

    #[test]
    fn test_fixture_layout() {
        let (dir, summary) = dump_fixture();
        let out = dir.path().join("out");

        assert_eq!(summary.version, "8.1.0");
        assert_eq!(summary.items, 7);
        assert_eq!(summary.locations, 5);
        assert_eq!(summary.logic_files, 3);

        for file in [
            "data/items.json",
            "data/locations.json",
            "logic/glitchless/spirit-temple.json",
            "logic/glitchless/deku-tree.json",
            "logic/glitched/deku-tree.json",
            "logic/helpers.json",
        ] {
            assert!(out.join(file).is_file(), "{file} missing");
        }
    }

    #[test]
    fn test_logic_files_are_byte_copies() {
        let (dir, _) = dump_fixture();
        let out = dir.path().join("out");

        assert_eq!(
            fs::read(out.join("logic/glitchless/spirit-temple.json")).unwrap(),
            fixtures::SPIRIT_TEMPLE_JSON.as_bytes()
        );
        assert_eq!(
            fs::read(out.join("logic/glitched/deku-tree.json")).unwrap(),
            fixtures::GLITCHED_DEKU_TREE_JSON.as_bytes()
        );
        assert_eq!(
            fs::read(out.join("logic/helpers.json")).unwrap(),
            fixtures::LOGIC_HELPERS_JSON.as_bytes()
        );
    }

    #[test]
    fn test_items_json() {
        let (dir, _) = dump_fixture();
        let items = read_json(&dir.path().join("out/data/items.json"));
        let items = items.as_array().unwrap();
        assert_eq!(items.len(), 7);

        for item in items {
            let mut keys: Vec<_> = item.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            assert_eq!(keys, vec!["advancement", "name", "priority", "special", "type"]);
        }

        assert_eq!(items[0]["name"], "Bombs (5)");
        assert_eq!(items[2]["special"], serde_json::json!({"bottle": -1}));
        assert_eq!(
            items[5],
            serde_json::json!({
                "name": "Heart Container",
                "advancement": false,
                "priority": true,
                "type": "Item",
                "special": {
                    "alias": {"name": "Piece of Heart", "value": 4},
                    "progressive": -1,
                },
            })
        );
        assert_eq!(items[6]["special"], serde_json::json!({}));
    }

    #[test]
    fn test_locations_json() {
        let (dir, _) = dump_fixture();
        let locations = read_json(&dir.path().join("out/data/locations.json"));
        let locations = locations.as_array().unwrap();
        assert_eq!(locations.len(), 5);

        assert_eq!(
            locations[3],
            serde_json::json!({
                "name": "KF Shop Item 1",
                "type": "Shop",
                "vanilla": "Buy Deku Shield",
                "categories": ["Kokiri Forest", "Forest", "Shops"],
            })
        );
        assert_eq!(locations[0]["categories"], serde_json::Value::Null);
    }

    #[test]
    fn test_two_space_indent() {
        let (dir, _) = dump_fixture();
        let text = fs::read_to_string(dir.path().join("out/data/items.json")).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Bombs (5)\""));
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_tree(&dir.path().join("engine"));
        let tree = SourceTree::open(dir.path().join("engine")).unwrap();
        let out = dir.path().join("out");

        let first = dump_all(&tree, &out).unwrap();
        let items = fs::read(out.join(ITEMS_FILE)).unwrap();
        let second = dump_all(&tree, &out).unwrap();

        assert_eq!(first, second);
        assert_eq!(items, fs::read(out.join(ITEMS_FILE)).unwrap());
    }

    #[test]
    fn test_digest_matches_written_file() {
        let (dir, summary) = dump_fixture();
        let bytes = fs::read(dir.path().join("out/data/locations.json")).unwrap();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        assert_eq!(summary.locations_sha256, hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_stale_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("logic/glitchless")).unwrap();
        fs::write(out.join("logic/glitchless/removed-region.json"), "[]").unwrap();

        let engine = StubEngine::new(&dir.path().join("engine"));
        dump_all(&engine, &out).unwrap();

        assert!(!out.join("logic/glitchless/removed-region.json").exists());
        assert_eq!(read_json(&out.join(ITEMS_FILE)), serde_json::json!([]));
        assert_eq!(read_json(&out.join(LOCATIONS_FILE)), serde_json::json!([]));
    }

    #[test]
    fn test_subdirectories_are_not_copied() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(&dir.path().join("engine"));
        fs::create_dir_all(engine.root.join("World/Nested")).unwrap();
        fs::write(engine.root.join("World/Nested/Inner.json"), "[]").unwrap();
        fs::write(engine.root.join("World/Market.json"), "[]").unwrap();

        let out = dir.path().join("out");
        let summary = dump_all(&engine, &out).unwrap();

        assert_eq!(summary.logic_files, 1);
        assert!(out.join("logic/glitchless/market.json").is_file());
        assert!(!out.join("logic/glitchless/nested").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_logic_files_are_copied() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(&dir.path().join("engine"));
        fs::write(dir.path().join("shared.json"), "[1]").unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("shared.json"),
            engine.root.join("World/Water Temple.json"),
        )
        .unwrap();

        let out = dir.path().join("out");
        let summary = dump_all(&engine, &out).unwrap();

        assert_eq!(summary.logic_files, 1);
        assert_eq!(fs::read(out.join("logic/glitchless/water-temple.json")).unwrap(), b"[1]");
    }

    #[test]
    fn test_copy_error_names_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Market.json");
        fs::write(&src, "[]").unwrap();
        let dest = dir.path().join("missing/market.json");

        let err = copy_file(&src, &dest).unwrap_err();
        assert!(matches!(err, DumpError::Io { ref path, .. } if *path == dest));
    }

    #[test]
    fn test_copy_error_names_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Missing.json");

        let err = copy_file(&src, &dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, DumpError::Io { ref path, .. } if *path == src));
    }

    #[test]
    fn test_uncapped_outside_capped_keys_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = StubEngine::new(&dir.path().join("engine"));
        engine.items.push(ItemRecord::from_table_row(
            "Bombchus",
            "Item",
            Some(true),
            Some(dict! { "price" => Value::Uncapped }),
        ));

        let out = dir.path().join("out");
        let err = dump_all(&engine, &out).unwrap_err();
        assert!(matches!(err, DumpError::Json { ref path, .. } if path.ends_with("items.json")));
        assert!(!out.join(ITEMS_FILE).exists());
    }

    #[test]
    fn test_missing_type_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = StubEngine::new(&dir.path().join("engine"));
        engine.locations.push(LocationRecord::new("Nowhere", vec![]));

        let err = dump_all(&engine, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, DumpError::Shape(ShapeError::MissingType { .. })));
    }

    #[test]
    fn test_missing_logic_dir() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::new(&dir.path().join("engine"));
        fs::remove_dir_all(engine.root.join("Glitched")).unwrap();

        let err = dump_all(&engine, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, DumpError::Io { .. }));
    }
}
