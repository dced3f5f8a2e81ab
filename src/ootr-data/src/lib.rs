//! # ootr-data
//!
//! Portable data export for OOT-Randomizer.
//!
//! This library provides functionality to:
//! - Read the item registry and location table from an engine checkout
//! - Encode items and shape locations into engine-independent JSON
//! - Copy the logic rule files under normalized names
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ootr_data::SourceTree::open("OoT-Randomizer")?;
//! let summary = ootr_data::dump_all(&engine, std::path::Path::new("ootr-data"))?;
//!
//! println!("{} items, {} locations", summary.items, summary.locations);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod item;
pub mod location;
pub mod model;
pub mod pyliteral;
pub mod source;
pub mod value;

// Re-export commonly used items
#[doc(inline)]
pub use export::{dump_all, normalize_logic_filename, DumpError, DumpSummary};
#[doc(inline)]
pub use item::{encode_item, encode_items, EncodeError, PortableItem};
#[doc(inline)]
pub use location::{shape_location, shape_locations, PortableLocation, ShapeError};
#[doc(inline)]
pub use model::{EngineModel, ItemRecord, LocationRecord, LogicSources, LOCATION_COLUMNS};
#[doc(inline)]
pub use pyliteral::ParseError;
#[doc(inline)]
pub use source::{SourceError, SourceTree};
#[doc(inline)]
pub use value::{Dict, Value};
