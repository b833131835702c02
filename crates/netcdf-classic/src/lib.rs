//! Reader for NetCDF classic and 64-bit offset files.
//!
//! The header is decoded once on open into an immutable [`Header`]. Data
//! elements are then addressed directly from the variable's `begin` offset,
//! the dimension product vector and, for variables stored in the record
//! section, the record size.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! let mut file = netcdf_classic::open("air.nc")?;
//! let mut fixed = HashMap::new();
//! fixed.insert("time".to_string(), 0);
//! let grid = file.extract_grid("air", "lon", "lat", &fixed)?;
//! println!("{} x {}", grid.width, grid.height);
//! # Ok::<(), netcdf_classic::NetCdfError>(())
//! ```
//!
//! NetCDF-4 (HDF5-based) files are not supported.

pub mod catalog;
pub mod config;
pub mod cursor;
pub mod error;
pub mod extract;
pub mod file;
pub mod grammar;
pub mod header;
pub mod layout;
pub mod types;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use catalog::Catalog;
pub use config::ReaderConfig;
pub use cursor::{ByteCursor, Checkpoint};
pub use error::{ErrorKind, NetCdfError, NetCdfResult};
pub use extract::Grid;
pub use file::NetCdfFile;
pub use header::Header;
pub use layout::{Layout, ValueTransform, VariableLayout};
pub use types::{
    Attribute, AttributeValue, Dimension, ElementType, FormatVersion, RecordCount, Variable,
};

/// Open a file with the default reader configuration.
pub fn open(path: impl AsRef<Path>) -> NetCdfResult<NetCdfFile<BufReader<File>>> {
    NetCdfFile::open(path)
}
