//! Tests against real NetCDF classic files.
//!
//! These files are not committed. Drop them into `crates/netcdf-classic/testdata/`
//! or point `TEST_DATA_DIR` at a directory holding them; tests skip otherwise.
//!
//! `sresa1b_ncar_ccsm3-example.nc` is the Unidata CCSM3 sample file.

use std::collections::HashMap;

use netcdf_classic::FormatVersion;
use test_utils::require_test_file;

#[test]
fn test_ccsm3_header() {
    let path = require_test_file!("sresa1b_ncar_ccsm3-example.nc");
    let file = netcdf_classic::open(&path).expect("Failed to open CCSM3 sample");

    let header = file.header();
    assert_eq!(header.version, FormatVersion::Classic);
    let catalog = file.catalog();
    assert_eq!(catalog.record_dimension().map(|d| d.name.as_str()), Some("time"));
    assert!(catalog.variable("tas").is_some());
    assert!(catalog.coordinate_variable("lat").is_some());
}

#[test]
fn test_ccsm3_surface_temperature_grid() {
    let path = require_test_file!("sresa1b_ncar_ccsm3-example.nc");
    let mut file = netcdf_classic::open(&path).expect("Failed to open CCSM3 sample");

    let mut fixed = HashMap::new();
    fixed.insert("time".to_string(), 0);
    let grid = file
        .extract_grid("tas", "lon", "lat", &fixed)
        .expect("Failed to extract tas");

    assert_eq!(grid.width, file.catalog().dimension("lon").unwrap().length as usize);
    assert_eq!(grid.height, file.catalog().dimension("lat").unwrap().length as usize);
    // Near-surface air temperature in Kelvin
    assert!(grid.values.iter().all(|v| (180.0..340.0).contains(v)));
}
