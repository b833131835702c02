//! End-to-end reads of synthetic files written by the test-utils builder.

use std::collections::HashMap;
use std::io::Cursor;

use netcdf_classic::{NetCdfError, NetCdfFile, ReaderConfig};
use test_utils::fixtures;

fn open_bytes(bytes: Vec<u8>) -> NetCdfFile<Cursor<Vec<u8>>> {
    NetCdfFile::from_reader(Cursor::new(bytes), ReaderConfig::default())
        .expect("Failed to open synthetic file")
}

// =============================================================================
// Fixed-size grid
// =============================================================================

#[test]
fn test_fixed_grid_extracts_row_major() {
    let mut file = open_bytes(fixtures::fixed_grid().build());
    let grid = file
        .extract_grid("grid", "x", "y", &HashMap::new())
        .expect("Failed to extract grid");

    assert_eq!(grid.width, 3);
    assert_eq!(grid.height, 2);
    assert_eq!(
        grid.rows(),
        vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]
    );
}

#[test]
fn test_fixed_grid_transposed() {
    let mut file = open_bytes(fixtures::fixed_grid().build());
    let grid = file
        .extract_grid("grid", "y", "x", &HashMap::new())
        .expect("Failed to extract grid");

    assert_eq!((grid.width, grid.height), (2, 3));
    assert_eq!(
        grid.rows(),
        vec![vec![0.0, 3.0], vec![1.0, 4.0], vec![2.0, 5.0]]
    );
}

#[test]
fn test_fixed_grid_from_disk() {
    let tmp = fixtures::fixed_grid()
        .write_temp()
        .expect("Failed to write temp file");
    let mut file = netcdf_classic::open(tmp.path()).expect("Failed to open file");
    assert_eq!(file.read_value("grid", &[1, 2]).unwrap(), 5.0);
}

// =============================================================================
// Record variables
// =============================================================================

#[test]
fn test_single_record_variable_value() {
    let mut file = open_bytes(fixtures::single_record_variable().build());
    assert_eq!(file.record_count(), 3);
    assert_eq!(file.read_value("temp", &[2, 1]).unwrap(), 31.0);
    assert_eq!(file.read_value("temp", &[0, 0]).unwrap(), 10.0);
    assert_eq!(file.read_value("temp", &[1, 1]).unwrap(), 21.0);
}

#[test]
fn test_record_variable_grid_over_time() {
    let mut file = open_bytes(fixtures::single_record_variable().build());
    let grid = file
        .extract_grid("temp", "lat", "time", &HashMap::new())
        .unwrap();
    assert_eq!(
        grid.rows(),
        vec![vec![10.0, 11.0], vec![20.0, 21.0], vec![30.0, 31.0]]
    );
}

#[test]
fn test_record_index_out_of_range() {
    let mut file = open_bytes(fixtures::single_record_variable().build());
    let err = file.read_value("temp", &[3, 0]).unwrap_err();
    assert!(matches!(err, NetCdfError::Lookup(_)));
}

#[test]
fn test_zero_records_gives_empty_grid() {
    let bytes = fixtures::single_record_variable().records(0).build();
    let mut file = open_bytes(bytes);
    let grid = file
        .extract_grid("temp", "lat", "time", &HashMap::new())
        .unwrap();
    assert_eq!((grid.width, grid.height), (2, 0));
    assert!(grid.values.is_empty());
}

// =============================================================================
// Scale and offset
// =============================================================================

#[test]
fn test_scale_and_offset_applied() {
    let mut file = open_bytes(fixtures::scaled_variable().build());
    assert_eq!(file.read_value("packed", &[]).unwrap(), 105.0);
}

#[test]
fn test_scale_and_offset_disabled() {
    let config = ReaderConfig {
        apply_scale_offset: false,
        ..Default::default()
    };
    let mut file =
        NetCdfFile::from_reader(Cursor::new(fixtures::scaled_variable().build()), config)
            .unwrap();
    assert_eq!(file.read_value("packed", &[]).unwrap(), 10.0);
}

// =============================================================================
// Lookup failures
// =============================================================================

#[test]
fn test_incomplete_fixed_indices() {
    let mut file = open_bytes(fixtures::air_temperature().build());
    let err = file
        .extract_grid("air", "lon", "lat", &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, NetCdfError::Lookup(_)), "got {:?}", err);
}

#[test]
fn test_unknown_variable() {
    let mut file = open_bytes(fixtures::fixed_grid().build());
    assert!(matches!(
        file.read_value("missing", &[0]),
        Err(NetCdfError::Lookup(_))
    ));
    assert!(matches!(
        file.extract_grid("missing", "x", "y", &HashMap::new()),
        Err(NetCdfError::Lookup(_))
    ));
}

#[test]
fn test_wrong_index_arity() {
    let mut file = open_bytes(fixtures::fixed_grid().build());
    assert!(matches!(
        file.read_value("grid", &[0]),
        Err(NetCdfError::Lookup(_))
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let config = ReaderConfig {
        max_list_elements: 0,
        ..Default::default()
    };
    let err = NetCdfFile::from_reader(Cursor::new(fixtures::fixed_grid().build()), config)
        .unwrap_err();
    assert!(matches!(err, NetCdfError::Config(_)));
}
