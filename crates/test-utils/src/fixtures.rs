//! Common NetCDF classic fixtures.
//!
//! Each function returns a [`ClassicFileBuilder`] so tests can tweak a
//! fixture (switch to 64-bit offsets, mark it streaming) before encoding.

use crate::builder::{ClassicFileBuilder, NcValues};
use crate::generators::{create_temperature_grid, sequential_ints};

/// Fixed-size `grid(y=2, x=3)` of Int holding 0..5 row-major.
pub fn fixed_grid() -> ClassicFileBuilder {
    ClassicFileBuilder::new()
        .dimension("x", 3)
        .dimension("y", 2)
        .variable("grid", &["y", "x"], NcValues::Int(sequential_ints(6)))
}

/// One record variable `temp(time, lat=2)` of Int over 3 records:
/// `[10, 11], [20, 21], [30, 31]`.
pub fn single_record_variable() -> ClassicFileBuilder {
    ClassicFileBuilder::new()
        .records(3)
        .unlimited_dimension("time")
        .dimension("lat", 2)
        .variable(
            "temp",
            &["time", "lat"],
            NcValues::Int(vec![10, 11, 20, 21, 30, 31]),
        )
}

/// Scalar Int variable `packed` holding raw 10 with
/// `scale_factor = 0.5` and `add_offset = 100`.
pub fn scaled_variable() -> ClassicFileBuilder {
    ClassicFileBuilder::new().variable_with_attributes(
        "packed",
        &[],
        vec![
            ("scale_factor", NcValues::Float(vec![0.5])),
            ("add_offset", NcValues::Int(vec![100])),
        ],
        NcValues::Int(vec![10]),
    )
}

/// Dimensions of [`air_temperature`].
pub mod air {
    pub const RECORDS: u32 = 2;
    pub const LAT: u32 = 3;
    pub const LON: u32 = 4;
    pub const FILL: i16 = -9999;
    pub const SCALE: f32 = 0.01;
    pub const OFFSET: f32 = 250.0;
}

/// A small gridded dataset in the usual CF shape:
///
/// ```text
/// dimensions: time = UNLIMITED (2), lat = 3, lon = 4
/// variables:
///   double time(time)          coordinate, stored in the record section
///   float  lat(lat)            coordinate
///   float  lon(lon)            coordinate
///   short  air(time, lat, lon) packed, scale 0.01, offset 250, fill -9999
///   byte   qc(time, lat)       record variable, slab padded to 4 bytes
/// ```
///
/// Raw `air` values are `record * 1000 + lat * 100 + lon`, except the
/// element at `(1, 2, 3)` which holds the fill value.
pub fn air_temperature() -> ClassicFileBuilder {
    use air::*;

    let mut raw: Vec<i16> = Vec::new();
    for t in 0..RECORDS as i16 {
        for y in 0..LAT as i16 {
            for x in 0..LON as i16 {
                raw.push(t * 1000 + y * 100 + x);
            }
        }
    }
    let last = raw.len() - 1;
    raw[last] = FILL;

    let lats: Vec<f32> = (0..LAT).map(|i| 10.0 + 5.0 * i as f32).collect();
    let lons: Vec<f32> = (0..LON).map(|i| -100.0 + 2.5 * i as f32).collect();

    ClassicFileBuilder::new()
        .records(RECORDS)
        .unlimited_dimension("time")
        .dimension("lat", LAT)
        .dimension("lon", LON)
        .global_attribute("title", NcValues::Char("synthetic air temperature".into()))
        .global_attribute("version", NcValues::Short(vec![1, 2, 3]))
        .variable_with_attributes(
            "time",
            &["time"],
            vec![("units", NcValues::Char("hours since 2000-01-01".into()))],
            NcValues::Double(vec![0.0, 6.0]),
        )
        .variable_with_attributes(
            "lat",
            &["lat"],
            vec![("units", NcValues::Char("degrees_north".into()))],
            NcValues::Float(lats),
        )
        .variable_with_attributes(
            "lon",
            &["lon"],
            vec![("units", NcValues::Char("degrees_east".into()))],
            NcValues::Float(lons),
        )
        .variable_with_attributes(
            "air",
            &["time", "lat", "lon"],
            vec![
                ("units", NcValues::Char("K".into())),
                ("scale_factor", NcValues::Float(vec![SCALE])),
                ("add_offset", NcValues::Float(vec![OFFSET])),
                ("_FillValue", NcValues::Short(vec![FILL])),
            ],
            NcValues::Short(raw),
        )
        .variable(
            "qc",
            &["time", "lat"],
            NcValues::Byte(vec![0, 1, 2, -1, -2, -3]),
        )
}

/// A fixed float field built from [`create_temperature_grid`], shaped
/// `surface(lat, lon)`.
pub fn surface_temperature(width: u32, height: u32) -> ClassicFileBuilder {
    ClassicFileBuilder::new()
        .dimension("lat", height)
        .dimension("lon", width)
        .variable(
            "surface",
            &["lat", "lon"],
            NcValues::Float(create_temperature_grid(width as usize, height as usize)),
        )
}
