//! Data generators for variable contents.
//!
//! Every generator returns values in row-major order (row 0 first), the
//! order in which a variable's elements are stored on disk.

/// `0, 1, 2, ..., count - 1` as Int values.
pub fn sequential_ints(count: usize) -> Vec<i32> {
    (0..count as i32).collect()
}

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`, so a value read
/// back at `(x, y)` identifies the element it came from.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from 250K at the first cell towards 310K at the last,
/// increasing along both axes.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Packs `values` into shorts with `raw = round((value - offset) / scale)`.
///
/// Pair with `scale_factor`/`add_offset` attributes to build packed variables.
pub fn pack_shorts(values: &[f32], scale: f32, offset: f32) -> Vec<i16> {
    values
        .iter()
        .map(|v| ((v - offset) / scale).round() as i16)
        .collect()
}
