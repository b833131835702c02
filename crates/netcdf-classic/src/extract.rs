//! 2-D slice extraction over two named dimensions of a variable.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::ReaderConfig;
use crate::error::{NetCdfError, NetCdfResult};
use crate::layout::{Layout, ValueTransform, VariableLayout};

/// Decoded 2-D grid, row-major: row 0 is y index 0, x increases along a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl Grid {
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            self.values.get(y * self.width + x).copied()
        } else {
            None
        }
    }

    pub fn row(&self, y: usize) -> Option<&[f64]> {
        if y < self.height {
            Some(&self.values[y * self.width..(y + 1) * self.width])
        } else {
            None
        }
    }

    /// Nested row representation.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.height)
            .map(|y| self.values[y * self.width..(y + 1) * self.width].to_vec())
            .collect()
    }
}

/// Everything needed to read one grid, resolved against the catalog.
#[derive(Debug, Clone)]
pub struct GridPlan {
    pub layout: VariableLayout,
    pub transform: ValueTransform,
    pub x_axis: usize,
    pub y_axis: usize,
    /// Full index tuple with the fixed coordinates filled in; x and y are 0.
    pub base_index: Vec<u64>,
    pub width: usize,
    pub height: usize,
}

impl GridPlan {
    /// Resolve `variable`, the two spatial dimensions and the fixed indices
    /// for every other dimension into a read plan.
    pub fn resolve(
        catalog: &Catalog<'_>,
        layout: &Layout<'_>,
        config: &ReaderConfig,
        variable: &str,
        x_dim: &str,
        y_dim: &str,
        fixed_indices: &HashMap<String, u64>,
    ) -> NetCdfResult<Self> {
        let var = catalog.require_variable(variable)?;
        if x_dim == y_dim {
            return Err(NetCdfError::lookup(format!(
                "x and y must be different dimensions, both are {:?}",
                x_dim
            )));
        }

        let names = catalog.dimension_names(var);
        let axis_of = |dim: &str| {
            names.iter().position(|&n| n == dim).ok_or_else(|| {
                NetCdfError::lookup(format!(
                    "dimension {:?} is not a dimension of variable {:?} ({})",
                    dim,
                    variable,
                    names.join(", ")
                ))
            })
        };
        let x_axis = axis_of(x_dim)?;
        let y_axis = axis_of(y_dim)?;

        let var_layout = layout.variable(var);
        let mut base_index = vec![0u64; names.len()];
        for (axis, name) in names.iter().enumerate() {
            if axis == x_axis || axis == y_axis {
                continue;
            }
            let index = *fixed_indices.get(*name).ok_or_else(|| {
                NetCdfError::lookup(format!(
                    "no fixed index given for dimension {:?} of variable {:?}",
                    name, variable
                ))
            })?;
            if index >= var_layout.shape[axis] {
                return Err(NetCdfError::lookup(format!(
                    "fixed index {} out of range for dimension {:?} of length {}",
                    index, name, var_layout.shape[axis]
                )));
            }
            base_index[axis] = index;
        }

        Ok(Self {
            width: var_layout.shape[x_axis] as usize,
            height: var_layout.shape[y_axis] as usize,
            transform: ValueTransform::for_variable(var, config),
            layout: var_layout,
            x_axis,
            y_axis,
            base_index,
        })
    }

    /// Index tuple for grid cell `(x, y)`.
    pub fn index(&self, x: usize, y: usize) -> Vec<u64> {
        let mut index = self.base_index.clone();
        index[self.x_axis] = x as u64;
        index[self.y_axis] = y as u64;
        index
    }

    /// Whether consecutive x positions are adjacent elements on disk.
    pub fn rows_are_contiguous(&self) -> bool {
        self.layout.strides[self.x_axis] == 1
    }
}
