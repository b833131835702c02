//! Data addressing: turns a logical index tuple into a file offset.
//!
//! Fixed-size variables are stored contiguously from their own `begin`
//! offset in row-major order. Variables whose leading dimension is the
//! unlimited one are interleaved record by record: each record holds one
//! slab of every such variable, in declared order, each slab padded to a
//! 4-byte boundary. The padding is omitted when the record section holds a
//! single variable.
//!
//! ```text
//! elem_offset = sum(idx[i] * P[i])          P[0] = 0 for record variables
//! byte_offset = begin + elem_offset * element_size
//!             + idx[0] * record_size        record variables only
//! ```

use crate::catalog::Catalog;
use crate::config::ReaderConfig;
use crate::cursor::round_up_to_4;
use crate::error::{NetCdfError, NetCdfResult};
use crate::header::Header;
use crate::types::{ElementType, RecordCount, Variable};

/// Row-major strides over `lengths`: `P[k-1] = 1`, `P[i] = P[i+1] * L[i+1]`.
pub fn product_vector(lengths: &[u64]) -> Vec<u64> {
    let mut strides = vec![1u64; lengths.len()];
    for i in (0..lengths.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * lengths[i + 1];
    }
    strides
}

/// Elements in one record slab of a variable with the given declared lengths.
pub fn per_record_elements(lengths: &[u64]) -> u64 {
    lengths.iter().skip(1).product()
}

/// Addressing parameters of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLayout {
    pub element_type: ElementType,
    pub data_start: u64,
    /// Dimension lengths with the unlimited dimension replaced by the record count.
    pub shape: Vec<u64>,
    /// Product vector; the record axis stride is 0.
    pub strides: Vec<u64>,
    /// Bytes between consecutive records, for variables in the record section.
    pub record_size: Option<u64>,
}

impl VariableLayout {
    pub fn element_size(&self) -> u64 {
        self.element_type.size() as u64
    }

    pub fn is_record(&self) -> bool {
        self.record_size.is_some()
    }

    /// Byte offset of the element at `index`.
    pub fn offset(&self, index: &[u64]) -> NetCdfResult<u64> {
        if index.len() != self.shape.len() {
            return Err(NetCdfError::lookup(format!(
                "index has {} coordinates but the variable has {} dimensions",
                index.len(),
                self.shape.len()
            )));
        }
        if let Some(axis) = (0..index.len()).find(|&i| index[i] >= self.shape[i]) {
            return Err(NetCdfError::lookup(format!(
                "index {} out of range for axis {} of length {}",
                index[axis], axis, self.shape[axis]
            )));
        }

        let elements = index
            .iter()
            .zip(&self.strides)
            .try_fold(0u64, |acc, (i, p)| acc.checked_add(i.checked_mul(*p)?));
        let mut offset = elements
            .and_then(|n| n.checked_mul(self.element_size()))
            .and_then(|bytes| bytes.checked_add(self.data_start));
        if let Some(record_size) = self.record_size {
            offset = offset.and_then(|o| o.checked_add(index[0].checked_mul(record_size)?));
        }
        offset.ok_or_else(|| NetCdfError::format("element offset overflows"))
    }
}

/// File-wide addressing state: record size and effective record count.
#[derive(Debug, Clone)]
pub struct Layout<'a> {
    catalog: Catalog<'a>,
    record_size: u64,
    record_count: u64,
}

impl<'a> Layout<'a> {
    /// Build the layout for `header`. `file_len` is only consulted when the
    /// header carries the streaming record count and inference is enabled.
    pub fn new(header: &'a Header, file_len: u64, config: &ReaderConfig) -> Self {
        let catalog = Catalog::new(header);
        let record_size = compute_record_size(&catalog);
        let record_count = match header.record_count {
            RecordCount::Known(n) => n as u64,
            RecordCount::Streaming if config.infer_streaming_records => {
                infer_record_count(&catalog, record_size, file_len)
            }
            RecordCount::Streaming => 0,
        };
        Self {
            catalog,
            record_size,
            record_count,
        }
    }

    pub fn record_size(&self) -> u64 {
        self.record_size
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Length used for iteration bounds: the unlimited dimension counts records.
    pub fn effective_length(&self, dim_id: usize) -> u64 {
        let dim = &self.catalog.header().dimensions[dim_id];
        if dim.is_unlimited() {
            self.record_count
        } else {
            dim.length as u64
        }
    }

    pub fn variable(&self, var: &Variable) -> VariableLayout {
        let dims = self.catalog.dimensions_of(var);
        let declared: Vec<u64> = dims.iter().map(|d| d.length as u64).collect();
        let in_records = self.catalog.is_stored_in_records(var);

        let mut strides = product_vector(&declared);
        if in_records {
            strides[0] = 0;
        }

        VariableLayout {
            element_type: var.element_type,
            data_start: var.data_start,
            shape: var.dim_ids.iter().map(|&id| self.effective_length(id)).collect(),
            strides,
            record_size: in_records.then_some(self.record_size),
        }
    }
}

fn slab_bytes(catalog: &Catalog<'_>, var: &Variable) -> u64 {
    let lengths: Vec<u64> = catalog
        .dimensions_of(var)
        .iter()
        .map(|d| d.length as u64)
        .collect();
    per_record_elements(&lengths) * var.element_type.size() as u64
}

/// Sum of every record-section variable's padded slab size.
pub fn compute_record_size(catalog: &Catalog<'_>) -> u64 {
    let vars = catalog.record_section_variables();
    match vars.as_slice() {
        [] => 0,
        [only] => slab_bytes(catalog, only),
        _ => vars
            .iter()
            .map(|v| round_up_to_4(slab_bytes(catalog, v)))
            .sum(),
    }
}

/// `(file_len - first_record_start) / record_size`, or 0 without records.
pub fn infer_record_count(catalog: &Catalog<'_>, record_size: u64, file_len: u64) -> u64 {
    if record_size == 0 {
        return 0;
    }
    catalog
        .record_section_variables()
        .iter()
        .map(|v| v.data_start)
        .min()
        .map(|start| file_len.saturating_sub(start) / record_size)
        .unwrap_or(0)
}

/// Per-variable value conversion applied after a raw read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueTransform {
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub fill_value: Option<f64>,
}

impl ValueTransform {
    pub fn for_variable(var: &Variable, config: &ReaderConfig) -> Self {
        let numeric = |name: &str| var.attribute(name).and_then(|a| a.value.first_f64());
        let (scale_factor, add_offset) = if config.apply_scale_offset {
            (numeric("scale_factor"), numeric("add_offset"))
        } else {
            (None, None)
        };
        let fill_value = if config.mask_fill_values {
            numeric("_FillValue")
        } else {
            None
        };
        Self {
            scale_factor,
            add_offset,
            fill_value,
        }
    }

    /// Fill masking first, then scale, then offset.
    pub fn apply(&self, raw: f64) -> f64 {
        if self.fill_value == Some(raw) {
            return f64::NAN;
        }
        let mut value = raw;
        if let Some(scale) = self.scale_factor {
            value *= scale;
        }
        if let Some(offset) = self.add_offset {
            value += offset;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribute, AttributeValue, Dimension, FormatVersion};

    fn var(name: &str, dim_ids: Vec<usize>, ty: ElementType, data_start: u64) -> Variable {
        Variable {
            name: name.to_string(),
            dim_ids,
            attributes: vec![],
            element_type: ty,
            declared_size: 0,
            data_start,
        }
    }

    fn header(record_count: RecordCount, dims: &[(&str, u32)], variables: Vec<Variable>) -> Header {
        Header {
            version: FormatVersion::Classic,
            record_count,
            dimensions: dims
                .iter()
                .map(|(name, length)| Dimension {
                    name: name.to_string(),
                    length: *length,
                })
                .collect(),
            global_attributes: vec![],
            variables,
        }
    }

    #[test]
    fn test_product_vector() {
        assert_eq!(product_vector(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(product_vector(&[5]), vec![1]);
        assert!(product_vector(&[]).is_empty());
    }

    #[test]
    fn test_per_record_elements() {
        assert_eq!(per_record_elements(&[0, 2, 3]), 6);
        assert_eq!(per_record_elements(&[0]), 1);
    }

    #[test]
    fn test_fixed_variable_offsets() {
        let h = header(
            RecordCount::Known(0),
            &[("x", 3), ("y", 2)],
            vec![var("grid", vec![1, 0], ElementType::Int, 100)],
        );
        let layout = Layout::new(&h, 0, &ReaderConfig::default());
        let grid = layout.variable(&h.variables[0]);
        assert_eq!(grid.shape, vec![2, 3]);
        assert_eq!(grid.strides, vec![3, 1]);
        assert!(!grid.is_record());
        assert_eq!(grid.offset(&[0, 0]).unwrap(), 100);
        assert_eq!(grid.offset(&[1, 2]).unwrap(), 100 + 5 * 4);
    }

    #[test]
    fn test_single_record_variable() {
        let h = header(
            RecordCount::Known(3),
            &[("time", 0), ("lat", 2)],
            vec![var("temp", vec![0, 1], ElementType::Int, 200)],
        );
        let layout = Layout::new(&h, 0, &ReaderConfig::default());
        assert_eq!(layout.record_size(), 8);
        let temp = layout.variable(&h.variables[0]);
        assert_eq!(temp.shape, vec![3, 2]);
        assert_eq!(temp.strides, vec![0, 1]);
        assert_eq!(temp.offset(&[2, 1]).unwrap(), 200 + 4 + 2 * 8);
    }

    #[test]
    fn test_record_size_pads_each_slab() {
        let h = header(
            RecordCount::Known(2),
            &[("time", 0), ("lat", 3)],
            vec![
                var("temp", vec![0, 1], ElementType::Float, 300),
                var("flag", vec![0, 1], ElementType::Short, 312),
                var("time", vec![0], ElementType::Double, 320),
            ],
        );
        let layout = Layout::new(&h, 0, &ReaderConfig::default());
        // 3*4 + round4(3*2) + 8
        assert_eq!(layout.record_size(), 12 + 8 + 8);
        let flag = layout.variable(&h.variables[1]);
        assert_eq!(flag.offset(&[1, 2]).unwrap(), 312 + 2 * 2 + 28);
    }

    #[test]
    fn test_single_byte_record_variable_is_unpadded() {
        let h = header(
            RecordCount::Known(4),
            &[("time", 0), ("n", 3)],
            vec![var("code", vec![0, 1], ElementType::Char, 64)],
        );
        let layout = Layout::new(&h, 0, &ReaderConfig::default());
        assert_eq!(layout.record_size(), 3);
    }

    #[test]
    fn test_out_of_range_index() {
        let h = header(
            RecordCount::Known(1),
            &[("x", 3)],
            vec![var("v", vec![0], ElementType::Int, 0)],
        );
        let layout = Layout::new(&h, 0, &ReaderConfig::default());
        let v = layout.variable(&h.variables[0]);
        assert!(matches!(v.offset(&[3]), Err(NetCdfError::Lookup(_))));
        assert!(matches!(v.offset(&[0, 0]), Err(NetCdfError::Lookup(_))));
    }

    #[test]
    fn test_offset_past_u64_is_format_error() {
        let v = VariableLayout {
            element_type: ElementType::Double,
            data_start: u64::MAX - 8,
            shape: vec![u32::MAX as u64, 4],
            strides: vec![0, 1],
            record_size: Some(1 << 40),
        };
        assert_eq!(v.offset(&[0, 1]).unwrap(), u64::MAX);
        assert!(matches!(v.offset(&[0, 2]), Err(NetCdfError::Format(_))));
        assert!(matches!(v.offset(&[1 << 30, 0]), Err(NetCdfError::Format(_))));
    }

    #[test]
    fn test_streaming_record_count_inferred() {
        let h = header(
            RecordCount::Streaming,
            &[("time", 0), ("lat", 2)],
            vec![var("temp", vec![0, 1], ElementType::Int, 100)],
        );
        let layout = Layout::new(&h, 100 + 5 * 8 + 3, &ReaderConfig::default());
        assert_eq!(layout.record_count(), 5);

        let config = ReaderConfig {
            infer_streaming_records: false,
            ..Default::default()
        };
        assert_eq!(Layout::new(&h, 1000, &config).record_count(), 0);
    }

    #[test]
    fn test_value_transform_order() {
        let mut v = var("v", vec![], ElementType::Int, 0);
        v.attributes = vec![
            Attribute {
                name: "add_offset".into(),
                value: AttributeValue::Int(vec![100]),
            },
            Attribute {
                name: "scale_factor".into(),
                value: AttributeValue::Float(vec![0.5]),
            },
            Attribute {
                name: "_FillValue".into(),
                value: AttributeValue::Int(vec![-999]),
            },
        ];

        let transform = ValueTransform::for_variable(&v, &ReaderConfig::default());
        assert_eq!(transform.apply(10.0), 105.0);
        assert_eq!(transform.apply(-999.0), -399.5);

        let masking = ReaderConfig {
            mask_fill_values: true,
            ..Default::default()
        };
        assert!(ValueTransform::for_variable(&v, &masking).apply(-999.0).is_nan());

        let raw = ReaderConfig {
            apply_scale_offset: false,
            ..Default::default()
        };
        assert_eq!(ValueTransform::for_variable(&v, &raw).apply(10.0), 10.0);
    }

    #[test]
    fn test_transform_ignores_text_attributes() {
        let mut v = var("v", vec![], ElementType::Int, 0);
        v.attributes = vec![Attribute {
            name: "scale_factor".into(),
            value: AttributeValue::Char("oops".into()),
        }];
        let transform = ValueTransform::for_variable(&v, &ReaderConfig::default());
        assert_eq!(transform.apply(7.0), 7.0);
    }
}
