//! Byte-level writer for small NetCDF classic files.
//!
//! Tests describe a file with [`ClassicFileBuilder`] and get back the exact
//! bytes a classic (or 64-bit offset) writer would produce: big-endian
//! header, fixed-size variables laid out contiguously after the header,
//! then the record section interleaved record by record.
//!
//! # Example
//!
//! ```
//! use test_utils::{ClassicFileBuilder, NcValues};
//!
//! let bytes = ClassicFileBuilder::new()
//!     .dimension("x", 3)
//!     .variable("v", &["x"], NcValues::Int(vec![1, 2, 3]))
//!     .build();
//! assert_eq!(&bytes[..4], b"CDF\x01");
//! ```

use std::io::Write;

const NC_DIMENSION: u32 = 0x0A;
const NC_VARIABLE: u32 = 0x0B;
const NC_ATTRIBUTE: u32 = 0x0C;
const STREAMING: u32 = 0xFFFF_FFFF;

/// Typed values for attributes and variable data.
#[derive(Debug, Clone, PartialEq)]
pub enum NcValues {
    Byte(Vec<i8>),
    /// Stored bytes, written as-is; text need not be UTF-8.
    Char(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl NcValues {
    pub fn type_code(&self) -> u32 {
        match self {
            Self::Byte(_) => 1,
            Self::Char(_) => 2,
            Self::Short(_) => 3,
            Self::Int(_) => 4,
            Self::Float(_) => 5,
            Self::Double(_) => 6,
        }
    }

    pub fn element_size(&self) -> usize {
        match self {
            Self::Byte(_) | Self::Char(_) => 1,
            Self::Short(_) => 2,
            Self::Int(_) | Self::Float(_) => 4,
            Self::Double(_) => 8,
        }
    }

    /// Element count; for `Char` this is the byte length.
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Char(s) => s.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn encode_range(&self, out: &mut Vec<u8>, start: usize, count: usize) {
        let range = start..start + count;
        match self {
            Self::Byte(v) => out.extend(v[range].iter().map(|&b| b as u8)),
            Self::Char(s) => out.extend_from_slice(&s[range]),
            Self::Short(v) => v[range].iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
            Self::Int(v) => v[range].iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
            Self::Float(v) => v[range].iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
            Self::Double(v) => v[range].iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.encode_range(out, 0, self.len());
    }
}

#[derive(Debug, Clone)]
struct VariableSpec {
    name: String,
    dims: Vec<String>,
    attributes: Vec<(String, NcValues)>,
    data: NcValues,
}

/// Builder for an in-memory NetCDF classic file.
///
/// Record variables take the data of every record concatenated in record
/// order. The record count written to the header is set with
/// [`ClassicFileBuilder::records`], or replaced by the streaming sentinel
/// with [`ClassicFileBuilder::streaming`].
#[derive(Debug, Clone, Default)]
pub struct ClassicFileBuilder {
    sixty_four_bit: bool,
    streaming: bool,
    records: u32,
    dimensions: Vec<(String, u32)>,
    global_attributes: Vec<(String, NcValues)>,
    variables: Vec<VariableSpec>,
}

impl ClassicFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the 64-bit offset variant (version byte 2, 8-byte `begin`).
    pub fn sixty_four_bit(mut self) -> Self {
        self.sixty_four_bit = true;
        self
    }

    /// Write the streaming sentinel instead of the record count.
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub fn records(mut self, count: u32) -> Self {
        self.records = count;
        self
    }

    pub fn dimension(mut self, name: &str, length: u32) -> Self {
        self.dimensions.push((name.to_string(), length));
        self
    }

    pub fn unlimited_dimension(self, name: &str) -> Self {
        self.dimension(name, 0)
    }

    pub fn global_attribute(mut self, name: &str, values: NcValues) -> Self {
        self.global_attributes.push((name.to_string(), values));
        self
    }

    pub fn variable(self, name: &str, dims: &[&str], data: NcValues) -> Self {
        self.variable_with_attributes(name, dims, Vec::new(), data)
    }

    pub fn variable_with_attributes(
        mut self,
        name: &str,
        dims: &[&str],
        attributes: Vec<(&str, NcValues)>,
        data: NcValues,
    ) -> Self {
        self.variables.push(VariableSpec {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: attributes
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
            data,
        });
        self
    }

    /// Encode only the header, with `begin` offsets computed for the data
    /// layout [`ClassicFileBuilder::build`] would produce.
    pub fn header_bytes(&self) -> Vec<u8> {
        self.encode_header(&self.begins())
    }

    /// Encode the complete file.
    ///
    /// # Panics
    ///
    /// Panics if a variable names an undeclared dimension or its data
    /// length does not match its shape.
    pub fn build(&self) -> Vec<u8> {
        let n = self.variables.len();
        let record_vars: Vec<usize> = (0..n).filter(|&i| self.is_record(i)).collect();
        let single_record_var = record_vars.len() == 1;

        let mut out = self.header_bytes();
        for i in (0..n).filter(|&i| !self.is_record(i)) {
            let var = &self.variables[i];
            let expected = self.slab_elements(i);
            assert_eq!(
                var.data.len() as u64,
                expected,
                "variable '{}' needs {} values",
                var.name,
                expected
            );
            var.data.encode(&mut out);
            pad(&mut out);
        }

        for record in 0..self.records as u64 {
            for &i in &record_vars {
                let var = &self.variables[i];
                let per_record = self.slab_elements(i);
                assert!(
                    var.data.len() as u64 >= (record + 1) * per_record,
                    "record variable '{}' needs {} values per record",
                    var.name,
                    per_record
                );
                var.data
                    .encode_range(&mut out, (record * per_record) as usize, per_record as usize);
                if !single_record_var {
                    pad(&mut out);
                }
            }
        }
        out
    }

    /// Encode and write the file to a fresh temporary file.
    pub fn write_temp(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(".nc").tempfile()?;
        file.write_all(&self.build())?;
        file.flush()?;
        Ok(file)
    }

    fn begins(&self) -> Vec<u64> {
        let n = self.variables.len();
        let header_len = self.encode_header(&vec![0; n]).len() as u64;
        let record_vars: Vec<usize> = (0..n).filter(|&i| self.is_record(i)).collect();

        let mut begins = vec![0u64; n];
        let mut offset = header_len;
        for i in (0..n).filter(|&i| !self.is_record(i)) {
            begins[i] = offset;
            offset += round_up_to_4(self.slab_bytes(i));
        }
        for &i in &record_vars {
            begins[i] = offset;
            offset += if record_vars.len() == 1 {
                self.slab_bytes(i)
            } else {
                round_up_to_4(self.slab_bytes(i))
            };
        }
        begins
    }

    fn dimension_id(&self, name: &str) -> usize {
        self.dimensions
            .iter()
            .position(|(n, _)| n == name)
            .unwrap_or_else(|| panic!("undeclared dimension '{}'", name))
    }

    fn lengths(&self, i: usize) -> Vec<u64> {
        self.variables[i]
            .dims
            .iter()
            .map(|d| self.dimensions[self.dimension_id(d)].1 as u64)
            .collect()
    }

    fn is_record(&self, i: usize) -> bool {
        self.lengths(i).first() == Some(&0)
    }

    /// Elements of a fixed variable, or of one record of a record variable.
    fn slab_elements(&self, i: usize) -> u64 {
        let lengths = self.lengths(i);
        let skip = usize::from(self.is_record(i));
        lengths.iter().skip(skip).product()
    }

    fn slab_bytes(&self, i: usize) -> u64 {
        self.slab_elements(i) * self.variables[i].data.element_size() as u64
    }

    fn encode_header(&self, begins: &[u64]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"CDF");
        out.push(if self.sixty_four_bit { 2 } else { 1 });
        put_u32(
            &mut out,
            if self.streaming { STREAMING } else { self.records },
        );

        if self.dimensions.is_empty() {
            out.extend_from_slice(&[0; 8]);
        } else {
            put_u32(&mut out, NC_DIMENSION);
            put_u32(&mut out, self.dimensions.len() as u32);
            for (name, length) in &self.dimensions {
                put_name(&mut out, name);
                put_u32(&mut out, *length);
            }
        }

        put_attributes(&mut out, &self.global_attributes);

        if self.variables.is_empty() {
            out.extend_from_slice(&[0; 8]);
        } else {
            put_u32(&mut out, NC_VARIABLE);
            put_u32(&mut out, self.variables.len() as u32);
            for (i, var) in self.variables.iter().enumerate() {
                put_name(&mut out, &var.name);
                put_u32(&mut out, var.dims.len() as u32);
                for dim in &var.dims {
                    put_u32(&mut out, self.dimension_id(dim) as u32);
                }
                put_attributes(&mut out, &var.attributes);
                put_u32(&mut out, var.data.type_code());
                put_u32(&mut out, round_up_to_4(self.slab_bytes(i)) as u32);
                if self.sixty_four_bit {
                    out.extend_from_slice(&begins[i].to_be_bytes());
                } else {
                    put_u32(&mut out, begins[i] as u32);
                }
            }
        }
        out
    }
}

fn round_up_to_4(n: u64) -> u64 {
    (n + 3) & !3
}

fn pad(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_name(out: &mut Vec<u8>, name: &str) {
    put_u32(out, name.len() as u32);
    out.extend_from_slice(name.as_bytes());
    pad(out);
}

fn put_attributes(out: &mut Vec<u8>, attributes: &[(String, NcValues)]) {
    if attributes.is_empty() {
        out.extend_from_slice(&[0; 8]);
        return;
    }
    put_u32(out, NC_ATTRIBUTE);
    put_u32(out, attributes.len() as u32);
    for (name, values) in attributes {
        put_name(out, name);
        put_u32(out, values.type_code());
        put_u32(out, values.len() as u32);
        values.encode(out);
        pad(out);
    }
}
