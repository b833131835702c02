//! Header decoding for the classic and 64-bit offset formats.
//!
//! The header is a fixed sequence:
//!
//! ```text
//! header    = magic numrecs dim_list gatt_list var_list
//! magic     = 'C' 'D' 'F' VERSION_BYTE
//! numrecs   = NON_NEG | STREAMING
//! dim_list  = ABSENT | NC_DIMENSION nelems [dim ...]
//! gatt_list = att_list
//! att_list  = ABSENT | NC_ATTRIBUTE nelems [attr ...]
//! var_list  = ABSENT | NC_VARIABLE nelems [var ...]
//! dim       = name dim_length
//! attr      = name nc_type nelems [values ...]
//! var       = name nelems [dimid ...] vatt_list nc_type vsize begin
//! ```
//!
//! `begin` is 32 bits wide in the classic format and 64 bits wide in the
//! 64-bit offset format, so the version is kept in hand until the variable
//! list is decoded.

use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Seek};

use serde::Serialize;
use tracing::debug;

use crate::cursor::ByteCursor;
use crate::error::{NetCdfError, NetCdfResult};
use crate::grammar::{
    read_alternatives, read_attribute_values, read_list_header, read_name, read_nelems,
    read_non_neg, read_tag, read_type_code, Alternative, NC_ATTRIBUTE, NC_DIMENSION,
    NC_VARIABLE, STREAMING,
};
use crate::types::{Attribute, Dimension, FormatVersion, RecordCount, Variable};

const MAGIC: &[u8; 3] = b"CDF";

/// The decoded file header. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub version: FormatVersion,
    pub record_count: RecordCount,
    pub dimensions: Vec<Dimension>,
    pub global_attributes: Vec<Attribute>,
    pub variables: Vec<Variable>,
}

impl Header {
    /// Decode a complete header starting at the cursor's current position.
    ///
    /// `limit` bounds every element count read from the file.
    pub fn decode<R: Read + Seek>(cursor: &mut ByteCursor<R>, limit: usize) -> NetCdfResult<Self> {
        let version = read_magic(cursor)?;
        let record_count = read_record_count(cursor)?;
        debug!(version = %version, record_count = ?record_count, "Decoded header preamble");

        let dimensions = read_dimensions(cursor, limit)?;
        debug!(count = dimensions.len(), "Decoded dimension list");

        let global_attributes = read_attributes(cursor, limit)?;
        debug!(count = global_attributes.len(), "Decoded global attribute list");

        let variables = read_variables(cursor, version, limit)?;
        debug!(
            count = variables.len(),
            header_end = cursor.position(),
            "Decoded variable list"
        );

        let header = Self {
            version,
            record_count,
            dimensions,
            global_attributes,
            variables,
        };
        header.check_references()?;
        Ok(header)
    }

    /// Structural checks that span more than one list.
    fn check_references(&self) -> NetCdfResult<()> {
        let mut seen = HashSet::new();
        for dim in &self.dimensions {
            if !seen.insert(dim.name.as_str()) {
                return Err(NetCdfError::format(format!(
                    "duplicate dimension name {:?}",
                    dim.name
                )));
            }
        }

        let unlimited = self.dimensions.iter().filter(|d| d.is_unlimited()).count();
        if unlimited > 1 {
            return Err(NetCdfError::format(format!(
                "{} unlimited dimensions, at most one is allowed",
                unlimited
            )));
        }

        for var in &self.variables {
            if let Some(&bad) = var.dim_ids.iter().find(|&&id| id >= self.dimensions.len()) {
                return Err(NetCdfError::format(format!(
                    "variable {:?} references dimension id {} but only {} dimensions exist",
                    var.name,
                    bad,
                    self.dimensions.len()
                )));
            }
            if var
                .dim_ids
                .iter()
                .skip(1)
                .any(|&id| self.dimensions[id].is_unlimited())
            {
                return Err(NetCdfError::format(format!(
                    "variable {:?} uses the unlimited dimension after its first axis",
                    var.name
                )));
            }
        }

        self.check_sizes()
    }

    /// Every slab and the record size must be addressable in 64 bits.
    fn check_sizes(&self) -> NetCdfResult<()> {
        let mut record_size = Some(0u64);
        for var in &self.variables {
            let in_records = var
                .dim_ids
                .first()
                .is_some_and(|&id| self.dimensions[id].is_unlimited());
            let slab = var
                .dim_ids
                .iter()
                .skip(usize::from(in_records))
                .try_fold(var.element_type.size() as u64, |acc, &id| {
                    acc.checked_mul(self.dimensions[id].length as u64)
                })
                .and_then(|bytes| bytes.checked_add(3));
            if slab.is_none() {
                return Err(NetCdfError::format(format!(
                    "variable {:?} size overflows",
                    var.name
                )));
            }
            if in_records {
                record_size = record_size
                    .zip(slab)
                    .and_then(|(total, padded)| total.checked_add(padded));
                if record_size.is_none() {
                    return Err(NetCdfError::format("record size overflows"));
                }
            }
        }
        Ok(())
    }
}

fn read_magic<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> NetCdfResult<FormatVersion> {
    if !read_tag(cursor, MAGIC)? {
        return Err(NetCdfError::format("bad magic: file does not start with 'CDF'"));
    }
    let byte = cursor.read_u8()?;
    FormatVersion::from_byte(byte)
        .ok_or_else(|| NetCdfError::format(format!("bad version byte {}", byte)))
}

fn read_record_count<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> NetCdfResult<RecordCount> {
    let streaming: Alternative<'_, R, RecordCount> =
        &|c| Ok(read_tag(c, &STREAMING)?.then_some(RecordCount::Streaming));
    let known: Alternative<'_, R, RecordCount> =
        &|c| read_non_neg(c).map(|n| Some(RecordCount::Known(n)));
    read_alternatives(cursor, &[streaming, known])
}

fn read_dimensions<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    limit: usize,
) -> NetCdfResult<Vec<Dimension>> {
    let n = read_list_header(cursor, &NC_DIMENSION, limit)?;
    let mut dimensions = Vec::with_capacity(n);
    for _ in 0..n {
        let name = read_name(cursor, limit)?;
        let length = read_non_neg(cursor)?;
        dimensions.push(Dimension { name, length });
    }
    Ok(dimensions)
}

fn read_attributes<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    limit: usize,
) -> NetCdfResult<Vec<Attribute>> {
    let n = read_list_header(cursor, &NC_ATTRIBUTE, limit)?;
    let mut attributes = Vec::with_capacity(n);
    for _ in 0..n {
        let name = read_name(cursor, limit)?;
        let ty = read_type_code(cursor)?;
        let count = read_nelems(cursor, limit)?;
        let value = read_attribute_values(cursor, ty, count)?;
        attributes.push(Attribute { name, value });
    }
    Ok(attributes)
}

fn read_variables<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    version: FormatVersion,
    limit: usize,
) -> NetCdfResult<Vec<Variable>> {
    let n = read_list_header(cursor, &NC_VARIABLE, limit)?;
    let mut variables = Vec::with_capacity(n);
    for _ in 0..n {
        let name = read_name(cursor, limit)?;
        let rank = read_nelems(cursor, limit)?;
        let dim_ids = (0..rank)
            .map(|_| read_non_neg(cursor).map(|id| id as usize))
            .collect::<NetCdfResult<Vec<_>>>()?;
        let attributes = read_attributes(cursor, limit)?;
        let element_type = read_type_code(cursor)?;
        let declared_size = read_non_neg(cursor)?;
        let data_start = read_offset(cursor, version)?;
        variables.push(Variable {
            name,
            dim_ids,
            attributes,
            element_type,
            declared_size,
            data_start,
        });
    }
    Ok(variables)
}

fn read_offset<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    version: FormatVersion,
) -> NetCdfResult<u64> {
    match version {
        FormatVersion::Classic => Ok(read_non_neg(cursor)? as u64),
        FormatVersion::SixtyFourBitOffset => {
            let offset = cursor.read_i64()?;
            u64::try_from(offset)
                .map_err(|_| NetCdfError::format(format!("negative variable offset {}", offset)))
        }
    }
}

impl fmt::Display for Header {
    /// CDL-style summary, in the manner of `ncdump -h`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "netcdf {{ // {} format", self.version)?;

        if !self.dimensions.is_empty() {
            writeln!(f, "dimensions:")?;
            for dim in &self.dimensions {
                if dim.is_unlimited() {
                    match self.record_count {
                        RecordCount::Known(n) => {
                            writeln!(f, "\t{} = UNLIMITED ; // ({} currently)", dim.name, n)?
                        }
                        RecordCount::Streaming => {
                            writeln!(f, "\t{} = UNLIMITED ; // (streaming)", dim.name)?
                        }
                    }
                } else {
                    writeln!(f, "\t{} = {} ;", dim.name, dim.length)?;
                }
            }
        }

        if !self.variables.is_empty() {
            writeln!(f, "variables:")?;
            for var in &self.variables {
                let dims: Vec<&str> = var
                    .dim_ids
                    .iter()
                    .filter_map(|&id| self.dimensions.get(id))
                    .map(|d| d.name.as_str())
                    .collect();
                if dims.is_empty() {
                    writeln!(f, "\t{} {} ;", var.element_type.name(), var.name)?;
                } else {
                    writeln!(
                        f,
                        "\t{} {}({}) ;",
                        var.element_type.name(),
                        var.name,
                        dims.join(", ")
                    )?;
                }
                for attr in &var.attributes {
                    writeln!(f, "\t\t{}:{} = {} ;", var.name, attr.name, attr.value)?;
                }
            }
        }

        if !self.global_attributes.is_empty() {
            writeln!(f)?;
            writeln!(f, "// global attributes:")?;
            for attr in &self.global_attributes {
                writeln!(f, "\t\t:{} = {} ;", attr.name, attr.value)?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementType;
    use std::io::Cursor;

    fn decode(bytes: Vec<u8>) -> NetCdfResult<Header> {
        let mut cursor = ByteCursor::new(Cursor::new(bytes))?;
        Header::decode(&mut cursor, 1024)
    }

    fn empty_header(version: u8, numrecs: [u8; 4]) -> Vec<u8> {
        let mut bytes = b"CDF".to_vec();
        bytes.push(version);
        bytes.extend_from_slice(&numrecs);
        for _ in 0..3 {
            bytes.extend_from_slice(&[0; 8]);
        }
        bytes
    }

    fn name(bytes: &mut Vec<u8>, name: &str) {
        bytes.extend_from_slice(&(name.len() as u32).to_be_bytes());
        bytes.extend_from_slice(name.as_bytes());
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
    }

    #[test]
    fn test_empty_header() {
        let header = decode(empty_header(1, [0, 0, 0, 0])).unwrap();
        assert_eq!(header.version, FormatVersion::Classic);
        assert_eq!(header.record_count, RecordCount::Known(0));
        assert!(header.dimensions.is_empty());
        assert!(header.global_attributes.is_empty());
        assert!(header.variables.is_empty());
    }

    #[test]
    fn test_streaming_record_count() {
        let header = decode(empty_header(2, [0xFF; 4])).unwrap();
        assert_eq!(header.version, FormatVersion::SixtyFourBitOffset);
        assert_eq!(header.record_count, RecordCount::Streaming);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = empty_header(1, [0; 4]);
        bytes[0] = b'H';
        assert!(matches!(decode(bytes), Err(NetCdfError::Format(_))));
    }

    #[test]
    fn test_bad_version() {
        let bytes = empty_header(5, [0; 4]);
        assert!(matches!(decode(bytes), Err(NetCdfError::Format(_))));
    }

    #[test]
    fn test_variable_with_64bit_offset() {
        let mut bytes = b"CDF\x02".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&NC_DIMENSION);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        name(&mut bytes, "x");
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&NC_VARIABLE);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        name(&mut bytes, "v");
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&ElementType::Double.code().to_be_bytes());
        bytes.extend_from_slice(&32u32.to_be_bytes());
        bytes.extend_from_slice(&0x1_0000_0000u64.to_be_bytes());

        let header = decode(bytes).unwrap();
        let var = &header.variables[0];
        assert_eq!(var.name, "v");
        assert_eq!(var.dim_ids, vec![0]);
        assert_eq!(var.element_type, ElementType::Double);
        assert_eq!(var.declared_size, 32);
        assert_eq!(var.data_start, 0x1_0000_0000);
    }

    #[test]
    fn test_dimension_reference_out_of_range() {
        let mut bytes = b"CDF\x01".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&NC_VARIABLE);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        name(&mut bytes, "v");
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&ElementType::Int.code().to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&100u32.to_be_bytes());

        assert!(matches!(decode(bytes), Err(NetCdfError::Format(_))));
    }

    #[test]
    fn test_duplicate_and_multiple_unlimited_dimensions() {
        let mut bytes = b"CDF\x01".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&NC_DIMENSION);
        bytes.extend_from_slice(&2u32.to_be_bytes());
        name(&mut bytes, "a");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        name(&mut bytes, "b");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0; 16]);

        assert!(matches!(decode(bytes), Err(NetCdfError::Format(_))));
    }

    /// Header with dimensions `dims` and one Int variable over `dim_ids`.
    fn one_variable(dims: &[(&str, u32)], dim_ids: &[u32]) -> Vec<u8> {
        let mut bytes = b"CDF\x01".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&NC_DIMENSION);
        bytes.extend_from_slice(&(dims.len() as u32).to_be_bytes());
        for (dim, length) in dims {
            name(&mut bytes, dim);
            bytes.extend_from_slice(&length.to_be_bytes());
        }
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&NC_VARIABLE);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        name(&mut bytes, "v");
        bytes.extend_from_slice(&(dim_ids.len() as u32).to_be_bytes());
        for id in dim_ids {
            bytes.extend_from_slice(&id.to_be_bytes());
        }
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&ElementType::Int.code().to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&256u32.to_be_bytes());
        bytes
    }

    #[test]
    fn test_unlimited_dimension_must_lead() {
        let dims = [("time", 0), ("lat", 2)];
        assert!(decode(one_variable(&dims, &[0, 1])).is_ok());

        let err = decode(one_variable(&dims, &[1, 0])).unwrap_err();
        assert!(matches!(err, NetCdfError::Format(_)));
        assert!(err.to_string().contains("unlimited"), "{}", err);
    }

    #[test]
    fn test_oversized_slab_rejected() {
        let dims = [("t", 0), ("a", 0x10000), ("b", 0x10000), ("c", 0x10000), ("d", 0x10000)];
        let err = decode(one_variable(&dims, &[0, 1, 2, 3, 4])).unwrap_err();
        assert!(matches!(err, NetCdfError::Format(_)));
        assert!(err.to_string().contains("overflows"), "{}", err);

        // Three of the four axes still fit.
        assert!(decode(one_variable(&dims[..4], &[0, 1, 2, 3])).is_ok());
    }
}
