//! Core data model for NetCDF classic headers.

use serde::Serialize;

/// On-disk format variant, selected by the version byte after `CDF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatVersion {
    /// Version byte 1: 32-bit variable offsets.
    Classic,
    /// Version byte 2: 64-bit variable offsets.
    SixtyFourBitOffset,
}

impl FormatVersion {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Classic),
            2 => Some(Self::SixtyFourBitOffset),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Classic => 1,
            Self::SixtyFourBitOffset => 2,
        }
    }

    /// Byte width of each variable's `begin` field.
    pub fn offset_width(&self) -> usize {
        match self {
            Self::Classic => 4,
            Self::SixtyFourBitOffset => 8,
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::SixtyFourBitOffset => write!(f, "64-bit offset"),
        }
    }
}

/// External element type of an attribute or variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementType {
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
}

impl ElementType {
    /// Map a 4-byte type tag to an element type.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Byte),
            2 => Some(Self::Char),
            3 => Some(Self::Short),
            4 => Some(Self::Int),
            5 => Some(Self::Float),
            6 => Some(Self::Double),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Char => 2,
            Self::Short => 3,
            Self::Int => 4,
            Self::Float => 5,
            Self::Double => 6,
        }
    }

    /// Size in bytes of one stored element. Characters occupy one byte each.
    pub fn size(&self) -> usize {
        match self {
            Self::Byte | Self::Char => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// CDL type name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

/// Header record count: either a known number of records or the
/// streaming sentinel written while a file is still being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordCount {
    Known(u32),
    Streaming,
}

/// Decoded attribute values, tagged by their element type.
///
/// `Byte` keeps the raw stored bytes; numeric accessors read them as the
/// signed 8-bit integers the format defines. `Char` also keeps the stored
/// bytes, since text attributes are not required to be UTF-8.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    Byte(Vec<u8>),
    Char(#[serde(serialize_with = "serialize_text")] Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl AttributeValue {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Byte(_) => ElementType::Byte,
            Self::Char(_) => ElementType::Char,
            Self::Short(_) => ElementType::Short,
            Self::Int(_) => ElementType::Int,
            Self::Float(_) => ElementType::Float,
            Self::Double(_) => ElementType::Double,
        }
    }

    /// Number of stored elements (bytes, for character data).
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Char(bytes) => bytes.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `index` widened to `f64`. `None` for character data.
    pub fn as_f64(&self, index: usize) -> Option<f64> {
        match self {
            Self::Byte(v) => v.get(index).map(|&b| b as i8 as f64),
            Self::Char(_) => None,
            Self::Short(v) => v.get(index).map(|&x| x as f64),
            Self::Int(v) => v.get(index).map(|&x| x as f64),
            Self::Float(v) => v.get(index).map(|&x| x as f64),
            Self::Double(v) => v.get(index).copied(),
        }
    }

    pub fn first_f64(&self) -> Option<f64> {
        self.as_f64(0)
    }

    /// Character data as text. `None` for numeric data or bytes that are
    /// not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Char(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

fn serialize_text<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    match std::str::from_utf8(bytes) {
        Ok(text) => serializer.serialize_str(text),
        Err(_) => serializer.serialize_bytes(bytes),
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join<T: std::fmt::Display>(values: &[T]) -> String {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::Char(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Self::Byte(v) => {
                let signed: Vec<i8> = v.iter().map(|&b| b as i8).collect();
                write!(f, "{}", join(&signed))
            }
            Self::Short(v) => write!(f, "{}", join(v)),
            Self::Int(v) => write!(f, "{}", join(v)),
            Self::Float(v) => write!(f, "{}", join(v)),
            Self::Double(v) => write!(f, "{}", join(v)),
        }
    }
}

/// A named dimension. Length 0 marks the unlimited (record) dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub length: u32,
}

impl Dimension {
    pub fn is_unlimited(&self) -> bool {
        self.length == 0
    }
}

/// A named attribute, owned by the global list or by one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn element_type(&self) -> ElementType {
        self.value.element_type()
    }
}

/// A variable definition from the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    /// Indices into the header's dimension list, in declared order.
    pub dim_ids: Vec<usize>,
    pub attributes: Vec<Attribute>,
    pub element_type: ElementType,
    /// `vsize` as written by the producer.
    pub declared_size: u32,
    /// File offset of the variable's first element (`begin`).
    pub data_start: u64,
}

impl Variable {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn rank(&self) -> usize {
        self.dim_ids.len()
    }
}
