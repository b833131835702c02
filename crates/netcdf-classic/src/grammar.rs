//! Grammar primitives for the classic header: tags, backtracking
//! alternatives, counts, names and typed value lists.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{NetCdfError, NetCdfResult};
use crate::types::{AttributeValue, ElementType};

/// Record count written while the file is still being produced.
pub const STREAMING: [u8; 4] = [0xFF; 4];
/// An empty dimension, attribute or variable list (`ZERO ZERO`).
pub const ABSENT: [u8; 8] = [0; 8];
pub const NC_DIMENSION: [u8; 4] = [0, 0, 0, 0x0A];
pub const NC_VARIABLE: [u8; 4] = [0, 0, 0, 0x0B];
pub const NC_ATTRIBUTE: [u8; 4] = [0, 0, 0, 0x0C];

/// Characters allowed after the first one of a name, besides alphanumerics.
const NAME_SPECIAL: &str = "_.@+-";
const NAME_PUNCTUATION: &str = "!\"#$%&'()*,:;<=>?[\\]^{|}~";

/// One candidate parse for [`read_alternatives`]. `Ok(None)` means "did not match".
pub type Alternative<'a, R, T> = &'a dyn Fn(&mut ByteCursor<R>) -> NetCdfResult<Option<T>>;

/// Read `expected.len()` bytes and report whether they equal `expected`.
///
/// The bytes are consumed either way; callers that need to retry must
/// take a checkpoint first.
pub fn read_tag<R: Read + Seek>(cursor: &mut ByteCursor<R>, expected: &[u8]) -> NetCdfResult<bool> {
    let raw = cursor.read_raw(expected.len())?;
    Ok(raw.as_ref() == expected)
}

/// Try each parse in order from the same starting position and return the
/// first match. The cursor only ends up advanced past the accepted branch.
pub fn read_alternatives<R: Read + Seek, T>(
    cursor: &mut ByteCursor<R>,
    alternatives: &[Alternative<'_, R, T>],
) -> NetCdfResult<T> {
    let mark = cursor.checkpoint();
    for alternative in alternatives {
        if let Some(value) = alternative(cursor)? {
            return Ok(value);
        }
        cursor.restore(mark)?;
    }
    Err(NetCdfError::grammar(format!(
        "no alternative matched at offset {}",
        mark.offset()
    )))
}

pub fn read_non_neg<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> NetCdfResult<u32> {
    cursor.read_u32()
}

/// Read an element count, rejecting counts above `limit`.
pub fn read_nelems<R: Read + Seek>(cursor: &mut ByteCursor<R>, limit: usize) -> NetCdfResult<usize> {
    let offset = cursor.position();
    let n = read_non_neg(cursor)? as usize;
    if n > limit {
        return Err(NetCdfError::format(format!(
            "element count {} at offset {} exceeds limit {}",
            n, offset, limit
        )));
    }
    Ok(n)
}

/// Read a length-prefixed, padded, grammar-checked name.
pub fn read_name<R: Read + Seek>(cursor: &mut ByteCursor<R>, limit: usize) -> NetCdfResult<String> {
    let n = read_nelems(cursor, limit)?;
    let raw = cursor.read_raw(n)?;
    let name = String::from_utf8(raw.to_vec())
        .map_err(|_| NetCdfError::grammar("invalid identifier: not valid UTF-8"))?;
    validate_name(&name)?;
    cursor.align_after(n)?;
    Ok(name)
}

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphanumeric() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || NAME_SPECIAL.contains(c) || NAME_PUNCTUATION.contains(c))
}

pub fn validate_name(name: &str) -> NetCdfResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(NetCdfError::grammar(format!("invalid identifier {:?}", name)))
    }
}

pub fn read_type_code<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> NetCdfResult<ElementType> {
    let code = cursor.read_u32()?;
    ElementType::from_code(code)
        .ok_or_else(|| NetCdfError::format(format!("unknown element type {}", code)))
}

/// Read `n` attribute values of `ty` plus the padding after them.
pub fn read_attribute_values<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    ty: ElementType,
    n: usize,
) -> NetCdfResult<AttributeValue> {
    let values = cursor.read_fixed(ty, n)?;
    match ty {
        ElementType::Byte | ElementType::Char | ElementType::Short => {
            cursor.align_after(n * ty.size())?
        }
        // 4 and 8 byte elements always end on a boundary
        ElementType::Int | ElementType::Float | ElementType::Double => {}
    }
    Ok(values)
}

/// Read a tagged list header: `ABSENT`, or `tag` followed by a count.
/// Returns the number of list elements that follow.
pub fn read_list_header<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    tag: &[u8; 4],
    limit: usize,
) -> NetCdfResult<usize> {
    let absent: Alternative<'_, R, usize> = &|c| Ok(read_tag(c, &ABSENT)?.then_some(0));
    let tagged: Alternative<'_, R, usize> = &|c| {
        if read_tag(c, tag)? {
            read_nelems(c, limit).map(Some)
        } else {
            Ok(None)
        }
    };
    read_alternatives(cursor, &[absent, tagged])
}
