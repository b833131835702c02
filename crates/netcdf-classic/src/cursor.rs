//! Positioned big-endian reader over a random-access byte source.
//!
//! Every scalar in the classic format is big-endian, so the cursor has no
//! per-call byte order switch. Reads go through [`bytes::Buf`] for decoding.

use std::io::{Read, Seek, SeekFrom};

use bytes::{Buf, Bytes};

use crate::error::{NetCdfError, NetCdfResult};
use crate::types::{AttributeValue, ElementType};

/// Saved absolute cursor position, see [`ByteCursor::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(u64);

impl Checkpoint {
    pub fn offset(&self) -> u64 {
        self.0
    }
}

/// Number of zero bytes that follow `byte_count` bytes to reach a 4-byte boundary.
pub fn padding_for(byte_count: usize) -> usize {
    (4 - byte_count % 4) % 4
}

/// Round `byte_count` up to the next multiple of 4.
pub fn round_up_to_4(byte_count: u64) -> u64 {
    (byte_count + 3) & !3
}

#[derive(Debug)]
pub struct ByteCursor<R> {
    source: R,
    position: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a source and rewind it to offset 0.
    pub fn new(mut source: R) -> NetCdfResult<Self> {
        source.seek(SeekFrom::Start(0))?;
        Ok(Self {
            source,
            position: 0,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn seek_to(&mut self, offset: u64) -> NetCdfResult<()> {
        if offset != self.position {
            self.source.seek(SeekFrom::Start(offset))?;
            self.position = offset;
        }
        Ok(())
    }

    /// Total length of the source in bytes. The read position is unchanged.
    pub fn source_len(&mut self) -> NetCdfResult<u64> {
        let len = self.source.seek(SeekFrom::End(0))?;
        self.source.seek(SeekFrom::Start(self.position))?;
        Ok(len)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.position)
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) -> NetCdfResult<()> {
        self.seek_to(checkpoint.0)
    }

    /// Read exactly `n` bytes. A short read is an I/O error.
    pub fn read_raw(&mut self, n: usize) -> NetCdfResult<Bytes> {
        let mut buf = vec![0u8; n];
        self.source.read_exact(&mut buf)?;
        self.position += n as u64;
        Ok(Bytes::from(buf))
    }

    pub fn read_u8(&mut self) -> NetCdfResult<u8> {
        Ok(self.read_raw(1)?.get_u8())
    }

    pub fn read_u32(&mut self) -> NetCdfResult<u32> {
        Ok(self.read_raw(4)?.get_u32())
    }

    pub fn read_i64(&mut self) -> NetCdfResult<i64> {
        Ok(self.read_raw(8)?.get_i64())
    }

    /// Decode `count` scalars of `ty`, advancing by `count * ty.size()` bytes.
    /// No alignment padding is consumed.
    pub fn read_fixed(&mut self, ty: ElementType, count: usize) -> NetCdfResult<AttributeValue> {
        let mut buf = self.read_raw(count * ty.size())?;
        let value = match ty {
            ElementType::Byte => AttributeValue::Byte(buf.to_vec()),
            ElementType::Char => AttributeValue::Char(buf.to_vec()),
            ElementType::Short => AttributeValue::Short((0..count).map(|_| buf.get_i16()).collect()),
            ElementType::Int => AttributeValue::Int((0..count).map(|_| buf.get_i32()).collect()),
            ElementType::Float => AttributeValue::Float((0..count).map(|_| buf.get_f32()).collect()),
            ElementType::Double => {
                AttributeValue::Double((0..count).map(|_| buf.get_f64()).collect())
            }
        };
        Ok(value)
    }

    /// Decode `count` contiguous data elements of `ty` widened to `f64`.
    pub fn read_numbers(&mut self, ty: ElementType, count: usize) -> NetCdfResult<Vec<f64>> {
        let mut buf = self.read_raw(count * ty.size())?;
        let values = (0..count)
            .map(|_| match ty {
                ElementType::Byte => buf.get_i8() as f64,
                ElementType::Char => buf.get_u8() as f64,
                ElementType::Short => buf.get_i16() as f64,
                ElementType::Int => buf.get_i32() as f64,
                ElementType::Float => buf.get_f32() as f64,
                ElementType::Double => buf.get_f64(),
            })
            .collect();
        Ok(values)
    }

    /// Consume the zero padding that follows `byte_count` bytes of content.
    pub fn align_after(&mut self, byte_count: usize) -> NetCdfResult<()> {
        let pad = padding_for(byte_count);
        if pad == 0 {
            return Ok(());
        }
        let start = self.position;
        let padding = self.read_raw(pad)?;
        if let Some(i) = padding.iter().position(|&b| b != 0) {
            return Err(NetCdfError::Padding {
                offset: start + i as u64,
                byte: padding[i],
            });
        }
        Ok(())
    }
}
