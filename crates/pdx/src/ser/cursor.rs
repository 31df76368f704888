// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for PDX buffer manipulation.
//!
//! The read cursor is shared by nested decoders: a decoder that jumps to a
//! field takes a [`Mark`] first and restores it afterwards, so the enclosing
//! decoder keeps its position. Every explicit [`Cursor::seek`] is counted.

use super::{SerError, SerResult};

/// Generate big-endian write methods for primitive types.
///
/// Writes append to the underlying `Vec<u8>` and cannot overflow.
macro_rules! impl_write_be {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    };
}

/// Generate big-endian read methods for primitive types.
///
/// Each generated method:
/// 1. Checks buffer bounds (returns `SerError::ReadFailed` if overflow)
/// 2. Reads N bytes from buffer
/// 3. Converts bytes to value via `from_be_bytes()`
/// 4. Advances offset
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> SerResult<$type> {
            if self.offset + $size > self.buffer.len() {
                return Err(SerError::ReadFailed {
                    offset: self.offset,
                    reason: "unexpected end of buffer".into(),
                });
            }
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(&self.buffer[self.offset..self.offset + $size]);
            self.offset += $size;
            Ok(<$type>::from_be_bytes(bytes))
        }
    };
}

/// Append-only cursor for writing into a growable buffer.
pub struct CursorMut<'a> {
    buffer: &'a mut Vec<u8>,
}

impl<'a> CursorMut<'a> {
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    impl_write_be!(write_u8, u8);
    impl_write_be!(write_i8, i8);
    impl_write_be!(write_u16_be, u16);
    impl_write_be!(write_i16_be, i16);
    impl_write_be!(write_u32_be, u32);
    impl_write_be!(write_i32_be, i32);
    impl_write_be!(write_i64_be, i64);

    pub fn write_f32_be(&mut self, value: f32) {
        self.write_u32_be(value.to_bits());
    }

    pub fn write_f64_be(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_bits().to_be_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Overwrite four bytes previously written at `at`.
    pub fn patch_i32_be(&mut self, at: usize, value: i32) -> SerResult<()> {
        if at + 4 > self.buffer.len() {
            return Err(SerError::WriteFailed {
                offset: at,
                reason: "offset out of range".into(),
            });
        }
        self.buffer[at..at + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }
}

/// Saved read position, restored with [`Cursor::reset_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Immutable cursor for reading (bounds-checked, zero-copy).
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
    seeks: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            seeks: 0,
        }
    }

    impl_read_be!(read_u8, u8, 1);
    impl_read_be!(read_i8, i8, 1);
    impl_read_be!(read_u16_be, u16, 2);
    impl_read_be!(read_i16_be, i16, 2);
    impl_read_be!(read_u32_be, u32, 4);
    impl_read_be!(read_i32_be, i32, 4);
    impl_read_be!(read_i64_be, i64, 8);
    impl_read_be!(read_u64_be, u64, 8);

    pub fn read_f32_be(&mut self) -> SerResult<f32> {
        Ok(f32::from_bits(self.read_u32_be()?))
    }

    pub fn read_f64_be(&mut self) -> SerResult<f64> {
        Ok(f64::from_bits(self.read_u64_be()?))
    }

    pub fn read_bytes(&mut self, len: usize) -> SerResult<&'a [u8]> {
        if self.offset + len > self.buffer.len() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Jump to an absolute position.
    pub fn seek(&mut self, position: usize) -> SerResult<()> {
        if position > self.buffer.len() {
            return Err(SerError::ReadFailed {
                offset: position,
                reason: "seek past end of buffer".into(),
            });
        }
        self.seeks += 1;
        self.offset = position;
        Ok(())
    }

    pub fn mark(&self) -> Mark {
        Mark(self.offset)
    }

    pub fn reset_to(&mut self, mark: Mark) {
        self.offset = mark.0;
    }

    /// Number of [`Cursor::seek`] calls made so far.
    pub fn seek_count(&self) -> usize {
        self.seeks
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Whole underlying buffer, independent of the current position.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }
}
