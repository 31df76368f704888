// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire encodings shared by every encoder and decoder.
//!
//! Strings and arrays carry a compact length: one byte up to 252, `0xFE`
//! followed by a u16, `0xFD` followed by an i32, and `0xFF` for null.
//! Offset table entries are 1, 2 or 4 bytes wide depending on the record
//! length.

use super::{Cursor, CursorMut, SerError, SerResult};
use crate::config::{MAX_ONE_BYTE_OFFSET_LEN, MAX_TWO_BYTE_OFFSET_LEN};

const LEN_NULL: u8 = 0xFF;
const LEN_U16: u8 = 0xFE;
const LEN_I32: u8 = 0xFD;
const LEN_MAX_INLINE: usize = 252;

/// Width in bytes of each offset table entry for a record of `len` bytes.
pub fn offset_size(len: usize) -> usize {
    if len <= MAX_ONE_BYTE_OFFSET_LEN {
        1
    } else if len <= MAX_TWO_BYTE_OFFSET_LEN {
        2
    } else {
        4
    }
}

/// Read one offset table entry at an absolute slice position.
pub fn read_offset(buffer: &[u8], at: usize, size: usize) -> SerResult<usize> {
    let end = at + size;
    if end > buffer.len() {
        return Err(SerError::ReadFailed {
            offset: at,
            reason: "offset table truncated".into(),
        });
    }
    let bytes = &buffer[at..end];
    let value = match size {
        1 => bytes[0] as usize,
        2 => u16::from_be_bytes([bytes[0], bytes[1]]) as usize,
        _ => {
            let raw = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            usize::try_from(raw).map_err(|_| SerError::InvalidData {
                reason: format!("negative field offset {}", raw),
            })?
        }
    };
    Ok(value)
}

pub fn write_offset(w: &mut CursorMut<'_>, offset: usize, size: usize) {
    match size {
        1 => w.write_u8(offset as u8),
        2 => w.write_u16_be(offset as u16),
        _ => w.write_i32_be(offset as i32),
    }
}

pub fn write_array_len(w: &mut CursorMut<'_>, len: Option<usize>) {
    match len {
        None => w.write_u8(LEN_NULL),
        Some(n) if n <= LEN_MAX_INLINE => w.write_u8(n as u8),
        Some(n) if n <= u16::MAX as usize => {
            w.write_u8(LEN_U16);
            w.write_u16_be(n as u16);
        }
        Some(n) => {
            w.write_u8(LEN_I32);
            w.write_i32_be(n as i32);
        }
    }
}

pub fn read_array_len(r: &mut Cursor<'_>) -> SerResult<Option<usize>> {
    let at = r.offset();
    let len = match r.read_u8()? {
        LEN_NULL => return Ok(None),
        LEN_U16 => r.read_u16_be()? as usize,
        LEN_I32 => {
            let raw = r.read_i32_be()?;
            usize::try_from(raw).map_err(|_| SerError::InvalidData {
                reason: format!("negative array length {} at offset {}", raw, at),
            })?
        }
        n => n as usize,
    };
    Ok(Some(len))
}

/// Read a length and make sure `len * min_element_size` bytes remain.
fn read_checked_len(r: &mut Cursor<'_>, min_element_size: usize) -> SerResult<usize> {
    let at = r.offset();
    let len = read_array_len(r)?.unwrap_or(0);
    if len.saturating_mul(min_element_size) > r.remaining() {
        return Err(SerError::ReadFailed {
            offset: at,
            reason: format!("array length {} exceeds buffer", len),
        });
    }
    Ok(len)
}

pub fn write_string(w: &mut CursorMut<'_>, value: &str) {
    write_array_len(w, Some(value.len()));
    w.write_bytes(value.as_bytes());
}

pub fn read_string(r: &mut Cursor<'_>) -> SerResult<String> {
    let at = r.offset();
    let len = read_checked_len(r, 1)?;
    let bytes = r.read_bytes(len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| SerError::InvalidData {
        reason: format!("string at offset {} is not valid UTF-8", at),
    })
}

pub fn write_bool_array(w: &mut CursorMut<'_>, values: &[bool]) {
    write_array_len(w, Some(values.len()));
    for v in values {
        w.write_u8(u8::from(*v));
    }
}

pub fn read_bool_array(r: &mut Cursor<'_>) -> SerResult<Vec<bool>> {
    let len = read_checked_len(r, 1)?;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(r.read_u8()? != 0);
    }
    Ok(out)
}

macro_rules! impl_numeric_array {
    ($write:ident, $read:ident, $type:ty, $w:ident, $r:ident, $size:expr) => {
        pub fn $write(w: &mut CursorMut<'_>, values: &[$type]) {
            write_array_len(w, Some(values.len()));
            for v in values {
                w.$w(*v);
            }
        }

        pub fn $read(r: &mut Cursor<'_>) -> SerResult<Vec<$type>> {
            let len = read_checked_len(r, $size)?;
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                out.push(r.$r()?);
            }
            Ok(out)
        }
    };
}

impl_numeric_array!(write_byte_array, read_byte_array, i8, write_i8, read_i8, 1);
impl_numeric_array!(write_char_array, read_char_array, u16, write_u16_be, read_u16_be, 2);
impl_numeric_array!(write_short_array, read_short_array, i16, write_i16_be, read_i16_be, 2);
impl_numeric_array!(write_int_array, read_int_array, i32, write_i32_be, read_i32_be, 4);
impl_numeric_array!(write_long_array, read_long_array, i64, write_i64_be, read_i64_be, 8);
impl_numeric_array!(write_float_array, read_float_array, f32, write_f32_be, read_f32_be, 4);
impl_numeric_array!(write_double_array, read_double_array, f64, write_f64_be, read_f64_be, 8);

pub fn write_string_array(w: &mut CursorMut<'_>, values: &[String]) {
    write_array_len(w, Some(values.len()));
    for v in values {
        write_string(w, v);
    }
}

pub fn read_string_array(r: &mut Cursor<'_>) -> SerResult<Vec<String>> {
    let len = read_checked_len(r, 1)?;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(read_string(r)?);
    }
    Ok(out)
}

pub fn write_array_of_byte_arrays(w: &mut CursorMut<'_>, values: &[Vec<i8>]) {
    write_array_len(w, Some(values.len()));
    for v in values {
        write_byte_array(w, v);
    }
}

pub fn read_array_of_byte_arrays(r: &mut Cursor<'_>) -> SerResult<Vec<Vec<i8>>> {
    let len = read_checked_len(r, 1)?;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(read_byte_array(r)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_len(len: Option<usize>) -> Vec<u8> {
        let mut buf = Vec::new();
        write_array_len(&mut CursorMut::new(&mut buf), len);
        buf
    }

    #[test]
    fn test_offset_size_thresholds() {
        assert_eq!(offset_size(0), 1);
        assert_eq!(offset_size(255), 1);
        assert_eq!(offset_size(256), 2);
        assert_eq!(offset_size(65535), 2);
        assert_eq!(offset_size(65536), 4);
    }

    #[test]
    fn test_compact_length_forms() {
        assert_eq!(encoded_len(None), vec![0xFF]);
        assert_eq!(encoded_len(Some(0)), vec![0]);
        assert_eq!(encoded_len(Some(252)), vec![252]);
        assert_eq!(encoded_len(Some(253)), vec![0xFE, 0, 253]);
        assert_eq!(encoded_len(Some(70_000)), vec![0xFD, 0, 1, 0x11, 0x70]);

        for len in [None, Some(0), Some(252), Some(253), Some(65535), Some(65536)] {
            let buf = encoded_len(len);
            let mut r = Cursor::new(&buf);
            assert_eq!(read_array_len(&mut r).expect("decode length"), len);
            assert!(r.is_eof());
        }
    }

    #[test]
    fn test_offset_entries_by_width() {
        for (size, value) in [(1usize, 200usize), (2, 40_000), (4, 100_000)] {
            let mut buf = Vec::new();
            write_offset(&mut CursorMut::new(&mut buf), value, size);
            assert_eq!(buf.len(), size);
            assert_eq!(read_offset(&buf, 0, size).expect("read offset"), value);
        }
        assert!(read_offset(&[1], 0, 2).is_err());
    }

    #[test]
    fn test_string_and_arrays() {
        let mut buf = Vec::new();
        {
            let mut w = CursorMut::new(&mut buf);
            write_string(&mut w, "héllo");
            write_int_array(&mut w, &[1, -2, 3]);
            write_string_array(&mut w, &["a".to_string(), String::new()]);
            write_array_of_byte_arrays(&mut w, &[vec![1, 2], vec![]]);
            write_bool_array(&mut w, &[true, false]);
        }
        let mut r = Cursor::new(&buf);
        assert_eq!(read_string(&mut r).expect("string"), "héllo");
        assert_eq!(read_int_array(&mut r).expect("ints"), vec![1, -2, 3]);
        assert_eq!(
            read_string_array(&mut r).expect("strings"),
            vec!["a".to_string(), String::new()]
        );
        assert_eq!(
            read_array_of_byte_arrays(&mut r).expect("byte arrays"),
            vec![vec![1, 2], vec![]]
        );
        assert_eq!(read_bool_array(&mut r).expect("bools"), vec![true, false]);
        assert!(r.is_eof());
    }

    #[test]
    fn test_null_reads_as_empty() {
        let buf = [0xFFu8, 0xFF];
        let mut r = Cursor::new(&buf);
        assert_eq!(read_string(&mut r).expect("null string"), "");
        assert!(read_long_array(&mut r).expect("null array").is_empty());
    }

    #[test]
    fn test_oversized_array_length_rejected() {
        let buf = [0xFEu8, 0x10, 0x00, 1, 2];
        let mut r = Cursor::new(&buf);
        let err = read_int_array(&mut r).unwrap_err();
        assert!(matches!(err, SerError::ReadFailed { offset: 0, .. }));
    }
}
