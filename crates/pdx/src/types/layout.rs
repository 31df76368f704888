// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload geometry: body followed by the offset table.

use crate::error::{PdxError, Result};
use crate::ser::wire;

/// View over one record payload (the `length` bytes after the header).
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout<'a> {
    payload: &'a [u8],
    offset_size: usize,
    body_len: usize,
}

impl<'a> RecordLayout<'a> {
    pub fn new(payload: &'a [u8], var_field_count: usize) -> Result<Self> {
        let offset_size = wire::offset_size(payload.len());
        let table = var_field_count * offset_size;
        let body_len = payload.len().checked_sub(table).ok_or_else(|| {
            PdxError::InvalidData(format!(
                "{}-byte payload cannot hold {} offsets",
                payload.len(),
                var_field_count
            ))
        })?;
        Ok(Self {
            payload,
            offset_size,
            body_len,
        })
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn body(&self) -> &'a [u8] {
        &self.payload[..self.body_len]
    }

    pub fn body_len(&self) -> usize {
        self.body_len
    }

    pub fn offset_size(&self) -> usize {
        self.offset_size
    }

    /// Body offset of variable field `var_index`, read from the table.
    pub fn var_offset(&self, var_index: usize) -> Result<usize> {
        let at = self.body_len + var_index * self.offset_size;
        let offset = wire::read_offset(self.payload, at, self.offset_size)?;
        if offset > self.body_len {
            return Err(PdxError::InvalidData(format!(
                "offset {} of variable field {} exceeds body length {}",
                offset, var_index, self.body_len
            )));
        }
        Ok(offset)
    }
}

/// Offset width an encoder uses for a body with `var_field_count` offsets.
///
/// Tries the narrowest width first so the decoder, which only sees the total
/// length, always derives the same width.
pub fn encoder_offset_size(body_len: usize, var_field_count: usize) -> usize {
    if var_field_count == 0 {
        return wire::offset_size(body_len);
    }
    for size in [1usize, 2] {
        let total = body_len + var_field_count * size;
        if wire::offset_size(total) == size {
            return size;
        }
    }
    4
}
