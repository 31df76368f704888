// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary form of a schema, as exchanged with the authority.
//!
//! ```text
//! class_name: string
//! type_id:    i32
//! fields:     compact count, then per field name: string, tag: u8, identity: u8
//! ```

use super::{FieldType, PdxType};
use crate::error::{PdxError, Result};
use crate::ser::{wire, Cursor, CursorMut};

impl PdxType {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut w = CursorMut::new(&mut buf);
        wire::write_string(&mut w, self.class_name());
        w.write_i32_be(self.type_id());
        wire::write_array_len(&mut w, Some(self.field_count()));
        for field in self.fields() {
            wire::write_string(&mut w, field.name());
            w.write_u8(field.field_type().tag());
            w.write_u8(u8::from(field.is_identity_field()));
        }
        buf
    }

    /// Decode an initialized schema; its type id is assigned when non-zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<PdxType> {
        let mut r = Cursor::new(bytes);
        let class_name = wire::read_string(&mut r)?;
        let type_id = r.read_i32_be()?;
        let count = wire::read_array_len(&mut r)?.unwrap_or(0);

        let mut ty = PdxType::new(class_name);
        for _ in 0..count {
            let name = wire::read_string(&mut r)?;
            let tag = r.read_u8()?;
            let field_type = FieldType::from_tag(tag)
                .ok_or_else(|| PdxError::InvalidData(format!("unknown field type tag {}", tag)))?;
            ty.add_field(&name, field_type)?;
            if r.read_u8()? != 0 {
                ty.mark_identity_field(&name)?;
            }
        }
        if !r.is_eof() {
            return Err(PdxError::InvalidData(format!(
                "{} trailing bytes after schema",
                r.remaining()
            )));
        }
        ty.initialize();
        if type_id != 0 {
            ty.assign_type_id(type_id);
        }
        Ok(ty)
    }
}
