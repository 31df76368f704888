// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record encoder.
//!
//! Field values are encoded into a scratch buffer as they arrive and
//! assembled in schema order by [`RecordWriter::finish`], so callers may write
//! fields in any order. Fields never written get their type's null/zero
//! encoding.

use std::ops::Range;
use std::sync::Arc;

use super::PdxWriter;
use crate::codec::PdxCodec;
use crate::config::{DS_NULL, DS_PDX, DS_PDX_ENUM, PDX_HEADER_SIZE};
use crate::error::{PdxError, Result};
use crate::registry::UnreadFields;
use crate::ser::{wire, CursorMut};
use crate::serializable::PdxSerializable;
use crate::types::layout::encoder_offset_size;
use crate::types::{EnumInfo, FieldType, PdxType};
use crate::value::{PdxDate, PdxObject};

enum WriterSchema {
    /// Known schema; every written field must be declared by it.
    Fixed(Arc<PdxType>),
    /// Schema built from the written fields.
    Collecting(PdxType),
}

/// Encoder for one record.
pub struct RecordWriter<'c> {
    codec: &'c PdxCodec,
    schema: WriterSchema,
    scratch: Vec<u8>,
    slots: Vec<Option<Range<usize>>>,
}

impl<'c> RecordWriter<'c> {
    /// Encode against the local schema of the class.
    pub fn local(codec: &'c PdxCodec, schema: Arc<PdxType>) -> Self {
        let slots = vec![None; schema.field_count()];
        Self {
            codec,
            schema: WriterSchema::Fixed(schema),
            scratch: Vec::new(),
            slots,
        }
    }

    /// Encode while building a new schema for `class_name`.
    pub fn collecting(codec: &'c PdxCodec, class_name: &str) -> Self {
        Self {
            codec,
            schema: WriterSchema::Collecting(PdxType::new(class_name)),
            scratch: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Encode against `merged`, pre-filling the fields `local` lacks with the
    /// retained bytes of `unread`.
    pub fn remote(
        codec: &'c PdxCodec,
        merged: Arc<PdxType>,
        local: &PdxType,
        unread: &UnreadFields,
    ) -> Result<Self> {
        let maps = merged.field_maps(local)?;
        let mut writer = Self::local(codec, Arc::clone(&merged));
        let extra: Vec<usize> = maps.extra_field_indices().collect();
        if extra.len() != unread.blocks().len() {
            log::warn!(
                "[pdx::writer] {} retained blocks for {} unknown fields of {}",
                unread.blocks().len(),
                extra.len(),
                merged.class_name()
            );
        }
        for (index, block) in extra.into_iter().zip(unread.blocks()) {
            let start = writer.scratch.len();
            writer.scratch.extend_from_slice(block);
            writer.slots[index] = Some(start..writer.scratch.len());
        }
        Ok(writer)
    }

    /// Slot index for `name`, adding the field while collecting.
    fn slot_for(&mut self, name: &str, field_type: FieldType) -> Result<usize> {
        let schema: &PdxType = match &mut self.schema {
            WriterSchema::Fixed(schema) => &**schema,
            WriterSchema::Collecting(schema) => {
                if schema.field(name).is_none() {
                    schema.add_field(name, field_type)?;
                    self.slots.push(None);
                }
                &*schema
            }
        };
        let index = schema.field_index(name).ok_or_else(|| PdxError::UnknownField {
            class_name: schema.class_name().to_owned(),
            field: name.to_owned(),
        })?;
        let declared = schema.fields()[index].field_type();
        if declared != field_type {
            return Err(PdxError::TypeMismatch {
                field: name.to_owned(),
                expected: field_type,
                found: declared,
            });
        }
        Ok(index)
    }

    fn put<F>(&mut self, name: &str, field_type: FieldType, encode: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let index = self.slot_for(name, field_type)?;
        let start = self.scratch.len();
        if let Err(err) = encode(self) {
            self.scratch.truncate(start);
            return Err(err);
        }
        self.slots[index] = Some(start..self.scratch.len());
        Ok(())
    }

    fn out(&mut self) -> CursorMut<'_> {
        CursorMut::new(&mut self.scratch)
    }

    fn encode_domain_object(&mut self, value: Option<&dyn PdxSerializable>) -> Result<()> {
        match value {
            None => self.scratch.push(DS_NULL),
            Some(object) => {
                self.scratch.push(DS_PDX);
                self.codec.serialize_into(object, &mut self.scratch)?;
            }
        }
        Ok(())
    }

    fn encode_enum(&mut self, value: &EnumInfo) -> Result<()> {
        let code = self
            .codec
            .registry()
            .enum_code(value, self.codec.pool())?;
        let mut out = self.out();
        out.write_u8(DS_PDX_ENUM);
        out.write_i32_be(code);
        Ok(())
    }

    fn encode_object(&mut self, value: &PdxObject) -> Result<()> {
        match value {
            PdxObject::Null => self.encode_domain_object(None),
            PdxObject::Enum(info) => self.encode_enum(info),
            PdxObject::Instance(instance) => {
                self.encode_domain_object(Some(instance as &dyn PdxSerializable))
            }
        }
    }

    /// Assemble the fields in schema order.
    pub fn finish(self) -> Result<EncodedRecord> {
        let schema = match self.schema {
            WriterSchema::Fixed(schema) => schema,
            WriterSchema::Collecting(mut schema) => {
                schema.initialize();
                Arc::new(schema)
            }
        };

        let mut body = Vec::with_capacity(self.scratch.len());
        let mut var_offsets = Vec::with_capacity(schema.var_field_count());
        for (field, slot) in schema.fields().iter().zip(&self.slots) {
            if field.is_variable_length() {
                var_offsets.push(body.len());
            }
            match slot {
                Some(range) => body.extend_from_slice(&self.scratch[range.clone()]),
                None => write_default(&mut body, field.field_type()),
            }
        }

        Ok(EncodedRecord {
            schema,
            body,
            var_offsets,
        })
    }
}

/// Null or zero encoding of a field that was never written.
fn write_default(body: &mut Vec<u8>, field_type: FieldType) {
    match field_type {
        FieldType::Object => body.push(DS_NULL),
        ty if ty.is_variable_length() => wire::write_array_len(&mut CursorMut::new(body), None),
        ty => body.resize(body.len() + ty.fixed_size(), 0),
    }
}

macro_rules! impl_write_fixed {
    ($($method:ident($type:ty) => $field_type:ident, $write:ident);* $(;)?) => {
        $(
            fn $method(&mut self, name: &str, value: $type) -> Result<()> {
                self.put(name, FieldType::$field_type, |w| {
                    w.out().$write(value);
                    Ok(())
                })
            }
        )*
    };
}

macro_rules! impl_write_array {
    ($($method:ident(&[$type:ty]) => $field_type:ident, $encode:path);* $(;)?) => {
        $(
            fn $method(&mut self, name: &str, value: &[$type]) -> Result<()> {
                self.put(name, FieldType::$field_type, |w| {
                    $encode(&mut w.out(), value);
                    Ok(())
                })
            }
        )*
    };
}

impl PdxWriter for RecordWriter<'_> {
    impl_write_fixed! {
        write_byte(i8) => Byte, write_i8;
        write_char(u16) => Char, write_u16_be;
        write_short(i16) => Short, write_i16_be;
        write_int(i32) => Int, write_i32_be;
        write_long(i64) => Long, write_i64_be;
        write_float(f32) => Float, write_f32_be;
        write_double(f64) => Double, write_f64_be;
    }

    impl_write_array! {
        write_boolean_array(&[bool]) => BooleanArray, wire::write_bool_array;
        write_char_array(&[u16]) => CharArray, wire::write_char_array;
        write_byte_array(&[i8]) => ByteArray, wire::write_byte_array;
        write_short_array(&[i16]) => ShortArray, wire::write_short_array;
        write_int_array(&[i32]) => IntArray, wire::write_int_array;
        write_long_array(&[i64]) => LongArray, wire::write_long_array;
        write_float_array(&[f32]) => FloatArray, wire::write_float_array;
        write_double_array(&[f64]) => DoubleArray, wire::write_double_array;
        write_string_array(&[String]) => StringArray, wire::write_string_array;
        write_array_of_byte_arrays(&[Vec<i8>]) => ArrayOfByteArrays, wire::write_array_of_byte_arrays;
    }

    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        self.put(name, FieldType::Boolean, |w| {
            w.out().write_u8(u8::from(value));
            Ok(())
        })
    }

    fn write_date(&mut self, name: &str, value: PdxDate) -> Result<()> {
        self.put(name, FieldType::Date, |w| {
            w.out().write_i64_be(value.millis());
            Ok(())
        })
    }

    fn write_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.put(name, FieldType::String, |w| {
            wire::write_string(&mut w.out(), value);
            Ok(())
        })
    }

    fn write_object(&mut self, name: &str, value: Option<&dyn PdxSerializable>) -> Result<()> {
        self.put(name, FieldType::Object, |w| w.encode_domain_object(value))
    }

    fn write_enum(&mut self, name: &str, value: Option<&EnumInfo>) -> Result<()> {
        self.put(name, FieldType::Object, |w| match value {
            Some(info) => w.encode_enum(info),
            None => w.encode_domain_object(None),
        })
    }

    fn write_object_value(&mut self, name: &str, value: &PdxObject) -> Result<()> {
        self.put(name, FieldType::Object, |w| w.encode_object(value))
    }

    fn write_object_array(&mut self, name: &str, value: &[PdxObject]) -> Result<()> {
        self.put(name, FieldType::ObjectArray, |w| {
            wire::write_array_len(&mut w.out(), Some(value.len()));
            for item in value {
                w.encode_object(item)?;
            }
            Ok(())
        })
    }

    fn mark_identity_field(&mut self, name: &str) -> Result<()> {
        match &mut self.schema {
            WriterSchema::Collecting(schema) => schema.mark_identity_field(name),
            WriterSchema::Fixed(schema) => {
                log::trace!(
                    "[pdx::writer] identity of {}.{} fixed by its schema",
                    schema.class_name(),
                    name
                );
                Ok(())
            }
        }
    }
}

/// Fields of one record assembled in schema order.
pub struct EncodedRecord {
    schema: Arc<PdxType>,
    body: Vec<u8>,
    var_offsets: Vec<usize>,
}

impl EncodedRecord {
    /// Schema the body follows; initialized, possibly without a type id yet.
    pub fn schema(&self) -> &Arc<PdxType> {
        &self.schema
    }

    /// Append body plus offset table. Returns the payload length.
    pub fn write_payload(&self, out: &mut Vec<u8>) -> Result<usize> {
        let size = encoder_offset_size(self.body.len(), self.var_offsets.len());
        let len = self.body.len() + self.var_offsets.len() * size;
        if i32::try_from(len).is_err() {
            return Err(PdxError::InvalidData(format!(
                "{}-byte record of {} exceeds the format limit",
                len,
                self.schema.class_name()
            )));
        }
        let mut w = CursorMut::new(out);
        w.write_bytes(&self.body);
        for offset in &self.var_offsets {
            wire::write_offset(&mut w, *offset, size);
        }
        Ok(len)
    }

    /// Append the full record `[len][type_id][payload]`. Returns bytes written.
    pub fn write_to(&self, type_id: i32, out: &mut Vec<u8>) -> Result<usize> {
        let header_at = out.len();
        {
            let mut w = CursorMut::new(out);
            w.write_i32_be(0);
            w.write_i32_be(type_id);
        }
        let len = self.write_payload(out)?;
        CursorMut::new(out).patch_i32_be(header_at, len as i32)?;
        Ok(PDX_HEADER_SIZE + len)
    }

    pub fn into_payload(self) -> Result<(Arc<PdxType>, Vec<u8>)> {
        let mut payload = Vec::new();
        self.write_payload(&mut payload)?;
        Ok((self.schema, payload))
    }
}
