// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record decoder over a shared cursor.
//!
//! Every read locates the field in the wire schema. When the cursor already
//! sits on the field the value is read in place and the cursor advances;
//! otherwise the cursor is marked, moved to the field, and restored after the
//! read. Reading fields in wire order therefore never seeks.

use std::sync::Arc;

use super::PdxReader;
use crate::codec::PdxCodec;
use crate::config::{DS_NULL, DS_PDX, DS_PDX_ENUM};
use crate::error::{PdxError, Result};
use crate::ser::{wire, Cursor};
use crate::serializable::PdxSerializable;
use crate::types::{EnumInfo, FieldMapping, FieldMaps, FieldType, PdxType, RecordLayout};
use crate::value::{PdxDate, PdxObject};

/// How requested names map onto the wire schema.
pub enum ReadMode {
    /// The wire schema is the local schema.
    Local,
    /// Build a local schema from the requested fields.
    Collecting(PdxType),
    /// Follow the local-to-wire map, expecting reads in local field order.
    Remote {
        local: Arc<PdxType>,
        maps: Arc<FieldMaps>,
        next: usize,
    },
}

impl ReadMode {
    pub fn collecting(class_name: &str) -> Self {
        ReadMode::Collecting(PdxType::new(class_name))
    }

    /// `maps` must have been computed between `local` and the wire schema.
    pub fn remote(local: Arc<PdxType>, maps: Arc<FieldMaps>) -> Self {
        ReadMode::Remote {
            local,
            maps,
            next: 0,
        }
    }
}

enum Location {
    Absent,
    Sequential,
    At(usize),
}

/// Decoder for one record whose payload starts at the cursor position.
pub struct RecordReader<'c, 'a> {
    codec: &'c PdxCodec,
    cursor: &'c mut Cursor<'a>,
    wire: Arc<PdxType>,
    layout: RecordLayout<'a>,
    payload_start: usize,
    mode: ReadMode,
    finished: bool,
}

impl<'c, 'a> RecordReader<'c, 'a> {
    pub fn new(
        codec: &'c PdxCodec,
        cursor: &'c mut Cursor<'a>,
        wire: Arc<PdxType>,
        payload_len: usize,
        mode: ReadMode,
    ) -> Result<Self> {
        if !wire.is_initialized() {
            return Err(PdxError::NotInitialized {
                class_name: wire.class_name().to_owned(),
            });
        }
        let payload_start = cursor.offset();
        let payload = cursor
            .buffer()
            .get(payload_start..payload_start + payload_len)
            .ok_or_else(|| {
                PdxError::InvalidData(format!(
                    "{}-byte payload of {} runs past the buffer",
                    payload_len,
                    wire.class_name()
                ))
            })?;
        let layout = wire.layout(payload)?;
        Ok(Self {
            codec,
            cursor,
            wire,
            layout,
            payload_start,
            mode,
            finished: false,
        })
    }

    pub fn wire_type(&self) -> &Arc<PdxType> {
        &self.wire
    }

    pub fn seek_count(&self) -> usize {
        self.cursor.seek_count()
    }

    fn locate(&mut self, name: &str, field_type: FieldType) -> Result<Location> {
        let wire_index = match &mut self.mode {
            ReadMode::Local | ReadMode::Collecting(_) => self.wire.field_index(name),
            ReadMode::Remote { local, maps, next } => {
                let expected = local.field_at(*next).is_some_and(|f| f.name() == name);
                match maps.local_to_remote().get(*next) {
                    Some(mapping) if expected => {
                        *next += 1;
                        match *mapping {
                            FieldMapping::Absent => None,
                            FieldMapping::SamePosition(i) | FieldMapping::RemotePosition(i) => {
                                Some(i)
                            }
                        }
                    }
                    _ => {
                        log::trace!(
                            "[pdx::reader] {}.{} read out of local order",
                            self.wire.class_name(),
                            name
                        );
                        self.wire.field_index(name)
                    }
                }
            }
        };

        let Some(index) = wire_index else {
            if let ReadMode::Collecting(collected) = &mut self.mode {
                if collected.field(name).is_none() {
                    collected.add_field(name, field_type)?;
                }
            }
            return Ok(Location::Absent);
        };

        let field = &self.wire.fields()[index];
        if field.field_type() != field_type {
            return Err(PdxError::TypeMismatch {
                field: name.to_owned(),
                expected: field_type,
                found: field.field_type(),
            });
        }
        if let ReadMode::Collecting(collected) = &mut self.mode {
            if collected.field(name).is_none() {
                collected.add_field(name, field_type)?;
                if field.is_identity_field() {
                    collected.mark_identity_field(name)?;
                }
            }
        }

        let position = self.wire.field_position(index, &self.layout)?;
        if self.cursor.offset() == self.payload_start + position {
            Ok(Location::Sequential)
        } else {
            Ok(Location::At(position))
        }
    }

    fn read_field<T, F>(&mut self, name: &str, field_type: FieldType, read: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        match self.locate(name, field_type)? {
            Location::Absent => Ok(T::default()),
            Location::Sequential => read(self),
            Location::At(position) => {
                let mark = self.cursor.mark();
                self.cursor.seek(self.payload_start + position)?;
                let value = read(self);
                self.cursor.reset_to(mark);
                value
            }
        }
    }

    fn read_object_value(&mut self) -> Result<PdxObject> {
        let at = self.cursor.offset();
        match self.cursor.read_u8()? {
            DS_NULL => Ok(PdxObject::Null),
            DS_PDX => Ok(PdxObject::Instance(
                self.codec.read_instance_from(&mut *self.cursor)?,
            )),
            DS_PDX_ENUM => {
                let code = self.cursor.read_i32_be()?;
                let info = self.codec.registry().enum_info(code, self.codec.pool())?;
                Ok(PdxObject::Enum(info))
            }
            tag => Err(PdxError::InvalidData(format!(
                "unknown object tag {} at offset {}",
                tag, at
            ))),
        }
    }

    /// Advance the cursor to the end of the record. Only the first call moves.
    pub fn move_past_record(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let end = self.payload_start + self.layout.payload().len();
        let at = self.cursor.offset();
        if at <= end {
            self.cursor.read_bytes(end - at)?;
        } else {
            self.cursor.seek(end)?;
        }
        Ok(())
    }

    /// Schema built by a collecting read, initialized.
    pub fn take_collected(&mut self) -> Option<PdxType> {
        match std::mem::replace(&mut self.mode, ReadMode::Local) {
            ReadMode::Collecting(mut collected) => {
                collected.initialize();
                Some(collected)
            }
            other => {
                self.mode = other;
                None
            }
        }
    }

    /// Raw encoded values of the given wire fields.
    pub fn unread_blocks(&self, wire_indices: impl IntoIterator<Item = usize>) -> Result<Vec<Vec<u8>>> {
        let body = self.layout.body();
        wire_indices
            .into_iter()
            .map(|index| {
                let (start, end) = self.wire.field_span(index, &self.layout)?;
                Ok(body[start..end].to_vec())
            })
            .collect()
    }
}

macro_rules! impl_read_fixed {
    ($($method:ident -> $type:ty => $field_type:ident, $read:ident);* $(;)?) => {
        $(
            fn $method(&mut self, name: &str) -> Result<$type> {
                self.read_field(name, FieldType::$field_type, |r| Ok(r.cursor.$read()?))
            }
        )*
    };
}

macro_rules! impl_read_array {
    ($($method:ident -> $type:ty => $field_type:ident, $decode:path);* $(;)?) => {
        $(
            fn $method(&mut self, name: &str) -> Result<$type> {
                self.read_field(name, FieldType::$field_type, |r| Ok($decode(&mut *r.cursor)?))
            }
        )*
    };
}

impl PdxReader for RecordReader<'_, '_> {
    impl_read_fixed! {
        read_byte -> i8 => Byte, read_i8;
        read_char -> u16 => Char, read_u16_be;
        read_short -> i16 => Short, read_i16_be;
        read_int -> i32 => Int, read_i32_be;
        read_long -> i64 => Long, read_i64_be;
        read_float -> f32 => Float, read_f32_be;
        read_double -> f64 => Double, read_f64_be;
    }

    impl_read_array! {
        read_string -> String => String, wire::read_string;
        read_boolean_array -> Vec<bool> => BooleanArray, wire::read_bool_array;
        read_char_array -> Vec<u16> => CharArray, wire::read_char_array;
        read_byte_array -> Vec<i8> => ByteArray, wire::read_byte_array;
        read_short_array -> Vec<i16> => ShortArray, wire::read_short_array;
        read_int_array -> Vec<i32> => IntArray, wire::read_int_array;
        read_long_array -> Vec<i64> => LongArray, wire::read_long_array;
        read_float_array -> Vec<f32> => FloatArray, wire::read_float_array;
        read_double_array -> Vec<f64> => DoubleArray, wire::read_double_array;
        read_string_array -> Vec<String> => StringArray, wire::read_string_array;
        read_array_of_byte_arrays -> Vec<Vec<i8>> => ArrayOfByteArrays, wire::read_array_of_byte_arrays;
    }

    fn read_boolean(&mut self, name: &str) -> Result<bool> {
        self.read_field(name, FieldType::Boolean, |r| Ok(r.cursor.read_u8()? != 0))
    }

    fn read_date(&mut self, name: &str) -> Result<PdxDate> {
        self.read_field(name, FieldType::Date, |r| {
            Ok(PdxDate::from_millis(r.cursor.read_i64_be()?))
        })
    }

    fn read_object(&mut self, name: &str) -> Result<PdxObject> {
        self.read_field(name, FieldType::Object, |r| r.read_object_value())
    }

    fn read_object_into(&mut self, name: &str, target: &mut dyn PdxSerializable) -> Result<bool> {
        self.read_field(name, FieldType::Object, |r| {
            let at = r.cursor.offset();
            match r.cursor.read_u8()? {
                DS_NULL => Ok(false),
                DS_PDX => {
                    r.codec.deserialize_from(&mut *r.cursor, target)?;
                    Ok(true)
                }
                tag => Err(PdxError::InvalidData(format!(
                    "expected a nested record for {} but found tag {} at offset {}",
                    name, tag, at
                ))),
            }
        })
    }

    fn read_enum(&mut self, name: &str) -> Result<Option<EnumInfo>> {
        self.read_field(name, FieldType::Object, |r| match r.read_object_value()? {
            PdxObject::Null => Ok(None),
            PdxObject::Enum(info) => Ok(Some(info)),
            PdxObject::Instance(instance) => Err(PdxError::InvalidData(format!(
                "expected an enum for {} but found a {} record",
                name,
                instance.class_name()
            ))),
        })
    }

    fn read_object_array(&mut self, name: &str) -> Result<Vec<PdxObject>> {
        self.read_field(name, FieldType::ObjectArray, |r| {
            let len = wire::read_array_len(&mut *r.cursor)?.unwrap_or(0);
            if len > r.cursor.remaining() {
                return Err(PdxError::InvalidData(format!(
                    "object array length {} exceeds the remaining {} bytes",
                    len,
                    r.cursor.remaining()
                )));
            }
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                out.push(r.read_object_value()?);
            }
            Ok(out)
        })
    }

    fn has_field(&self, name: &str) -> bool {
        self.wire.field(name).is_some()
    }

    fn is_identity_field(&self, name: &str) -> bool {
        self.wire
            .field(name)
            .is_some_and(|field| field.is_identity_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LocalAuthority, PdxTypeRegistry};
    use crate::writer::{PdxWriter, RecordWriter};

    fn codec() -> PdxCodec {
        PdxCodec::new(PdxTypeRegistry::new(Arc::new(LocalAuthority::new())))
    }

    /// id:int name:string age:int tags:string[]
    fn encode(codec: &PdxCodec) -> (Arc<PdxType>, Vec<u8>) {
        let mut w = RecordWriter::collecting(codec, "Person");
        w.write_int("id", 7).expect("id");
        w.write_string("name", "ada").expect("name");
        w.write_int("age", 36).expect("age");
        w.write_string_array("tags", &["x".to_owned()]).expect("tags");
        w.finish().expect("finish").into_payload().expect("payload")
    }

    #[test]
    fn test_local_reads_in_order_never_seek() {
        let codec = codec();
        let (schema, payload) = encode(&codec);
        let mut cursor = Cursor::new(&payload);
        let mut r = RecordReader::new(&codec, &mut cursor, schema, payload.len(), ReadMode::Local)
            .expect("reader");
        assert_eq!(r.read_int("id").expect("id"), 7);
        assert_eq!(r.read_string("name").expect("name"), "ada");
        assert_eq!(r.read_int("age").expect("age"), 36);
        assert_eq!(r.read_string_array("tags").expect("tags"), vec!["x".to_owned()]);
        assert_eq!(r.seek_count(), 0);
        r.move_past_record().expect("move");
        r.move_past_record().expect("second move is a no-op");
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_local_reads_out_of_order_restore_cursor() {
        let codec = codec();
        let (schema, payload) = encode(&codec);
        let mut cursor = Cursor::new(&payload);
        let mut r = RecordReader::new(&codec, &mut cursor, schema, payload.len(), ReadMode::Local)
            .expect("reader");
        assert_eq!(r.read_int("age").expect("age"), 36);
        assert_eq!(r.seek_count(), 1);
        assert_eq!(r.read_int("id").expect("id"), 7);
        assert_eq!(r.seek_count(), 1);
        assert_eq!(r.read_string("name").expect("name"), "ada");
        assert_eq!(r.seek_count(), 1);
    }

    #[test]
    fn test_absent_and_mistyped_reads() {
        let codec = codec();
        let (schema, payload) = encode(&codec);
        let mut cursor = Cursor::new(&payload);
        let mut r = RecordReader::new(&codec, &mut cursor, schema, payload.len(), ReadMode::Local)
            .expect("reader");
        assert!(!r.has_field("email"));
        assert_eq!(r.read_string("email").expect("absent"), "");
        assert_eq!(r.read_long("score").expect("absent"), 0);
        assert_eq!(r.seek_count(), 0);
        let err = r.read_string("age").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected string fieldType field but found field of type int for field age"
        );
    }

    #[test]
    fn test_collecting_builds_requested_schema() {
        let codec = codec();
        let (schema, payload) = encode(&codec);
        let mut cursor = Cursor::new(&payload);
        let mut r = RecordReader::new(
            &codec,
            &mut cursor,
            Arc::clone(&schema),
            payload.len(),
            ReadMode::collecting("Person"),
        )
        .expect("reader");
        assert_eq!(r.read_int("id").expect("id"), 7);
        assert_eq!(r.read_int("age").expect("age"), 36);
        assert_eq!(r.read_double("weight").expect("absent"), 0.0);
        let collected = r.take_collected().expect("collected");
        let names: Vec<_> = collected.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "age", "weight"]);
        assert!(collected.is_initialized());

        let blocks = r.unread_blocks([1, 3]).expect("blocks");
        assert_eq!(blocks[0], vec![3, b'a', b'd', b'a']);
        assert_eq!(blocks[1], vec![1, 1, b'x']);
    }

    #[test]
    fn test_remote_same_position_and_absent_do_not_seek() {
        let codec = codec();
        let (wire, payload) = encode(&codec);
        let mut local = PdxType::new("Person");
        local.add_field("id", FieldType::Int).expect("id");
        local.add_field("name", FieldType::String).expect("name");
        local.add_field("nick", FieldType::String).expect("nick");
        local.add_field("age", FieldType::Int).expect("age");
        local.initialize();
        let local = Arc::new(local);
        let maps = wire.field_maps(&local).expect("maps");

        let mut cursor = Cursor::new(&payload);
        let mut r = RecordReader::new(
            &codec,
            &mut cursor,
            Arc::clone(&wire),
            payload.len(),
            ReadMode::remote(local, maps),
        )
        .expect("reader");
        assert_eq!(r.read_int("id").expect("id"), 7);
        assert_eq!(r.read_string("name").expect("name"), "ada");
        let before = r.cursor.offset();
        assert_eq!(r.read_string("nick").expect("absent"), "");
        assert_eq!(r.cursor.offset(), before);
        assert_eq!(r.read_int("age").expect("age"), 36);
        assert_eq!(r.seek_count(), 0);
    }
}
