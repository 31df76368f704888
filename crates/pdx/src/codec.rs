// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encode and decode entry points.
//!
//! The codec picks the encoder and decoder mode for each record and keeps
//! the registry up to date: new local schemas get a type id, unfamiliar wire
//! schemas are fetched and merged with the local one, and fields the local
//! class does not declare are retained for the next encode.

use std::sync::Arc;

use crate::config::PDX_HEADER_SIZE;
use crate::error::{PdxError, Result};
use crate::instance::{PdxInstance, PdxInstanceFactory};
use crate::reader::{ReadMode, RecordReader};
use crate::registry::{PdxTypeRegistry, PoolContext, UnreadFields};
use crate::ser::{Cursor, CursorMut};
use crate::serializable::{ClassRegistry, PdxSerializable};
use crate::types::{FieldMaps, PdxType};
use crate::writer::{EncodedRecord, RecordWriter};

/// Result of [`PdxCodec::deserialize_dyn`].
pub enum DecodedObject {
    /// Built by a registered class factory.
    Domain(Box<dyn PdxSerializable>),
    /// Generic record, for unregistered classes or when reading serialized.
    Instance(PdxInstance),
}

impl DecodedObject {
    pub fn class_name(&self) -> &str {
        match self {
            DecodedObject::Domain(object) => object.class_name(),
            DecodedObject::Instance(instance) => instance.class_name(),
        }
    }

    pub fn into_instance(self) -> Option<PdxInstance> {
        match self {
            DecodedObject::Instance(instance) => Some(instance),
            DecodedObject::Domain(_) => None,
        }
    }
}

/// PDX encoder/decoder bound to one registry and one authority pool.
///
/// Cheap to clone; clones share the registry and class factories.
#[derive(Clone)]
pub struct PdxCodec {
    registry: Arc<PdxTypeRegistry>,
    classes: Arc<ClassRegistry>,
    pool: PoolContext,
}

impl PdxCodec {
    pub fn new(registry: Arc<PdxTypeRegistry>) -> Self {
        Self {
            registry,
            classes: Arc::new(ClassRegistry::new()),
            pool: PoolContext::default(),
        }
    }

    pub fn with_pool(mut self, pool: PoolContext) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_classes(mut self, classes: Arc<ClassRegistry>) -> Self {
        self.classes = classes;
        self
    }

    pub fn registry(&self) -> &Arc<PdxTypeRegistry> {
        &self.registry
    }

    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    pub fn pool(&self) -> &PoolContext {
        &self.pool
    }

    /// Builder for a generic record of `class_name`.
    pub fn instance_factory(&self, class_name: &str) -> PdxInstanceFactory {
        PdxInstanceFactory::new(self.clone(), class_name)
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    pub fn serialize(&self, object: &dyn PdxSerializable) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize_into(object, &mut out)?;
        Ok(out)
    }

    /// Append one record for `object` to `out`. Returns bytes written.
    pub fn serialize_into(&self, object: &dyn PdxSerializable, out: &mut Vec<u8>) -> Result<usize> {
        let written = match object.as_pdx_instance() {
            Some(instance) => self.write_instance(instance, out)?,
            None => self.write_domain(object, out)?,
        };
        self.registry.stats().record_serialization(written);
        Ok(written)
    }

    fn write_instance(&self, instance: &PdxInstance, out: &mut Vec<u8>) -> Result<usize> {
        let schema = instance.schema();
        let type_id = self.type_id_of(schema)?;
        let payload = instance.payload();
        let len = i32::try_from(payload.len()).map_err(|_| {
            PdxError::InvalidData(format!(
                "{}-byte payload of {} exceeds the format limit",
                payload.len(),
                schema.class_name()
            ))
        })?;
        let mut w = CursorMut::new(out);
        w.write_i32_be(len);
        w.write_i32_be(type_id);
        w.write_bytes(payload);
        Ok(PDX_HEADER_SIZE + payload.len())
    }

    fn write_domain(&self, object: &dyn PdxSerializable, out: &mut Vec<u8>) -> Result<usize> {
        let class_name = object.class_name();
        let record = match self.registry.local_type(class_name) {
            Some(local) => self.encode_known(object, local)?,
            None => {
                let mut writer = RecordWriter::collecting(self, class_name);
                object.write_fields(&mut writer)?;
                let record = writer.finish()?;
                let schema = Arc::clone(record.schema());
                self.registry.resolve_type_id(&schema, &self.pool)?;
                self.registry.add_local_type(schema);
                log::debug!(
                    "[pdx::codec] collected local schema for {} ({} fields)",
                    class_name,
                    record.schema().field_count()
                );
                record
            }
        };
        let type_id = self.type_id_of(record.schema())?;
        record.write_to(type_id, out)
    }

    fn encode_known(&self, object: &dyn PdxSerializable, local: Arc<PdxType>) -> Result<EncodedRecord> {
        let retained = object.retention_handle().and_then(|handle| {
            let unread = self.registry.unread_fields(handle)?;
            let merged = self.registry.get_type(unread.merged_type_id())?;
            Some((unread, merged))
        });

        let mut writer = match retained {
            Some((unread, merged)) => {
                log::trace!(
                    "[pdx::codec] re-emitting {} retained fields of {} under type id {}",
                    unread.blocks().len(),
                    local.class_name(),
                    merged.type_id()
                );
                RecordWriter::remote(self, merged, &local, &unread)?
            }
            None => RecordWriter::local(self, local),
        };
        object.write_fields(&mut writer)?;
        writer.finish()
    }

    fn type_id_of(&self, schema: &Arc<PdxType>) -> Result<i32> {
        match schema.type_id() {
            0 => self.registry.resolve_type_id(schema, &self.pool),
            id => Ok(id),
        }
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    pub fn deserialize<T>(&self, bytes: &[u8]) -> Result<T>
    where
        T: PdxSerializable + Default,
    {
        let mut target = T::default();
        self.deserialize_into(bytes, &mut target)?;
        Ok(target)
    }

    pub fn deserialize_into(&self, bytes: &[u8], target: &mut dyn PdxSerializable) -> Result<()> {
        let mut cursor = Cursor::new(bytes);
        self.deserialize_from(&mut cursor, target)
    }

    /// Decode the record at the cursor into `target` and leave the cursor
    /// just past it.
    pub fn deserialize_from(
        &self,
        cursor: &mut Cursor<'_>,
        target: &mut dyn PdxSerializable,
    ) -> Result<()> {
        let (len, type_id) = read_header(cursor)?;
        let wire = self.registry.get_or_fetch_type(type_id, &self.pool)?;
        if wire.class_name() != target.class_name() {
            return Err(PdxError::ClassMismatch {
                expected: target.class_name().to_owned(),
                found: wire.class_name().to_owned(),
            });
        }

        match self.registry.local_type(wire.class_name()) {
            _ if wire.is_local() => self.decode_local(cursor, wire, len, target)?,
            Some(local) if *local == *wire => {
                wire.set_local(true);
                self.decode_local(cursor, wire, len, target)?;
            }
            Some(local) => self.decode_remote(cursor, wire, local, len, target)?,
            None => self.decode_collecting(cursor, wire, len, target)?,
        }

        self.registry
            .stats()
            .record_deserialization(PDX_HEADER_SIZE + len);
        Ok(())
    }

    fn decode_local(
        &self,
        cursor: &mut Cursor<'_>,
        wire: Arc<PdxType>,
        len: usize,
        target: &mut dyn PdxSerializable,
    ) -> Result<()> {
        let mut reader = RecordReader::new(self, cursor, wire, len, ReadMode::Local)?;
        target.read_fields(&mut reader)?;
        reader.move_past_record()?;
        forget_retention(target);
        Ok(())
    }

    fn decode_collecting(
        &self,
        cursor: &mut Cursor<'_>,
        wire: Arc<PdxType>,
        len: usize,
        target: &mut dyn PdxSerializable,
    ) -> Result<()> {
        let mode = ReadMode::collecting(wire.class_name());
        let mut reader = RecordReader::new(self, cursor, Arc::clone(&wire), len, mode)?;
        target.read_fields(&mut reader)?;
        reader.move_past_record()?;
        let collected = reader.take_collected().ok_or_else(|| {
            PdxError::InvalidData(format!(
                "collecting decode of {} produced no schema",
                wire.class_name()
            ))
        })?;

        if collected == *wire {
            log::debug!(
                "[pdx::codec] wire schema {} matches {}, marking it local",
                wire.type_id(),
                wire.class_name()
            );
            self.registry.add_local_type(wire);
            forget_retention(target);
            return Ok(());
        }

        let local = Arc::new(collected);
        self.registry.resolve_type_id(&local, &self.pool)?;
        self.registry.add_local_type(Arc::clone(&local));
        let merged = self.register_merged(&local, &wire)?;
        let maps = wire.field_maps(&local)?;
        self.retain_unread(&reader, &wire, &merged, &maps, target)
    }

    fn decode_remote(
        &self,
        cursor: &mut Cursor<'_>,
        wire: Arc<PdxType>,
        local: Arc<PdxType>,
        len: usize,
        target: &mut dyn PdxSerializable,
    ) -> Result<()> {
        let merged = match self.registry.merged_type(wire.type_id()) {
            Some(merged) => merged,
            None => self.register_merged(&local, &wire)?,
        };
        let maps = wire.field_maps(&local)?;
        let mode = ReadMode::remote(local, Arc::clone(&maps));
        let mut reader = RecordReader::new(self, cursor, Arc::clone(&wire), len, mode)?;
        target.read_fields(&mut reader)?;
        reader.move_past_record()?;
        self.retain_unread(&reader, &wire, &merged, &maps, target)
    }

    /// Merge `local` with `wire`, give the result a type id and record it
    /// under both type ids.
    fn register_merged(&self, local: &Arc<PdxType>, wire: &Arc<PdxType>) -> Result<Arc<PdxType>> {
        let merged = local.merge_version(wire)?;
        self.type_id_of(&merged)?;
        self.registry
            .set_merged_type(wire.type_id(), Arc::clone(&merged));
        self.registry
            .set_merged_type(local.type_id(), Arc::clone(&merged));
        self.registry.stats().record_merged_type();
        log::debug!(
            "[pdx::codec] {} local id {} + wire id {} merged into id {} ({} fields)",
            local.class_name(),
            local.type_id(),
            wire.type_id(),
            merged.type_id(),
            merged.field_count()
        );
        Ok(merged)
    }

    fn retain_unread(
        &self,
        reader: &RecordReader<'_, '_>,
        wire: &PdxType,
        merged: &PdxType,
        maps: &FieldMaps,
        target: &mut dyn PdxSerializable,
    ) -> Result<()> {
        if maps.extra_field_count() == 0 {
            forget_retention(target);
            return Ok(());
        }
        if self.registry.config().ignore_unread_fields {
            forget_retention(target);
            log::trace!(
                "[pdx::codec] dropping {} unread fields of {}",
                maps.extra_field_count(),
                wire.class_name()
            );
            return Ok(());
        }

        let blocks = reader.unread_blocks(maps.extra_field_indices())?;
        let handle = target
            .retention_handle()
            .unwrap_or_else(|| self.registry.new_retention_handle());
        self.registry.record_unread_fields(
            handle,
            UnreadFields::new(wire.type_id(), merged.type_id(), blocks),
        );
        target.set_retention_handle(Some(handle));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Generic records
    // -----------------------------------------------------------------------

    /// Wrap the record without decoding its fields.
    pub fn read_instance(&self, bytes: &[u8]) -> Result<PdxInstance> {
        let mut cursor = Cursor::new(bytes);
        self.read_instance_from(&mut cursor)
    }

    pub fn read_instance_from(&self, cursor: &mut Cursor<'_>) -> Result<PdxInstance> {
        let (len, type_id) = read_header(cursor)?;
        let schema = self.registry.get_or_fetch_type(type_id, &self.pool)?;
        let payload = cursor.read_bytes(len)?;
        self.registry.stats().record_instance_creation();
        Ok(PdxInstance::new(self.clone(), schema, Arc::from(payload)))
    }

    /// Decode through the class registry, falling back to a generic record
    /// when the class is unknown or `read_serialized` is set.
    pub fn deserialize_dyn(&self, bytes: &[u8]) -> Result<DecodedObject> {
        let mut cursor = Cursor::new(bytes);
        if !self.registry.config().read_serialized {
            let mark = cursor.mark();
            let (_, type_id) = read_header(&mut cursor)?;
            cursor.reset_to(mark);
            let wire = self.registry.get_or_fetch_type(type_id, &self.pool)?;
            if let Some(mut object) = self.classes.create(wire.class_name()) {
                self.deserialize_from(&mut cursor, object.as_mut())?;
                return Ok(DecodedObject::Domain(object));
            }
        }
        self.read_instance_from(&mut cursor)
            .map(DecodedObject::Instance)
    }
}

/// Drop a handle left over from an earlier decode into a reused object. The
/// entry itself stays until it expires; clones may still hold the handle.
fn forget_retention(target: &mut dyn PdxSerializable) {
    if let Some(handle) = target.retention_handle() {
        log::trace!(
            "[pdx::codec] {} decoded without unread fields, releasing handle {}",
            target.class_name(),
            handle.get()
        );
        target.set_retention_handle(None);
    }
}

/// Read `[len][type_id]`, checking that the payload fits the buffer.
fn read_header(cursor: &mut Cursor<'_>) -> Result<(usize, i32)> {
    let at = cursor.offset();
    let len = cursor.read_i32_be()?;
    let type_id = cursor.read_i32_be()?;
    let len = usize::try_from(len)
        .map_err(|_| PdxError::InvalidData(format!("negative record length {} at offset {}", len, at)))?;
    if len > cursor.remaining() {
        return Err(PdxError::InvalidData(format!(
            "record at offset {} declares {} bytes but only {} remain",
            at,
            len,
            cursor.remaining()
        )));
    }
    Ok((len, type_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PdxReader;
    use crate::registry::LocalAuthority;
    use crate::writer::PdxWriter;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl PdxSerializable for Point {
        fn class_name(&self) -> &str {
            "Point"
        }

        fn write_fields(&self, writer: &mut dyn PdxWriter) -> Result<()> {
            writer.write_int("x", self.x)?;
            writer.write_int("y", self.y)
        }

        fn read_fields(&mut self, reader: &mut dyn PdxReader) -> Result<()> {
            self.x = reader.read_int("x")?;
            self.y = reader.read_int("y")?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Other;

    impl PdxSerializable for Other {
        fn class_name(&self) -> &str {
            "Other"
        }

        fn write_fields(&self, _writer: &mut dyn PdxWriter) -> Result<()> {
            Ok(())
        }

        fn read_fields(&mut self, _reader: &mut dyn PdxReader) -> Result<()> {
            Ok(())
        }
    }

    fn codec() -> PdxCodec {
        PdxCodec::new(PdxTypeRegistry::new(Arc::new(LocalAuthority::new())))
    }

    #[test]
    fn test_first_encode_registers_local_schema() {
        let codec = codec();
        let bytes = codec.serialize(&Point { x: 1, y: 2 }).expect("encode");
        assert_eq!(bytes.len(), 16);
        let local = codec.registry().local_type("Point").expect("local schema");
        assert!(local.is_local());
        assert_ne!(local.type_id(), 0);
        assert_eq!(&bytes[4..8], &local.type_id().to_be_bytes());

        let again = codec.serialize(&Point { x: 1, y: 2 }).expect("encode");
        assert_eq!(bytes, again);
        let decoded: Point = codec.deserialize(&bytes).expect("decode");
        assert_eq!(decoded, Point { x: 1, y: 2 });

        let stats = codec.registry().stats().snapshot();
        assert_eq!(stats.serializations, 2);
        assert_eq!(stats.serialized_bytes, 32);
        assert_eq!(stats.deserializations, 1);
    }

    #[test]
    fn test_class_mismatch() {
        let codec = codec();
        let bytes = codec.serialize(&Point { x: 1, y: 2 }).expect("encode");
        let err = codec.deserialize::<Other>(&bytes).err().expect("mismatch");
        assert!(matches!(err, PdxError::ClassMismatch { .. }));
    }

    #[test]
    fn test_truncated_and_negative_headers() {
        let codec = codec();
        let bytes = codec.serialize(&Point { x: 1, y: 2 }).expect("encode");
        assert!(codec.deserialize::<Point>(&bytes[..12]).is_err());
        let mut negative = bytes.clone();
        negative[0..4].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            codec.deserialize::<Point>(&negative),
            Err(PdxError::InvalidData(_))
        ));
    }

    #[test]
    fn test_unknown_type_id() {
        let codec = codec();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&77i32.to_be_bytes());
        assert!(matches!(
            codec.deserialize::<Point>(&bytes),
            Err(PdxError::UnknownTypeId(77))
        ));
    }

    #[test]
    fn test_deserialize_dyn_uses_factories() {
        let codec = codec();
        let bytes = codec.serialize(&Point { x: 4, y: 5 }).expect("encode");

        let generic = codec.deserialize_dyn(&bytes).expect("decode");
        assert!(matches!(generic, DecodedObject::Instance(_)));

        codec.classes().register::<Point>();
        let domain = codec.deserialize_dyn(&bytes).expect("decode");
        assert!(matches!(domain, DecodedObject::Domain(_)));
        assert_eq!(domain.class_name(), "Point");

        codec
            .registry()
            .set_config(crate::config::PdxConfig::default().with_read_serialized(true));
        let instance = codec
            .deserialize_dyn(&bytes)
            .expect("decode")
            .into_instance()
            .expect("read serialized");
        assert_eq!(
            instance.field("y").expect("field"),
            Some(crate::value::PdxValue::Int(5))
        );
    }

    #[test]
    fn test_stream_of_records() {
        let codec = codec();
        let mut out = Vec::new();
        for i in 0..3 {
            codec
                .serialize_into(&Point { x: i, y: -i }, &mut out)
                .expect("encode");
        }
        let mut cursor = Cursor::new(&out);
        for i in 0..3 {
            let mut p = Point::default();
            codec.deserialize_from(&mut cursor, &mut p).expect("decode");
            assert_eq!(p, Point { x: i, y: -i });
        }
        assert!(cursor.is_eof());
    }
}
