// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic records: schema plus encoded payload, decoded field by field on
//! demand.

mod factory;

pub use factory::PdxInstanceFactory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::codec::PdxCodec;
use crate::error::{PdxError, Result};
use crate::reader::{PdxReader, ReadMode, RecordReader};
use crate::ser::Cursor;
use crate::serializable::PdxSerializable;
use crate::types::{FieldType, PdxType};
use crate::value::{PdxObject, PdxValue};
use crate::writer::{PdxWriter, RecordWriter};

/// Record of any class, without a compiled domain type.
#[derive(Clone)]
pub struct PdxInstance {
    codec: PdxCodec,
    schema: Arc<PdxType>,
    payload: Arc<[u8]>,
}

impl PdxInstance {
    pub(crate) fn new(codec: PdxCodec, schema: Arc<PdxType>, payload: Arc<[u8]>) -> Self {
        Self {
            codec,
            schema,
            payload,
        }
    }

    pub fn class_name(&self) -> &str {
        self.schema.class_name()
    }

    /// 0 until the record is first serialized.
    pub fn type_id(&self) -> i32 {
        self.schema.type_id()
    }

    pub fn schema(&self) -> &Arc<PdxType> {
        &self.schema
    }

    /// Body plus offset table, without the record header.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.schema.field(name).is_some()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.schema.field(name).map(|f| f.field_type())
    }

    pub fn is_identity_field(&self, name: &str) -> bool {
        self.schema
            .field(name)
            .is_some_and(|f| f.is_identity_field())
    }

    fn reader<'c, 'a>(&'c self, cursor: &'c mut Cursor<'a>) -> Result<RecordReader<'c, 'a>> {
        RecordReader::new(
            &self.codec,
            cursor,
            Arc::clone(&self.schema),
            self.payload.len(),
            ReadMode::Local,
        )
    }

    /// Decode one field; `None` when the schema lacks it.
    pub fn field(&self, name: &str) -> Result<Option<PdxValue>> {
        let Some(field_type) = self.field_type(name) else {
            return Ok(None);
        };
        let mut cursor = Cursor::new(&self.payload);
        let mut reader = self.reader(&mut cursor)?;
        reader.read_value(name, field_type).map(Some)
    }

    /// Every field in schema order.
    pub fn fields(&self) -> Result<Vec<(String, PdxValue)>> {
        let mut cursor = Cursor::new(&self.payload);
        let mut reader = self.reader(&mut cursor)?;
        self.schema
            .fields()
            .iter()
            .map(|f| Ok((f.name().to_owned(), reader.read_value(f.name(), f.field_type())?)))
            .collect()
    }

    /// Materialize the record as a domain object of type `T`.
    pub fn to_object<T>(&self) -> Result<T>
    where
        T: PdxSerializable + Default,
    {
        let bytes = self.codec.serialize(self)?;
        self.codec.deserialize(&bytes)
    }

    /// Replace one field's value, re-encoding the payload.
    pub fn set_field(&mut self, name: &str, value: impl Into<PdxValue>) -> Result<()> {
        let value = value.into();
        let declared = self.field_type(name).ok_or_else(|| PdxError::UnknownField {
            class_name: self.class_name().to_owned(),
            field: name.to_owned(),
        })?;
        if declared != value.field_type() {
            return Err(PdxError::TypeMismatch {
                field: name.to_owned(),
                expected: value.field_type(),
                found: declared,
            });
        }

        let mut values = self.fields()?;
        for (field, slot) in values.iter_mut() {
            if field == name {
                *slot = value;
                break;
            }
        }

        let mut writer = RecordWriter::local(&self.codec, Arc::clone(&self.schema));
        for (field, v) in &values {
            writer.write_value(field, v)?;
        }
        let (_, payload) = writer.finish()?.into_payload()?;
        self.payload = Arc::from(payload);
        Ok(())
    }

    /// Identity field values by name; unreadable payloads yield an error.
    fn identity_values(&self) -> Result<BTreeMap<String, PdxValue>> {
        self.schema
            .identity_fields()
            .into_iter()
            .map(|f| {
                let value = self
                    .field(f.name())?
                    .unwrap_or_else(|| PdxValue::default_for(f.field_type()));
                Ok((f.name().to_owned(), value))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Equality with floats compared by normalized bits, so it agrees with
/// [`hash_value`].
fn value_eq(a: &PdxValue, b: &PdxValue) -> bool {
    match (a, b) {
        (PdxValue::Float(x), PdxValue::Float(y)) => float_bits(*x) == float_bits(*y),
        (PdxValue::Double(x), PdxValue::Double(y)) => double_bits(*x) == double_bits(*y),
        (PdxValue::FloatArray(x), PdxValue::FloatArray(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| float_bits(*p) == float_bits(*q))
        }
        (PdxValue::DoubleArray(x), PdxValue::DoubleArray(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| double_bits(*p) == double_bits(*q))
        }
        _ => a == b,
    }
}

fn float_bits(v: f32) -> u32 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f32::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

fn double_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

fn hash_object<H: Hasher>(object: &PdxObject, state: &mut H) {
    match object {
        PdxObject::Null => 0u8.hash(state),
        PdxObject::Enum(info) => {
            1u8.hash(state);
            info.hash(state);
        }
        PdxObject::Instance(instance) => {
            2u8.hash(state);
            instance.hash(state);
        }
    }
}

fn hash_value<H: Hasher>(value: &PdxValue, state: &mut H) {
    value.field_type().tag().hash(state);
    match value {
        PdxValue::Boolean(v) => v.hash(state),
        PdxValue::Byte(v) => v.hash(state),
        PdxValue::Char(v) => v.hash(state),
        PdxValue::Short(v) => v.hash(state),
        PdxValue::Int(v) => v.hash(state),
        PdxValue::Long(v) => v.hash(state),
        PdxValue::Float(v) => float_bits(*v).hash(state),
        PdxValue::Double(v) => double_bits(*v).hash(state),
        PdxValue::Date(v) => v.hash(state),
        PdxValue::String(v) => v.hash(state),
        PdxValue::Object(v) => hash_object(v, state),
        PdxValue::BooleanArray(v) => v.hash(state),
        PdxValue::CharArray(v) => v.hash(state),
        PdxValue::ByteArray(v) => v.hash(state),
        PdxValue::ShortArray(v) => v.hash(state),
        PdxValue::IntArray(v) => v.hash(state),
        PdxValue::LongArray(v) => v.hash(state),
        PdxValue::FloatArray(v) => v.iter().for_each(|x| float_bits(*x).hash(state)),
        PdxValue::DoubleArray(v) => v.iter().for_each(|x| double_bits(*x).hash(state)),
        PdxValue::StringArray(v) => v.hash(state),
        PdxValue::ObjectArray(v) => v.iter().for_each(|o| hash_object(o, state)),
        PdxValue::ArrayOfByteArrays(v) => v.hash(state),
    }
}

impl PartialEq for PdxInstance {
    /// Same class and equal identity fields; a field only one side carries
    /// is compared against its type's default value.
    fn eq(&self, other: &Self) -> bool {
        if self.class_name() != other.class_name() {
            return false;
        }
        if Arc::ptr_eq(&self.payload, &other.payload) {
            return true;
        }
        let mine = match self.identity_values() {
            Ok(values) => values,
            Err(e) => return incomparable(self.class_name(), &e),
        };
        let theirs = match other.identity_values() {
            Ok(values) => values,
            Err(e) => return incomparable(other.class_name(), &e),
        };
        let names: BTreeSet<&str> = mine
            .keys()
            .chain(theirs.keys())
            .map(String::as_str)
            .collect();
        let equal = names
            .into_iter()
            .all(|name| match (mine.get(name), theirs.get(name)) {
                (Some(a), Some(b)) => value_eq(a, b),
                (Some(v), None) | (None, Some(v)) => {
                    value_eq(v, &PdxValue::default_for(v.field_type()))
                }
                (None, None) => true,
            });
        equal
    }
}

fn incomparable(class_name: &str, err: &PdxError) -> bool {
    log::warn!(
        "[pdx::instance] cannot compare {} records: {}",
        class_name,
        err
    );
    false
}

impl Eq for PdxInstance {}

impl Hash for PdxInstance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_name().hash(state);
        let Ok(values) = self.identity_values() else {
            return;
        };
        // defaults are skipped so a missing field hashes like a default one
        for (name, value) in &values {
            if value_eq(value, &PdxValue::default_for(value.field_type())) {
                continue;
            }
            name.hash(state);
            hash_value(value, state);
        }
    }
}

impl fmt::Debug for PdxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdxInstance")
            .field("class_name", &self.class_name())
            .field("type_id", &self.type_id())
            .field("fields", &self.schema.field_count())
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for PdxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.class_name())?;
        match self.fields() {
            Ok(values) => {
                for (i, (name, value)) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
            }
            Err(e) => write!(f, "<unreadable: {}>", e)?,
        }
        f.write_str("]")
    }
}

impl PdxSerializable for PdxInstance {
    fn class_name(&self) -> &str {
        self.schema.class_name()
    }

    fn write_fields(&self, writer: &mut dyn PdxWriter) -> Result<()> {
        for (name, value) in self.fields()? {
            writer.write_value(&name, &value)?;
            if self.is_identity_field(&name) {
                writer.mark_identity_field(&name)?;
            }
        }
        Ok(())
    }

    fn read_fields(&mut self, _reader: &mut dyn PdxReader) -> Result<()> {
        Err(PdxError::Unsupported(format!(
            "generic record {} cannot be filled field by field",
            self.class_name()
        )))
    }

    fn as_pdx_instance(&self) -> Option<&PdxInstance> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LocalAuthority, PdxTypeRegistry};
    use std::collections::hash_map::DefaultHasher;

    fn codec() -> PdxCodec {
        PdxCodec::new(PdxTypeRegistry::new(Arc::new(LocalAuthority::new())))
    }

    fn hash_of(instance: &PdxInstance) -> u64 {
        let mut h = DefaultHasher::new();
        instance.hash(&mut h);
        h.finish()
    }

    fn order(codec: &PdxCodec, id: i32, note: &str, price: f64) -> PdxInstance {
        let mut factory = codec.instance_factory("Order");
        factory
            .field("id", id)
            .and_then(|f| f.field("note", note))
            .and_then(|f| f.field("price", price))
            .and_then(|f| f.mark_identity_field("id"))
            .expect("fields");
        factory.create().expect("create")
    }

    #[test]
    fn test_field_access() {
        let codec = codec();
        let o = order(&codec, 3, "rush", 9.5);
        assert_eq!(o.type_id(), 0);
        assert_eq!(o.field_names(), vec!["id", "note", "price"]);
        assert_eq!(o.field("note").expect("note"), Some(PdxValue::String("rush".into())));
        assert_eq!(o.field("price").expect("price"), Some(PdxValue::Double(9.5)));
        assert_eq!(o.field("missing").expect("missing"), None);
        assert!(o.is_identity_field("id"));
        assert!(!o.is_identity_field("note"));
        assert_eq!(o.to_string(), "Order[id=3, note=rush, price=9.5]");
    }

    #[test]
    fn test_identity_equality_and_hash() {
        let codec = codec();
        let a = order(&codec, 1, "a", 1.0);
        let b = order(&codec, 1, "b", 2.0);
        let c = order(&codec, 2, "a", 1.0);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn test_set_field_reencodes() {
        let codec = codec();
        let mut o = order(&codec, 1, "short", 1.0);
        o.set_field("note", "a much longer note").expect("set");
        o.set_field("id", 42).expect("set");
        assert_eq!(o.field("note").expect("note"), Some(PdxValue::String("a much longer note".into())));
        assert_eq!(o.field("id").expect("id"), Some(PdxValue::Int(42)));
        assert_eq!(o.field("price").expect("price"), Some(PdxValue::Double(1.0)));

        assert!(matches!(
            o.set_field("id", "text"),
            Err(PdxError::TypeMismatch { .. })
        ));
        assert!(matches!(
            o.set_field("nope", 1),
            Err(PdxError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_serialize_assigns_type_id_and_reads_back() {
        let codec = codec();
        let o = order(&codec, 8, "x", 0.5);
        let bytes = codec.serialize(&o).expect("encode");
        assert_ne!(o.type_id(), 0);
        let back = codec.read_instance(&bytes).expect("read");
        assert_eq!(back, o);
        assert_eq!(back.payload(), o.payload());
        assert_eq!(codec.registry().stats().snapshot().instance_creations, 1);
    }

    #[test]
    fn test_read_fields_into_instance_is_unsupported() {
        let codec = codec();
        let o = order(&codec, 8, "x", 0.5);
        let bytes = codec.serialize(&o).expect("encode");
        let mut target = o.clone();
        assert!(matches!(
            codec.deserialize_into(&bytes, &mut target),
            Err(PdxError::Unsupported(_))
        ));
    }
}
