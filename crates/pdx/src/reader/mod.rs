// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field-by-field decoding.
//!
//! Domain objects pull their fields through [`PdxReader`]. A field the record
//! does not carry reads as its type's zero or empty value; use
//! [`PdxReader::has_field`] to tell the two apart.

mod record;

pub use record::{ReadMode, RecordReader};

use crate::error::Result;
use crate::serializable::PdxSerializable;
use crate::types::{EnumInfo, FieldType};
use crate::value::{PdxDate, PdxObject, PdxValue};

/// Source of the named fields of one record.
pub trait PdxReader {
    fn read_boolean(&mut self, name: &str) -> Result<bool>;
    fn read_byte(&mut self, name: &str) -> Result<i8>;
    fn read_char(&mut self, name: &str) -> Result<u16>;
    fn read_short(&mut self, name: &str) -> Result<i16>;
    fn read_int(&mut self, name: &str) -> Result<i32>;
    fn read_long(&mut self, name: &str) -> Result<i64>;
    fn read_float(&mut self, name: &str) -> Result<f32>;
    fn read_double(&mut self, name: &str) -> Result<f64>;
    fn read_date(&mut self, name: &str) -> Result<PdxDate>;
    fn read_string(&mut self, name: &str) -> Result<String>;

    /// Object field as a generic value; nested records become instances.
    fn read_object(&mut self, name: &str) -> Result<PdxObject>;
    /// Decode a nested record into `target`. Returns `false` for null.
    fn read_object_into(&mut self, name: &str, target: &mut dyn PdxSerializable) -> Result<bool>;
    fn read_enum(&mut self, name: &str) -> Result<Option<EnumInfo>>;

    fn read_boolean_array(&mut self, name: &str) -> Result<Vec<bool>>;
    fn read_char_array(&mut self, name: &str) -> Result<Vec<u16>>;
    fn read_byte_array(&mut self, name: &str) -> Result<Vec<i8>>;
    fn read_short_array(&mut self, name: &str) -> Result<Vec<i16>>;
    fn read_int_array(&mut self, name: &str) -> Result<Vec<i32>>;
    fn read_long_array(&mut self, name: &str) -> Result<Vec<i64>>;
    fn read_float_array(&mut self, name: &str) -> Result<Vec<f32>>;
    fn read_double_array(&mut self, name: &str) -> Result<Vec<f64>>;
    fn read_string_array(&mut self, name: &str) -> Result<Vec<String>>;
    fn read_object_array(&mut self, name: &str) -> Result<Vec<PdxObject>>;
    fn read_array_of_byte_arrays(&mut self, name: &str) -> Result<Vec<Vec<i8>>>;

    /// Whether the record on the wire carries `name`.
    fn has_field(&self, name: &str) -> bool;

    fn is_identity_field(&self, name: &str) -> bool;

    fn read_value(&mut self, name: &str, field_type: FieldType) -> Result<PdxValue> {
        Ok(match field_type {
            FieldType::Boolean => PdxValue::Boolean(self.read_boolean(name)?),
            FieldType::Byte => PdxValue::Byte(self.read_byte(name)?),
            FieldType::Char => PdxValue::Char(self.read_char(name)?),
            FieldType::Short => PdxValue::Short(self.read_short(name)?),
            FieldType::Int => PdxValue::Int(self.read_int(name)?),
            FieldType::Long => PdxValue::Long(self.read_long(name)?),
            FieldType::Float => PdxValue::Float(self.read_float(name)?),
            FieldType::Double => PdxValue::Double(self.read_double(name)?),
            FieldType::Date => PdxValue::Date(self.read_date(name)?),
            FieldType::String => PdxValue::String(self.read_string(name)?),
            FieldType::Object => PdxValue::Object(self.read_object(name)?),
            FieldType::BooleanArray => PdxValue::BooleanArray(self.read_boolean_array(name)?),
            FieldType::CharArray => PdxValue::CharArray(self.read_char_array(name)?),
            FieldType::ByteArray => PdxValue::ByteArray(self.read_byte_array(name)?),
            FieldType::ShortArray => PdxValue::ShortArray(self.read_short_array(name)?),
            FieldType::IntArray => PdxValue::IntArray(self.read_int_array(name)?),
            FieldType::LongArray => PdxValue::LongArray(self.read_long_array(name)?),
            FieldType::FloatArray => PdxValue::FloatArray(self.read_float_array(name)?),
            FieldType::DoubleArray => PdxValue::DoubleArray(self.read_double_array(name)?),
            FieldType::StringArray => PdxValue::StringArray(self.read_string_array(name)?),
            FieldType::ObjectArray => PdxValue::ObjectArray(self.read_object_array(name)?),
            FieldType::ArrayOfByteArrays => {
                PdxValue::ArrayOfByteArrays(self.read_array_of_byte_arrays(name)?)
            }
        })
    }
}

impl dyn PdxReader + '_ {
    /// Decode a nested record into a fresh `T`; `None` for null.
    pub fn read_nested<T>(&mut self, name: &str) -> Result<Option<T>>
    where
        T: PdxSerializable + Default,
    {
        let mut target = T::default();
        if self.read_object_into(name, &mut target)? {
            Ok(Some(target))
        } else {
            Ok(None)
        }
    }
}
