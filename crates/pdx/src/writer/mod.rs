// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field-by-field encoding.
//!
//! Domain objects describe their fields through [`PdxWriter`]. One
//! [`RecordWriter`] implements it in three modes: against the known local
//! schema, collecting a new local schema, or against a merged schema that
//! re-emits retained unread fields.

mod record;

pub use record::{EncodedRecord, RecordWriter};

use crate::error::Result;
use crate::serializable::PdxSerializable;
use crate::types::EnumInfo;
use crate::value::{PdxDate, PdxObject, PdxValue};

/// Sink for the named fields of one object.
pub trait PdxWriter {
    fn write_boolean(&mut self, name: &str, value: bool) -> Result<()>;
    fn write_byte(&mut self, name: &str, value: i8) -> Result<()>;
    /// UTF-16 code unit.
    fn write_char(&mut self, name: &str, value: u16) -> Result<()>;
    fn write_short(&mut self, name: &str, value: i16) -> Result<()>;
    fn write_int(&mut self, name: &str, value: i32) -> Result<()>;
    fn write_long(&mut self, name: &str, value: i64) -> Result<()>;
    fn write_float(&mut self, name: &str, value: f32) -> Result<()>;
    fn write_double(&mut self, name: &str, value: f64) -> Result<()>;
    fn write_date(&mut self, name: &str, value: PdxDate) -> Result<()>;
    fn write_string(&mut self, name: &str, value: &str) -> Result<()>;

    /// Nested domain object, encoded as its own record; `None` writes null.
    fn write_object(&mut self, name: &str, value: Option<&dyn PdxSerializable>) -> Result<()>;
    /// Enum member in an object-typed field.
    fn write_enum(&mut self, name: &str, value: Option<&EnumInfo>) -> Result<()>;
    fn write_object_value(&mut self, name: &str, value: &PdxObject) -> Result<()>;

    fn write_boolean_array(&mut self, name: &str, value: &[bool]) -> Result<()>;
    fn write_char_array(&mut self, name: &str, value: &[u16]) -> Result<()>;
    fn write_byte_array(&mut self, name: &str, value: &[i8]) -> Result<()>;
    fn write_short_array(&mut self, name: &str, value: &[i16]) -> Result<()>;
    fn write_int_array(&mut self, name: &str, value: &[i32]) -> Result<()>;
    fn write_long_array(&mut self, name: &str, value: &[i64]) -> Result<()>;
    fn write_float_array(&mut self, name: &str, value: &[f32]) -> Result<()>;
    fn write_double_array(&mut self, name: &str, value: &[f64]) -> Result<()>;
    fn write_string_array(&mut self, name: &str, value: &[String]) -> Result<()>;
    fn write_object_array(&mut self, name: &str, value: &[PdxObject]) -> Result<()>;
    fn write_array_of_byte_arrays(&mut self, name: &str, value: &[Vec<i8>]) -> Result<()>;

    /// Make `name` part of the record identity. Only takes effect while the
    /// schema is being collected.
    fn mark_identity_field(&mut self, name: &str) -> Result<()>;

    fn write_value(&mut self, name: &str, value: &PdxValue) -> Result<()> {
        match value {
            PdxValue::Boolean(v) => self.write_boolean(name, *v),
            PdxValue::Byte(v) => self.write_byte(name, *v),
            PdxValue::Char(v) => self.write_char(name, *v),
            PdxValue::Short(v) => self.write_short(name, *v),
            PdxValue::Int(v) => self.write_int(name, *v),
            PdxValue::Long(v) => self.write_long(name, *v),
            PdxValue::Float(v) => self.write_float(name, *v),
            PdxValue::Double(v) => self.write_double(name, *v),
            PdxValue::Date(v) => self.write_date(name, *v),
            PdxValue::String(v) => self.write_string(name, v),
            PdxValue::Object(v) => self.write_object_value(name, v),
            PdxValue::BooleanArray(v) => self.write_boolean_array(name, v),
            PdxValue::CharArray(v) => self.write_char_array(name, v),
            PdxValue::ByteArray(v) => self.write_byte_array(name, v),
            PdxValue::ShortArray(v) => self.write_short_array(name, v),
            PdxValue::IntArray(v) => self.write_int_array(name, v),
            PdxValue::LongArray(v) => self.write_long_array(name, v),
            PdxValue::FloatArray(v) => self.write_float_array(name, v),
            PdxValue::DoubleArray(v) => self.write_double_array(name, v),
            PdxValue::StringArray(v) => self.write_string_array(name, v),
            PdxValue::ObjectArray(v) => self.write_object_array(name, v),
            PdxValue::ArrayOfByteArrays(v) => self.write_array_of_byte_arrays(name, v),
        }
    }
}
