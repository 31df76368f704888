// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic field values used by generic records.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::instance::PdxInstance;
use crate::types::{EnumInfo, FieldType};

/// Date field value: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdxDate(pub i64);

impl PdxDate {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(after.as_millis() as i64),
            Err(before) => Self(-(before.duration().as_millis() as i64)),
        }
    }

    pub fn to_system_time(self) -> SystemTime {
        let magnitude = Duration::from_millis(self.0.unsigned_abs());
        if self.0 >= 0 {
            UNIX_EPOCH + magnitude
        } else {
            UNIX_EPOCH - magnitude
        }
    }
}

/// Value of an object-typed field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PdxObject {
    #[default]
    Null,
    Enum(EnumInfo),
    Instance(PdxInstance),
}

impl PdxObject {
    pub fn is_null(&self) -> bool {
        matches!(self, PdxObject::Null)
    }

    pub fn as_instance(&self) -> Option<&PdxInstance> {
        match self {
            PdxObject::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match self {
            PdxObject::Enum(info) => Some(info),
            _ => None,
        }
    }
}

/// One field value, tagged with its wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum PdxValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Date(PdxDate),
    String(String),
    Object(PdxObject),
    BooleanArray(Vec<bool>),
    CharArray(Vec<u16>),
    ByteArray(Vec<i8>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    ObjectArray(Vec<PdxObject>),
    ArrayOfByteArrays(Vec<Vec<i8>>),
}

impl PdxValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            PdxValue::Boolean(_) => FieldType::Boolean,
            PdxValue::Byte(_) => FieldType::Byte,
            PdxValue::Char(_) => FieldType::Char,
            PdxValue::Short(_) => FieldType::Short,
            PdxValue::Int(_) => FieldType::Int,
            PdxValue::Long(_) => FieldType::Long,
            PdxValue::Float(_) => FieldType::Float,
            PdxValue::Double(_) => FieldType::Double,
            PdxValue::Date(_) => FieldType::Date,
            PdxValue::String(_) => FieldType::String,
            PdxValue::Object(_) => FieldType::Object,
            PdxValue::BooleanArray(_) => FieldType::BooleanArray,
            PdxValue::CharArray(_) => FieldType::CharArray,
            PdxValue::ByteArray(_) => FieldType::ByteArray,
            PdxValue::ShortArray(_) => FieldType::ShortArray,
            PdxValue::IntArray(_) => FieldType::IntArray,
            PdxValue::LongArray(_) => FieldType::LongArray,
            PdxValue::FloatArray(_) => FieldType::FloatArray,
            PdxValue::DoubleArray(_) => FieldType::DoubleArray,
            PdxValue::StringArray(_) => FieldType::StringArray,
            PdxValue::ObjectArray(_) => FieldType::ObjectArray,
            PdxValue::ArrayOfByteArrays(_) => FieldType::ArrayOfByteArrays,
        }
    }

    /// Value a reader returns for a field the record does not carry.
    pub fn default_for(field_type: FieldType) -> PdxValue {
        match field_type {
            FieldType::Boolean => PdxValue::Boolean(false),
            FieldType::Byte => PdxValue::Byte(0),
            FieldType::Char => PdxValue::Char(0),
            FieldType::Short => PdxValue::Short(0),
            FieldType::Int => PdxValue::Int(0),
            FieldType::Long => PdxValue::Long(0),
            FieldType::Float => PdxValue::Float(0.0),
            FieldType::Double => PdxValue::Double(0.0),
            FieldType::Date => PdxValue::Date(PdxDate::default()),
            FieldType::String => PdxValue::String(String::new()),
            FieldType::Object => PdxValue::Object(PdxObject::Null),
            FieldType::BooleanArray => PdxValue::BooleanArray(Vec::new()),
            FieldType::CharArray => PdxValue::CharArray(Vec::new()),
            FieldType::ByteArray => PdxValue::ByteArray(Vec::new()),
            FieldType::ShortArray => PdxValue::ShortArray(Vec::new()),
            FieldType::IntArray => PdxValue::IntArray(Vec::new()),
            FieldType::LongArray => PdxValue::LongArray(Vec::new()),
            FieldType::FloatArray => PdxValue::FloatArray(Vec::new()),
            FieldType::DoubleArray => PdxValue::DoubleArray(Vec::new()),
            FieldType::StringArray => PdxValue::StringArray(Vec::new()),
            FieldType::ObjectArray => PdxValue::ObjectArray(Vec::new()),
            FieldType::ArrayOfByteArrays => PdxValue::ArrayOfByteArrays(Vec::new()),
        }
    }
}

macro_rules! impl_from_value {
    ($($type:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$type> for PdxValue {
                fn from(value: $type) -> Self {
                    PdxValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_value!(
    bool => Boolean,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    PdxDate => Date,
    String => String,
    PdxObject => Object,
    Vec<bool> => BooleanArray,
    Vec<i8> => ByteArray,
    Vec<i16> => ShortArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f32> => FloatArray,
    Vec<f64> => DoubleArray,
    Vec<String> => StringArray,
    Vec<PdxObject> => ObjectArray,
    Vec<Vec<i8>> => ArrayOfByteArrays,
);

impl From<&str> for PdxValue {
    fn from(value: &str) -> Self {
        PdxValue::String(value.to_owned())
    }
}

impl From<EnumInfo> for PdxValue {
    fn from(value: EnumInfo) -> Self {
        PdxValue::Object(PdxObject::Enum(value))
    }
}

impl From<PdxInstance> for PdxValue {
    fn from(value: PdxInstance) -> Self {
        PdxValue::Object(PdxObject::Instance(value))
    }
}

impl fmt::Display for PdxObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdxObject::Null => f.write_str("null"),
            PdxObject::Enum(info) => write!(f, "{}", info),
            PdxObject::Instance(instance) => write!(f, "{}", instance),
        }
    }
}

impl fmt::Display for PdxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdxValue::Boolean(v) => write!(f, "{}", v),
            PdxValue::Byte(v) => write!(f, "{}", v),
            PdxValue::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "{}", c),
                None => write!(f, "\\u{:04x}", v),
            },
            PdxValue::Short(v) => write!(f, "{}", v),
            PdxValue::Int(v) => write!(f, "{}", v),
            PdxValue::Long(v) => write!(f, "{}", v),
            PdxValue::Float(v) => write!(f, "{}", v),
            PdxValue::Double(v) => write!(f, "{}", v),
            PdxValue::Date(v) => write!(f, "{}ms", v.millis()),
            PdxValue::String(v) => write!(f, "{}", v),
            PdxValue::Object(v) => write!(f, "{}", v),
            PdxValue::ObjectArray(v) => {
                f.write_str("[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_type() {
        for ty in FieldType::ALL {
            assert_eq!(PdxValue::default_for(ty).field_type(), ty);
        }
    }

    #[test]
    fn test_date_system_time_conversion() {
        let before_epoch = PdxDate::from_millis(-1_500);
        assert_eq!(
            PdxDate::from_system_time(before_epoch.to_system_time()),
            before_epoch
        );
        let after = PdxDate::from_millis(1_700_000_000_123);
        assert_eq!(PdxDate::from_system_time(after.to_system_time()), after);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(PdxValue::from(5i32), PdxValue::Int(5));
        assert_eq!(PdxValue::from("x"), PdxValue::String("x".into()));
        assert_eq!(
            PdxValue::from(EnumInfo::new("C", "A", 0)).field_type(),
            FieldType::Object
        );
        assert_eq!(PdxValue::Char(u16::from(b'q')).to_string(), "q");
    }
}
