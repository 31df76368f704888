// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire type tags of PDX fields.

use std::fmt;

/// Wire type of one PDX field.
///
/// Discriminants are the on-wire tag values. Every tag from
/// [`FieldType::String`] on is variable length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    Boolean = 0,
    Byte = 1,
    Char = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
    Date = 8,
    String = 9,
    Object = 10,
    BooleanArray = 11,
    CharArray = 12,
    ByteArray = 13,
    ShortArray = 14,
    IntArray = 15,
    LongArray = 16,
    FloatArray = 17,
    DoubleArray = 18,
    StringArray = 19,
    ObjectArray = 20,
    ArrayOfByteArrays = 21,
}

impl FieldType {
    pub const ALL: [FieldType; 22] = [
        FieldType::Boolean,
        FieldType::Byte,
        FieldType::Char,
        FieldType::Short,
        FieldType::Int,
        FieldType::Long,
        FieldType::Float,
        FieldType::Double,
        FieldType::Date,
        FieldType::String,
        FieldType::Object,
        FieldType::BooleanArray,
        FieldType::CharArray,
        FieldType::ByteArray,
        FieldType::ShortArray,
        FieldType::IntArray,
        FieldType::LongArray,
        FieldType::FloatArray,
        FieldType::DoubleArray,
        FieldType::StringArray,
        FieldType::ObjectArray,
        FieldType::ArrayOfByteArrays,
    ];

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn is_variable_length(self) -> bool {
        self >= FieldType::String
    }

    /// Encoded size of a fixed-length value, 0 for variable-length types.
    pub fn fixed_size(self) -> usize {
        match self {
            FieldType::Boolean | FieldType::Byte => 1,
            FieldType::Char | FieldType::Short => 2,
            FieldType::Int | FieldType::Float => 4,
            FieldType::Long | FieldType::Double | FieldType::Date => 8,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Byte => "byte",
            FieldType::Char => "char",
            FieldType::Short => "short",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Date => "date",
            FieldType::String => "string",
            FieldType::Object => "object",
            FieldType::BooleanArray => "boolean[]",
            FieldType::CharArray => "char[]",
            FieldType::ByteArray => "byte[]",
            FieldType::ShortArray => "short[]",
            FieldType::IntArray => "int[]",
            FieldType::LongArray => "long[]",
            FieldType::FloatArray => "float[]",
            FieldType::DoubleArray => "double[]",
            FieldType::StringArray => "string[]",
            FieldType::ObjectArray => "object[]",
            FieldType::ArrayOfByteArrays => "byte[][]",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for ty in FieldType::ALL {
            assert_eq!(FieldType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(FieldType::from_tag(22), None);
    }

    #[test]
    fn test_fixed_sizes() {
        let fixed: Vec<(FieldType, usize)> = FieldType::ALL
            .iter()
            .filter(|t| !t.is_variable_length())
            .map(|t| (*t, t.fixed_size()))
            .collect();
        assert_eq!(
            fixed,
            vec![
                (FieldType::Boolean, 1),
                (FieldType::Byte, 1),
                (FieldType::Char, 2),
                (FieldType::Short, 2),
                (FieldType::Int, 4),
                (FieldType::Long, 8),
                (FieldType::Float, 4),
                (FieldType::Double, 8),
                (FieldType::Date, 8),
            ]
        );
        assert_eq!(FieldType::String.fixed_size(), 0);
        assert!(FieldType::ArrayOfByteArrays.is_variable_length());
    }
}
