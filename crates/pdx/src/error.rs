// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by every PDX component.

use std::fmt;

use crate::ser::SerError;
use crate::types::FieldType;

/// Errors raised while encoding, decoding or registering PDX types.
///
/// Faults are never swallowed: a decode that hits any of these aborts as a
/// whole and leaves no partially populated registry entries behind.
#[derive(Debug, Clone, PartialEq)]
pub enum PdxError {
    /// A field was requested with a type other than the one its schema declares.
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: FieldType,
    },
    /// Two versions of one class declare the same field name with different types.
    MergeIncompatible {
        class_name: String,
        field: String,
        left: FieldType,
        right: FieldType,
    },
    /// A schema already holds a field with this name.
    FieldAlreadyAdded { class_name: String, field: String },
    /// The encoder's schema has no field with this name.
    UnknownField { class_name: String, field: String },
    /// The record on the wire belongs to another class than the target object.
    ClassMismatch { expected: String, found: String },
    /// The requested operation does not apply to this kind of object.
    Unsupported(String),
    /// The authority could not be reached or refused the request.
    AuthorityUnavailable(String),
    /// Neither the registry nor the authority know this type id.
    UnknownTypeId(i32),
    /// Neither the registry nor the authority know this enum code.
    UnknownEnumCode(i32),
    /// Positional access was attempted on a schema that was not initialized.
    NotInitialized { class_name: String },
    /// Structurally invalid record.
    InvalidData(String),
    /// Byte-level cursor failure.
    Serialization(SerError),
}

impl fmt::Display for PdxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdxError::TypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "Expected {} fieldType field but found field of type {} for field {}",
                expected, found, field
            ),
            PdxError::MergeIncompatible {
                class_name,
                field,
                left,
                right,
            } => write!(
                f,
                "Cannot merge versions of {}: field {} is {} in one and {} in the other",
                class_name, field, left, right
            ),
            PdxError::FieldAlreadyAdded { class_name, field } => {
                write!(f, "Field {} is already added to PdxType {}", field, class_name)
            }
            PdxError::UnknownField { class_name, field } => {
                write!(f, "PdxType {} has no field named {}", class_name, field)
            }
            PdxError::ClassMismatch { expected, found } => write!(
                f,
                "Record of class {} cannot be read into {}",
                found, expected
            ),
            PdxError::Unsupported(what) => write!(f, "Unsupported operation: {}", what),
            PdxError::AuthorityUnavailable(reason) => {
                write!(f, "PDX authority unavailable: {}", reason)
            }
            PdxError::UnknownTypeId(id) => write!(f, "Unknown PDX type id {}", id),
            PdxError::UnknownEnumCode(code) => write!(f, "Unknown PDX enum code {}", code),
            PdxError::NotInitialized { class_name } => {
                write!(f, "PdxType {} used before initialize()", class_name)
            }
            PdxError::InvalidData(reason) => write!(f, "Invalid PDX data: {}", reason),
            PdxError::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for PdxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PdxError::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SerError> for PdxError {
    fn from(err: SerError) -> Self {
        PdxError::Serialization(err)
    }
}

/// Result type for PDX operations.
pub type Result<T> = std::result::Result<T, PdxError>;
