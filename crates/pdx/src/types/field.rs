// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field descriptors and their positional anchors.

use super::layout::RecordLayout;
use super::FieldType;
use crate::error::{PdxError, Result};

/// Where a field's value starts inside a record body.
///
/// Computed once by [`super::PdxType::initialize`]; resolving it needs the
/// record's offset table only for the `VarOffset` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldAnchor {
    /// Fixed distance from the start of the body.
    Start(usize),
    /// `back` bytes before the value of variable field `var_index`.
    VarOffset { var_index: usize, back: usize },
    /// `back` bytes before the end of the body.
    End { back: usize },
}

impl FieldAnchor {
    /// Body offset this anchor points at, checked against the body length.
    pub fn resolve(self, layout: &RecordLayout<'_>) -> Result<usize> {
        let position = match self {
            FieldAnchor::Start(at) => Some(at),
            FieldAnchor::VarOffset { var_index, back } => {
                layout.var_offset(var_index)?.checked_sub(back)
            }
            FieldAnchor::End { back } => layout.body_len().checked_sub(back),
        };
        match position {
            Some(at) if at <= layout.body_len() => Ok(at),
            _ => Err(PdxError::InvalidData(format!(
                "field anchor {:?} falls outside a {}-byte body",
                self,
                layout.body_len()
            ))),
        }
    }
}

/// One named, typed field of a [`super::PdxType`].
#[derive(Debug, Clone)]
pub struct PdxFieldType {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) sequence_id: usize,
    pub(crate) var_index: usize,
    pub(crate) identity: bool,
    pub(crate) anchor: Option<FieldAnchor>,
}

impl PdxFieldType {
    pub(crate) fn new(name: &str, field_type: FieldType, sequence_id: usize, var_index: usize) -> Self {
        Self {
            name: name.to_owned(),
            field_type,
            sequence_id,
            var_index,
            identity: false,
            anchor: None,
        }
    }

    /// Field name, unique within its schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire type of the field's value.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Zero-based position in the schema's field list.
    pub fn sequence_id(&self) -> usize {
        self.sequence_id
    }

    /// Ordinal among the variable-length fields (only meaningful for them).
    pub fn var_index(&self) -> usize {
        self.var_index
    }

    /// Whether the value's size depends on its content.
    pub fn is_variable_length(&self) -> bool {
        self.field_type.is_variable_length()
    }

    /// Encoded size in bytes; 0 for variable-length types.
    pub fn fixed_size(&self) -> usize {
        self.field_type.fixed_size()
    }

    /// Whether the field takes part in record equality.
    pub fn is_identity_field(&self) -> bool {
        self.identity
    }

    /// Positional anchor, `None` until the schema is initialized.
    pub fn anchor(&self) -> Option<FieldAnchor> {
        self.anchor
    }

    /// Same name and wire type, wherever the field sits.
    pub fn same_shape(&self, other: &PdxFieldType) -> bool {
        self.name == other.name && self.field_type == other.field_type
    }
}

impl PartialEq for PdxFieldType {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(other) && self.sequence_id == other.sequence_id
    }
}

impl Eq for PdxFieldType {}

impl std::hash::Hash for PdxFieldType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.field_type.hash(state);
        self.sequence_id.hash(state);
    }
}
