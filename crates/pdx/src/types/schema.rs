// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema descriptor of one PDX class version.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::field::{FieldAnchor, PdxFieldType};
use super::layout::RecordLayout;
use super::merge::FieldMaps;
use super::FieldType;
use crate::error::{PdxError, Result};

/// Ordered field list of one class version plus its positional layout.
///
/// Built mutably, initialized, then shared behind an `Arc`. After sharing
/// only the type id (assigned once), the local flag and the field-map cache
/// change.
pub struct PdxType {
    class_name: String,
    type_id: AtomicI32,
    is_local: AtomicBool,
    fields: Vec<PdxFieldType>,
    by_name: HashMap<String, usize>,
    var_field_count: usize,
    initialized: bool,
    maps: Mutex<Option<Arc<FieldMaps>>>,
}

impl PdxType {
    /// Empty, uninitialized schema for `class_name` with no type id.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            type_id: AtomicI32::new(0),
            is_local: AtomicBool::new(false),
            fields: Vec::new(),
            by_name: HashMap::new(),
            var_field_count: 0,
            initialized: false,
            maps: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append a field of any type.
    pub fn add_field(&mut self, name: &str, field_type: FieldType) -> Result<()> {
        if field_type.is_variable_length() {
            self.add_variable_length_field(name, field_type)
        } else {
            self.add_fixed_length_field(name, field_type)
        }
    }

    /// Append a fixed-size field; rejects variable-length types.
    pub fn add_fixed_length_field(&mut self, name: &str, field_type: FieldType) -> Result<()> {
        if field_type.is_variable_length() {
            return Err(PdxError::InvalidData(format!(
                "{} is not a fixed-length type",
                field_type
            )));
        }
        self.push_field(name, field_type)
    }

    /// Append a variable-length field; rejects fixed-size types.
    pub fn add_variable_length_field(&mut self, name: &str, field_type: FieldType) -> Result<()> {
        if !field_type.is_variable_length() {
            return Err(PdxError::InvalidData(format!(
                "{} is not a variable-length type",
                field_type
            )));
        }
        self.push_field(name, field_type)
    }

    fn push_field(&mut self, name: &str, field_type: FieldType) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(PdxError::FieldAlreadyAdded {
                class_name: self.class_name.clone(),
                field: name.to_owned(),
            });
        }
        let var_index = self.var_field_count;
        if field_type.is_variable_length() {
            self.var_field_count += 1;
        }
        let sequence_id = self.fields.len();
        self.by_name.insert(name.to_owned(), sequence_id);
        self.fields
            .push(PdxFieldType::new(name, field_type, sequence_id, var_index));
        self.initialized = false;
        Ok(())
    }

    /// Flag a field as part of the record identity (equality and hashing).
    pub fn mark_identity_field(&mut self, name: &str) -> Result<()> {
        let index = self.by_name.get(name).copied().ok_or_else(|| PdxError::UnknownField {
            class_name: self.class_name.clone(),
            field: name.to_owned(),
        })?;
        self.fields[index].identity = true;
        Ok(())
    }

    /// Compute the positional anchor of every field.
    ///
    /// Fields up to and including the first variable field are addressed from
    /// the start of the body. Later variable fields use the offset table, and
    /// fixed fields after them are addressed backward from the next variable
    /// field or from the end of the body.
    pub fn initialize(&mut self) {
        let mut running = 0usize;
        let mut first_var = None;
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.anchor = Some(FieldAnchor::Start(running));
            if field.is_variable_length() {
                first_var = Some(i);
                break;
            }
            running += field.fixed_size();
        }

        if let Some(first_var) = first_var {
            let mut next_var: Option<usize> = None;
            let mut back = 0usize;
            for field in self.fields[first_var + 1..].iter_mut().rev() {
                if field.is_variable_length() {
                    next_var = Some(field.var_index);
                    back = 0;
                    field.anchor = Some(FieldAnchor::VarOffset {
                        var_index: field.var_index,
                        back: 0,
                    });
                } else {
                    back += field.fixed_size();
                    field.anchor = Some(match next_var {
                        Some(var_index) => FieldAnchor::VarOffset { var_index, back },
                        None => FieldAnchor::End { back },
                    });
                }
            }
        }
        self.initialized = true;
    }

    /// Copy of the field list under a fresh, unassigned identity.
    pub(crate) fn duplicate(&self) -> PdxType {
        let mut copy = PdxType::new(self.class_name.clone());
        copy.fields = self.fields.clone();
        copy.by_name = self.by_name.clone();
        copy.var_field_count = self.var_field_count;
        copy.initialized = self.initialized;
        copy
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Fully qualified class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Authority-assigned id, 0 while unassigned.
    pub fn type_id(&self) -> i32 {
        self.type_id.load(Ordering::Acquire)
    }

    /// Assign the type id. Only the first assignment sticks; returns whether
    /// the schema now carries `id`.
    pub fn assign_type_id(&self, id: i32) -> bool {
        match self
            .type_id
            .compare_exchange(0, id, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == id,
        }
    }

    /// Whether this schema was produced by this process's own classes.
    pub fn is_local(&self) -> bool {
        self.is_local.load(Ordering::Acquire)
    }

    /// Set whether the schema matches this process's class layout.
    pub fn set_local(&self, local: bool) {
        self.is_local.store(local, Ordering::Release);
    }

    /// Whether [`PdxType::initialize`] has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    /// Fields in wire order.
    pub fn fields(&self) -> &[PdxFieldType] {
        &self.fields
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of variable-length fields.
    pub fn var_field_count(&self) -> usize {
        self.var_field_count
    }

    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&PdxFieldType> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Sequence position of the named field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Field at sequence position `index`.
    pub fn field_at(&self, index: usize) -> Option<&PdxFieldType> {
        self.fields.get(index)
    }

    /// Fields marked as identity, or every field when none is marked.
    pub fn identity_fields(&self) -> Vec<&PdxFieldType> {
        let marked: Vec<_> = self.fields.iter().filter(|f| f.identity).collect();
        if marked.is_empty() {
            self.fields.iter().collect()
        } else {
            marked
        }
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    /// Layout of a payload encoded with this schema.
    pub fn layout<'a>(&self, payload: &'a [u8]) -> Result<RecordLayout<'a>> {
        RecordLayout::new(payload, self.var_field_count)
    }

    /// Body offset of the field at `index`.
    pub fn field_position(&self, index: usize, layout: &RecordLayout<'_>) -> Result<usize> {
        let field = self.fields.get(index).ok_or_else(|| {
            PdxError::InvalidData(format!(
                "field index {} out of range for {}",
                index, self.class_name
            ))
        })?;
        let anchor = field.anchor.ok_or_else(|| PdxError::NotInitialized {
            class_name: self.class_name.clone(),
        })?;
        anchor.resolve(layout)
    }

    /// Body offset of the named field, `None` when the schema lacks it.
    pub fn field_position_by_name(
        &self,
        name: &str,
        layout: &RecordLayout<'_>,
    ) -> Result<Option<usize>> {
        match self.field_index(name) {
            Some(index) => self.field_position(index, layout).map(Some),
            None => Ok(None),
        }
    }

    /// Byte range `[start, end)` of the field's encoded value in the body.
    pub fn field_span(&self, index: usize, layout: &RecordLayout<'_>) -> Result<(usize, usize)> {
        let start = self.field_position(index, layout)?;
        let end = if index + 1 < self.fields.len() {
            self.field_position(index + 1, layout)?
        } else {
            layout.body_len()
        };
        if end < start {
            return Err(PdxError::InvalidData(format!(
                "field {} of {} ends before it starts",
                index, self.class_name
            )));
        }
        Ok((start, end))
    }

    // -----------------------------------------------------------------------
    // Field maps against the local schema
    // -----------------------------------------------------------------------

    /// Field maps of this schema relative to `local`, cached per local type id.
    pub fn field_maps(&self, local: &PdxType) -> Result<Arc<FieldMaps>> {
        let mut cached = self.maps.lock();
        if let Some(maps) = cached.as_ref() {
            if maps.local_type_id() == local.type_id() && local.type_id() != 0 {
                return Ok(Arc::clone(maps));
            }
        }
        let maps = Arc::new(FieldMaps::between(local, self)?);
        *cached = Some(Arc::clone(&maps));
        Ok(maps)
    }

    /// Number of fields of this schema the local schema does not know.
    pub fn number_of_extra_fields(&self, local: &PdxType) -> Result<usize> {
        Ok(self.field_maps(local)?.extra_field_count())
    }
}

impl PartialEq for PdxType {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name && self.fields == other.fields
    }
}

impl Eq for PdxType {}

impl Hash for PdxType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_name.hash(state);
        self.fields.hash(state);
    }
}

impl fmt::Debug for PdxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdxType")
            .field("class_name", &self.class_name)
            .field("type_id", &self.type_id())
            .field("is_local", &self.is_local())
            .field(
                "fields",
                &self
                    .fields
                    .iter()
                    .map(|fld| (fld.name.as_str(), fld.field_type))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for PdxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PdxType[{}, id={}]{{", self.class_name, self.type_id())?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", field.name, field.field_type)?;
        }
        f.write_str("}")
    }
}
