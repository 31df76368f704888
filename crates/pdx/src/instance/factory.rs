// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::Arc;

use super::PdxInstance;
use crate::codec::PdxCodec;
use crate::error::{PdxError, Result};
use crate::value::PdxValue;
use crate::writer::{PdxWriter, RecordWriter};

/// Builds a [`PdxInstance`] from fields set by name at runtime.
///
/// The schema follows the order fields were added. It gets a type id when
/// the instance is first serialized.
pub struct PdxInstanceFactory {
    codec: PdxCodec,
    class_name: String,
    values: Vec<(String, PdxValue)>,
    identity: Vec<String>,
    created: bool,
}

impl PdxInstanceFactory {
    pub fn new(codec: PdxCodec, class_name: impl Into<String>) -> Self {
        Self {
            codec,
            class_name: class_name.into(),
            values: Vec::new(),
            identity: Vec::new(),
            created: false,
        }
    }

    pub fn field(&mut self, name: &str, value: impl Into<PdxValue>) -> Result<&mut Self> {
        if self.values.iter().any(|(n, _)| n == name) {
            return Err(PdxError::FieldAlreadyAdded {
                class_name: self.class_name.clone(),
                field: name.to_owned(),
            });
        }
        self.values.push((name.to_owned(), value.into()));
        Ok(self)
    }

    /// Mark an already added field as part of the record identity.
    pub fn mark_identity_field(&mut self, name: &str) -> Result<&mut Self> {
        if !self.values.iter().any(|(n, _)| n == name) {
            return Err(PdxError::UnknownField {
                class_name: self.class_name.clone(),
                field: name.to_owned(),
            });
        }
        if !self.identity.iter().any(|n| n == name) {
            self.identity.push(name.to_owned());
        }
        Ok(self)
    }

    /// Encode the fields into a new instance. Callable once.
    pub fn create(&mut self) -> Result<PdxInstance> {
        if self.created {
            return Err(PdxError::Unsupported(format!(
                "instance factory for {} already created its instance",
                self.class_name
            )));
        }

        let mut writer = RecordWriter::collecting(&self.codec, &self.class_name);
        for (name, value) in &self.values {
            writer.write_value(name, value)?;
        }
        for name in &self.identity {
            writer.mark_identity_field(name)?;
        }
        let (schema, payload) = writer.finish()?.into_payload()?;
        self.created = true;
        log::trace!(
            "[pdx::instance] created {} with {} fields",
            self.class_name,
            schema.field_count()
        );
        Ok(PdxInstance::new(
            self.codec.clone(),
            schema,
            Arc::from(payload),
        ))
    }
}
