// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Contract between domain classes and the codec.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::instance::PdxInstance;
use crate::reader::PdxReader;
use crate::registry::RetentionHandle;
use crate::writer::PdxWriter;

/// A domain class the codec can encode and decode.
///
/// `write_fields` and `read_fields` should visit the same fields in the same
/// order; decoding an older or newer version relies on that order for its
/// sequential fast path.
pub trait PdxSerializable: Send + Sync {
    fn class_name(&self) -> &str;

    fn write_fields(&self, writer: &mut dyn PdxWriter) -> Result<()>;

    fn read_fields(&mut self, reader: &mut dyn PdxReader) -> Result<()>;

    /// Handle of the fields this object could not read, if any were retained.
    fn retention_handle(&self) -> Option<RetentionHandle> {
        None
    }

    /// Called by the decoder with the handle of fields retained for this
    /// object, or `None` when a later decode left nothing unread.
    /// Objects that do not store the handle lose unknown fields on re-encode.
    fn set_retention_handle(&mut self, _handle: Option<RetentionHandle>) {}

    /// Generic records return themselves so the encoder can reuse their bytes.
    fn as_pdx_instance(&self) -> Option<&PdxInstance> {
        None
    }
}

type Factory = Box<dyn Fn() -> Box<dyn PdxSerializable> + Send + Sync>;

/// Factories of the domain classes known to this process, by class name.
#[derive(Default)]
pub struct ClassRegistry {
    factories: RwLock<HashMap<String, Factory>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under the class name its default value reports.
    pub fn register<T>(&self)
    where
        T: PdxSerializable + Default + 'static,
    {
        let class_name = T::default().class_name().to_owned();
        self.register_factory(class_name, || Box::new(T::default()));
    }

    pub fn register_factory<F>(&self, class_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn PdxSerializable> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(class_name.into(), Box::new(factory));
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.read().contains_key(class_name)
    }

    pub fn create(&self, class_name: &str) -> Option<Box<dyn PdxSerializable>> {
        self.factories.read().get(class_name).map(|factory| factory())
    }
}
