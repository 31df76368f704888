// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # PDX - schema-evolving binary object codec
//!
//! Objects are encoded as self-describing records: a length, a type id that
//! names a registered schema, the field values in schema order, and a table
//! of offsets to the variable-length fields. Readers and writers of
//! different versions of a class interoperate: unknown fields are skipped on
//! read and retained for a while so that a re-encode does not lose them.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pdx::{LocalAuthority, PdxCodec, PdxReader, PdxSerializable, PdxTypeRegistry, PdxWriter, Result};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Sensor {
//!     id: i32,
//!     label: String,
//! }
//!
//! impl PdxSerializable for Sensor {
//!     fn class_name(&self) -> &str {
//!         "demo.Sensor"
//!     }
//!
//!     fn write_fields(&self, w: &mut dyn PdxWriter) -> Result<()> {
//!         w.write_int("id", self.id)?;
//!         w.write_string("label", &self.label)
//!     }
//!
//!     fn read_fields(&mut self, r: &mut dyn PdxReader) -> Result<()> {
//!         self.id = r.read_int("id")?;
//!         self.label = r.read_string("label")?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let registry = PdxTypeRegistry::new(Arc::new(LocalAuthority::new()));
//! let codec = PdxCodec::new(registry);
//!
//! let bytes = codec.serialize(&Sensor { id: 7, label: "boiler".into() })?;
//! let back: Sensor = codec.deserialize(&bytes)?;
//! assert_eq!(back.label, "boiler");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  PdxCodec            encode / decode entry points             |
//! +------------------------------+--------------------------------+
//! |  RecordWriter                |  RecordReader                  |
//! |  local | collecting | remote |  local | collecting | remote   |
//! +------------------------------+--------------------------------+
//! |  PdxTypeRegistry  schemas, enums, merged versions, retention  |
//! +---------------------------------------------------------------+
//! |  PdxAuthority     cluster-wide type id and enum code minting  |
//! +---------------------------------------------------------------+
//! ```

/// Wire constants and runtime configuration.
pub mod config;
/// Crate error type.
pub mod error;
/// Big-endian cursors and the compact wire encodings.
pub mod ser;
/// Schemas, field descriptors, layouts, merge.
pub mod types;
/// Type registry, authority boundary, unread-field retention.
pub mod registry;
/// Codec counters.
pub mod stats;
/// Dynamic field values.
pub mod value;
/// Domain class contract and class factories.
pub mod serializable;
/// Field encoders.
pub mod writer;
/// Field decoders.
pub mod reader;
/// Generic records.
pub mod instance;
/// Encode/decode orchestration.
pub mod codec;

pub use codec::{DecodedObject, PdxCodec};
pub use config::PdxConfig;
pub use error::{PdxError, Result};
pub use instance::{PdxInstance, PdxInstanceFactory};
pub use reader::PdxReader;
pub use registry::{
    LocalAuthority, PdxAuthority, PdxTypeRegistry, PoolContext, RetentionHandle, UnreadFields,
};
pub use serializable::{ClassRegistry, PdxSerializable};
pub use stats::{PdxStats, PdxStatsSnapshot};
pub use types::{EnumInfo, FieldMapping, FieldType, PdxType};
pub use value::{PdxDate, PdxObject, PdxValue};
pub use writer::PdxWriter;
