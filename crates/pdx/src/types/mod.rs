// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema model: field types, schema descriptors, merging and enum identities.

mod enum_info;
mod field;
mod field_type;
pub mod layout;
mod merge;
mod schema;
mod schema_codec;

pub use enum_info::EnumInfo;
pub use field::{FieldAnchor, PdxFieldType};
pub use field_type::FieldType;
pub use layout::RecordLayout;
pub use merge::{FieldMapping, FieldMaps};
pub use schema::PdxType;
