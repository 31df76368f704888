// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version merging and field maps between two versions of one class.

use std::sync::Arc;

use super::PdxType;
use crate::error::{PdxError, Result};

// ---------------------------------------------------------------------------
// Field maps
// ---------------------------------------------------------------------------

/// Where a field of one schema lives in another schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMapping {
    /// The other schema has no field with this name.
    Absent,
    /// Same sequence position in both schemas; part of the leading run of
    /// identical fields, so sequential decoding needs no seek.
    SamePosition(usize),
    /// Index of the same-named field in the other schema.
    RemotePosition(usize),
}

/// Maps between the local schema of a class and another version of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMaps {
    local_type_id: i32,
    local_to_remote: Vec<FieldMapping>,
    remote_to_local: Vec<FieldMapping>,
    extra_fields: usize,
}

impl FieldMaps {
    /// Compute both directions between `local` and `remote`.
    pub fn between(local: &PdxType, remote: &PdxType) -> Result<Self> {
        check_compatible(local, remote)?;

        let shared_prefix = local
            .fields()
            .iter()
            .zip(remote.fields())
            .take_while(|(l, r)| l.same_shape(r))
            .count();

        let map = |from: &PdxType, to: &PdxType| -> Vec<FieldMapping> {
            from.fields()
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    if i < shared_prefix {
                        FieldMapping::SamePosition(i)
                    } else {
                        match to.field_index(field.name()) {
                            Some(j) => FieldMapping::RemotePosition(j),
                            None => FieldMapping::Absent,
                        }
                    }
                })
                .collect()
        };

        let local_to_remote = map(local, remote);
        let remote_to_local = map(remote, local);
        let extra_fields = remote_to_local
            .iter()
            .filter(|m| **m == FieldMapping::Absent)
            .count();

        Ok(Self {
            local_type_id: local.type_id(),
            local_to_remote,
            remote_to_local,
            extra_fields,
        })
    }

    /// Type id of the local schema the maps were built for.
    pub fn local_type_id(&self) -> i32 {
        self.local_type_id
    }

    /// One entry per local field.
    pub fn local_to_remote(&self) -> &[FieldMapping] {
        &self.local_to_remote
    }

    /// One entry per remote field.
    pub fn remote_to_local(&self) -> &[FieldMapping] {
        &self.remote_to_local
    }

    /// Remote fields the local schema lacks.
    pub fn extra_field_count(&self) -> usize {
        self.extra_fields
    }

    /// Indices of remote fields the local schema lacks, in remote order.
    pub fn extra_field_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.remote_to_local
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == FieldMapping::Absent)
            .map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Fail when both schemas declare one name with different wire types.
fn check_compatible(a: &PdxType, b: &PdxType) -> Result<()> {
    for field in a.fields() {
        if let Some(other) = b.field(field.name()) {
            if other.field_type() != field.field_type() {
                return Err(PdxError::MergeIncompatible {
                    class_name: a.class_name().to_owned(),
                    field: field.name().to_owned(),
                    left: field.field_type(),
                    right: other.field_type(),
                });
            }
        }
    }
    Ok(())
}

/// Every field of `inner` exists in `outer` with the same type (any order).
fn contains_all(outer: &PdxType, inner: &PdxType) -> bool {
    inner.fields().iter().all(|f| {
        outer
            .field(f.name())
            .is_some_and(|o| o.field_type() == f.field_type())
    })
}

impl PdxType {
    /// Union of two versions of one class.
    ///
    /// Returns `self` when it already holds every field of `other`, `other`
    /// when it holds every field of `self`, otherwise a new initialized schema
    /// with `self`'s fields followed by the fields only `other` declares. The
    /// new schema has no type id yet.
    pub fn merge_version(self: &Arc<Self>, other: &Arc<Self>) -> Result<Arc<PdxType>> {
        check_compatible(self, other)?;
        if contains_all(self, other) {
            return Ok(Arc::clone(self));
        }
        if contains_all(other, self) {
            return Ok(Arc::clone(other));
        }

        let mut merged = self.duplicate();
        for field in other.fields() {
            if merged.field(field.name()).is_none() {
                merged.add_field(field.name(), field.field_type())?;
                if field.is_identity_field() {
                    merged.mark_identity_field(field.name())?;
                }
            }
        }
        merged.initialize();
        log::debug!(
            "[pdx::merge] merged {} ({} + {} fields) into {} fields",
            self.class_name(),
            self.field_count(),
            other.field_count(),
            merged.field_count()
        );
        Ok(Arc::new(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn schema(fields: &[(&str, FieldType)]) -> Arc<PdxType> {
        let mut ty = PdxType::new("com.example.Person");
        for (name, ft) in fields {
            ty.add_field(name, *ft).expect("add field");
        }
        ty.initialize();
        Arc::new(ty)
    }

    fn names(ty: &PdxType) -> Vec<&str> {
        ty.fields().iter().map(|f| f.name()).collect()
    }

    #[test]
    fn test_merge_subset_returns_existing() {
        let big = schema(&[("a", FieldType::Int), ("b", FieldType::String)]);
        let small = schema(&[("b", FieldType::String)]);
        assert!(Arc::ptr_eq(&big.merge_version(&small).expect("merge"), &big));
        assert!(Arc::ptr_eq(&small.merge_version(&big).expect("merge"), &big));
    }

    #[test]
    fn test_merge_ignores_order_for_containment() {
        let a = schema(&[("x", FieldType::Int), ("y", FieldType::Long)]);
        let b = schema(&[("y", FieldType::Long), ("x", FieldType::Int)]);
        assert!(Arc::ptr_eq(&a.merge_version(&b).expect("merge"), &a));
    }

    #[test]
    fn test_merge_appends_missing_fields() {
        let local = schema(&[("a", FieldType::Int), ("b", FieldType::String)]);
        let remote = schema(&[("a", FieldType::Int), ("c", FieldType::Double)]);
        let merged = local.merge_version(&remote).expect("merge");
        assert_eq!(names(&merged), vec!["a", "b", "c"]);
        assert!(merged.is_initialized());
        assert_eq!(merged.type_id(), 0);
        assert_eq!(merged.field("c").map(|f| f.field_type()), Some(FieldType::Double));
    }

    #[test]
    fn test_merge_is_symmetric_in_field_set() {
        let a = schema(&[("a", FieldType::Int), ("b", FieldType::String)]);
        let b = schema(&[("c", FieldType::Long), ("a", FieldType::Int)]);
        let ab = a.merge_version(&b).expect("merge ab");
        let ba = b.merge_version(&a).expect("merge ba");
        let mut n1 = names(&ab);
        let mut n2 = names(&ba);
        n1.sort_unstable();
        n2.sort_unstable();
        assert_eq!(n1, n2);
        for field in ab.fields() {
            assert_eq!(
                ba.field(field.name()).map(|f| f.field_type()),
                Some(field.field_type())
            );
        }

        // either merge order serves as the remote schema for both inputs
        for input in [&a, &b] {
            let via_ab = FieldMaps::between(input, &ab).expect("maps ab");
            let via_ba = FieldMaps::between(input, &ba).expect("maps ba");
            assert_eq!(via_ab.extra_field_count(), via_ba.extra_field_count());
            assert_eq!(via_ab.extra_field_count(), 1);
            for (merged, maps) in [(&ab, &via_ab), (&ba, &via_ba)] {
                for (i, field) in input.fields().iter().enumerate() {
                    let at = position(&maps.local_to_remote()[i]).expect("mapped");
                    assert_eq!(merged.fields()[at].name(), field.name());
                }
                for (j, field) in merged.fields().iter().enumerate() {
                    match position(&maps.remote_to_local()[j]) {
                        Some(i) => assert_eq!(input.fields()[i].name(), field.name()),
                        None => assert!(input.field(field.name()).is_none()),
                    }
                }
            }
        }
    }

    fn position(mapping: &FieldMapping) -> Option<usize> {
        match *mapping {
            FieldMapping::Absent => None,
            FieldMapping::SamePosition(i) | FieldMapping::RemotePosition(i) => Some(i),
        }
    }

    #[test]
    fn test_merge_type_conflict_is_rejected() {
        let a = schema(&[("age", FieldType::Int)]);
        let b = schema(&[("age", FieldType::String)]);
        let err = a.merge_version(&b).unwrap_err();
        assert!(matches!(err, PdxError::MergeIncompatible { .. }));
    }

    #[test]
    fn test_field_maps_leading_run_and_absent() {
        let local = schema(&[
            ("id", FieldType::Int),
            ("name", FieldType::String),
            ("age", FieldType::Int),
        ]);
        let remote = schema(&[
            ("id", FieldType::Int),
            ("name", FieldType::String),
            ("email", FieldType::String),
            ("age", FieldType::Int),
            ("score", FieldType::Double),
        ]);
        let maps = FieldMaps::between(&local, &remote).expect("maps");
        assert_eq!(
            maps.local_to_remote(),
            &[
                FieldMapping::SamePosition(0),
                FieldMapping::SamePosition(1),
                FieldMapping::RemotePosition(3),
            ]
        );
        assert_eq!(
            maps.remote_to_local(),
            &[
                FieldMapping::SamePosition(0),
                FieldMapping::SamePosition(1),
                FieldMapping::Absent,
                FieldMapping::RemotePosition(2),
                FieldMapping::Absent,
            ]
        );
        assert_eq!(maps.extra_field_count(), 2);
        assert_eq!(maps.extra_field_indices().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_field_maps_reordered() {
        let local = schema(&[("a", FieldType::Int), ("b", FieldType::Long)]);
        let remote = schema(&[("b", FieldType::Long), ("a", FieldType::Int)]);
        let maps = FieldMaps::between(&local, &remote).expect("maps");
        assert_eq!(
            maps.local_to_remote(),
            &[FieldMapping::RemotePosition(1), FieldMapping::RemotePosition(0)]
        );
        assert_eq!(maps.extra_field_count(), 0);
    }

    #[test]
    fn test_field_maps_cached_on_schema() {
        let local = schema(&[("a", FieldType::Int)]);
        local.assign_type_id(3);
        let remote = schema(&[("a", FieldType::Int), ("z", FieldType::Byte)]);
        let first = remote.field_maps(&local).expect("maps");
        let second = remote.field_maps(&local).expect("maps");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(remote.number_of_extra_fields(&local).expect("extra"), 1);
    }
}
