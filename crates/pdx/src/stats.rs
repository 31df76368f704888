// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec statistics with atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Serialization counters shared by every codec of one registry.
///
/// Thread-safe: counters use atomics (Relaxed ordering).
#[derive(Debug, Default)]
pub struct PdxStats {
    serializations: AtomicU64,
    serialized_bytes: AtomicU64,
    deserializations: AtomicU64,
    deserialized_bytes: AtomicU64,
    instance_creations: AtomicU64,
    merged_types: AtomicU64,
    unread_field_entries: AtomicU64,
}

/// Point-in-time copy of [`PdxStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdxStatsSnapshot {
    pub serializations: u64,
    pub serialized_bytes: u64,
    pub deserializations: u64,
    pub deserialized_bytes: u64,
    pub instance_creations: u64,
    pub merged_types: u64,
    pub unread_field_entries: u64,
}

impl PdxStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one encoded record of `bytes` bytes (header included).
    pub fn record_serialization(&self, bytes: usize) {
        self.serializations.fetch_add(1, Ordering::Relaxed);
        self.serialized_bytes
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record one decoded record of `bytes` bytes (header included).
    pub fn record_deserialization(&self, bytes: usize) {
        self.deserializations.fetch_add(1, Ordering::Relaxed);
        self.deserialized_bytes
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_instance_creation(&self) {
        self.instance_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_merged_type(&self) {
        self.merged_types.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unread_fields(&self) {
        self.unread_field_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PdxStatsSnapshot {
        PdxStatsSnapshot {
            serializations: self.serializations.load(Ordering::Relaxed),
            serialized_bytes: self.serialized_bytes.load(Ordering::Relaxed),
            deserializations: self.deserializations.load(Ordering::Relaxed),
            deserialized_bytes: self.deserialized_bytes.load(Ordering::Relaxed),
            instance_creations: self.instance_creations.load(Ordering::Relaxed),
            merged_types: self.merged_types.load(Ordering::Relaxed),
            unread_field_entries: self.unread_field_entries.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.serializations,
            &self.serialized_bytes,
            &self.deserializations,
            &self.deserialized_bytes,
            &self.instance_creations,
            &self.merged_types,
            &self.unread_field_entries,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
