// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time-bounded storage of fields a decoder could not hand to its object.
//!
//! A decoded object only keeps a [`RetentionHandle`]; the bytes live here
//! until an expiry task removes them. Re-encoding after expiry silently drops
//! the unknown fields.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::expiry::{ExpiryScheduler, TaskId};

/// Stable key of one retention entry, stored in the decoded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RetentionHandle(u64);

impl RetentionHandle {
    /// Raw handle value, unique per registry.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Raw bytes of the fields a local class does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadFields {
    type_id: i32,
    merged_type_id: i32,
    blocks: Vec<Vec<u8>>,
}

impl UnreadFields {
    /// `blocks` holds one encoded value per unknown field, in the order the
    /// merged schema declares them.
    pub fn new(type_id: i32, merged_type_id: i32, blocks: Vec<Vec<u8>>) -> Self {
        Self {
            type_id,
            merged_type_id,
            blocks,
        }
    }

    /// Type id of the record the fields were read from.
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Type id of the schema used to write them back.
    pub fn merged_type_id(&self) -> i32 {
        self.merged_type_id
    }

    /// Encoded values of the unknown fields.
    pub fn blocks(&self) -> &[Vec<u8>] {
        &self.blocks
    }
}

struct Entry {
    fields: Arc<UnreadFields>,
    task: TaskId,
    expires_at: Instant,
}

pub(crate) struct RetentionStore {
    entries: RwLock<HashMap<RetentionHandle, Entry>>,
    next_handle: AtomicU64,
    scheduler: ExpiryScheduler,
}

impl RetentionStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            scheduler: ExpiryScheduler::spawn("pdx-unread-expiry"),
        })
    }

    pub(crate) fn new_handle(&self) -> RetentionHandle {
        RetentionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Store `fields` under `handle`. A new entry lives for `lifespan`; an
    /// existing one is replaced and its expiry pushed to `refresh` from now.
    /// Returns `true` when a new entry was created.
    pub(crate) fn record(
        self: &Arc<Self>,
        handle: RetentionHandle,
        fields: UnreadFields,
        lifespan: Duration,
        refresh: Duration,
    ) -> bool {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(&handle) {
            entry.fields = Arc::new(fields);
            entry.expires_at = Instant::now() + refresh;
            self.scheduler.reschedule(entry.task, refresh);
            log::debug!(
                "[pdx::retention] refreshed handle {} for {:?}",
                handle.get(),
                refresh
            );
            return false;
        }

        let task = self.arm(handle, lifespan);
        entries.insert(
            handle,
            Entry {
                fields: Arc::new(fields),
                task,
                expires_at: Instant::now() + lifespan,
            },
        );
        log::debug!(
            "[pdx::retention] retained unread fields under handle {} for {:?}",
            handle.get(),
            lifespan
        );
        true
    }

    pub(crate) fn get(&self, handle: RetentionHandle) -> Option<Arc<UnreadFields>> {
        let entries = self.entries.read();
        let entry = entries.get(&handle)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(Arc::clone(&entry.fields))
    }

    pub(crate) fn remove(&self, handle: RetentionHandle) -> bool {
        match self.entries.write().remove(&handle) {
            Some(entry) => {
                self.scheduler.cancel(entry.task);
                true
            }
            None => false,
        }
    }

    fn arm(self: &Arc<Self>, handle: RetentionHandle, delay: Duration) -> TaskId {
        let store: Weak<Self> = Arc::downgrade(self);
        self.scheduler.schedule(delay, move |task| {
            if let Some(store) = store.upgrade() {
                store.expire(handle, task);
            }
        })
    }

    /// Expiry callback; a no-op unless `task` still owns the entry. A refresh
    /// may land after the task was popped, so an entry whose deadline moved
    /// is re-armed instead of removed.
    fn expire(self: &Arc<Self>, handle: RetentionHandle, task: TaskId) {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get(&handle) else {
            return;
        };
        if entry.task != task {
            return;
        }
        let now = Instant::now();
        if entry.expires_at <= now {
            entries.remove(&handle);
            log::debug!("[pdx::retention] handle {} expired", handle.get());
            return;
        }
        let remaining = entry.expires_at - now;
        let rearmed = self.arm(handle, remaining);
        if let Some(entry) = entries.get_mut(&handle) {
            entry.task = rearmed;
        }
        log::trace!(
            "[pdx::retention] handle {} refreshed after its timer fired, re-armed for {:?}",
            handle.get(),
            remaining
        );
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
        self.scheduler.cancel_all();
    }
}
