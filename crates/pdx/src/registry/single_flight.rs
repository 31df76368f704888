// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collapse concurrent computations of the same key into one call.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::Result;

/// Per-key slots: the first caller computes while later callers for the same
/// key wait on the slot and reuse the value. A failed computation leaves the
/// slot empty so the next waiter tries again.
pub(crate) struct SingleFlight<K, V> {
    slots: DashMap<K, Arc<Mutex<Option<V>>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    pub(crate) fn run<F>(&self, key: &K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = Arc::clone(&self.slots.entry(key.clone()).or_default());
        let mut value = slot.lock();
        if let Some(v) = value.as_ref() {
            return Ok(v.clone());
        }
        let computed = compute();
        if let Ok(v) = &computed {
            *value = Some(v.clone());
        }
        drop(value);
        self.slots.remove_if(key, |_, s| Arc::ptr_eq(s, &slot));
        computed
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.slots.len()
    }
}
