// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary to the cluster-wide authority that mints type ids and enum codes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{PdxError, Result};
use crate::types::{EnumInfo, PdxType};

/// Connection context forwarded to the authority (which pool or server group
/// to ask). Opaque to the codec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PoolContext {
    name: Option<String>,
}

impl PoolContext {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Cluster-wide registry of schemas and enum identities.
///
/// Implementations may block on network I/O; the type registry never holds
/// its own locks while calling them.
pub trait PdxAuthority: Send + Sync {
    /// Id for `ty`; equal schemas must get equal ids.
    fn mint_type_id(&self, pool: &PoolContext, ty: &PdxType) -> Result<i32>;

    /// Schema registered under `type_id`, initialized, `None` if unknown.
    fn fetch_type(&self, pool: &PoolContext, type_id: i32) -> Result<Option<PdxType>>;

    /// Code for `info`; equal identities must get equal codes.
    fn mint_enum_code(&self, pool: &PoolContext, info: &EnumInfo) -> Result<i32>;

    fn fetch_enum(&self, pool: &PoolContext, code: i32) -> Result<Option<EnumInfo>>;
}

#[derive(Default)]
struct AuthorityState {
    type_ids: HashMap<Vec<u8>, i32>,
    types: HashMap<i32, Vec<u8>>,
    enum_codes: HashMap<EnumInfo, i32>,
    enums: HashMap<i32, Vec<u8>>,
    next_type_id: i32,
    next_enum_code: i32,
}

/// Call counters of a [`LocalAuthority`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorityCalls {
    pub mint_type_id: u64,
    pub fetch_type: u64,
    pub mint_enum_code: u64,
    pub fetch_enum: u64,
}

/// In-process authority for single-process deployments and tests.
///
/// Schemas and enum identities are stored in their binary form, so every
/// fetch yields a fresh, non-local copy as a remote authority would. Several
/// registries sharing one `LocalAuthority` behave like separate processes
/// of one cluster.
pub struct LocalAuthority {
    state: Mutex<AuthorityState>,
    available: AtomicBool,
    mint_type_calls: AtomicU64,
    fetch_type_calls: AtomicU64,
    mint_enum_calls: AtomicU64,
    fetch_enum_calls: AtomicU64,
}

impl LocalAuthority {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AuthorityState {
                next_type_id: 1,
                next_enum_code: 1,
                ..AuthorityState::default()
            }),
            available: AtomicBool::new(true),
            mint_type_calls: AtomicU64::new(0),
            fetch_type_calls: AtomicU64::new(0),
            mint_enum_calls: AtomicU64::new(0),
            fetch_enum_calls: AtomicU64::new(0),
        }
    }

    /// Make every later call fail with `AuthorityUnavailable` (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> AuthorityCalls {
        AuthorityCalls {
            mint_type_id: self.mint_type_calls.load(Ordering::SeqCst),
            fetch_type: self.fetch_type_calls.load(Ordering::SeqCst),
            mint_enum_code: self.mint_enum_calls.load(Ordering::SeqCst),
            fetch_enum: self.fetch_enum_calls.load(Ordering::SeqCst),
        }
    }

    pub fn type_count(&self) -> usize {
        self.state.lock().types.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PdxError::AuthorityUnavailable(
                "local authority switched off".into(),
            ))
        }
    }
}

impl Default for LocalAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl PdxAuthority for LocalAuthority {
    fn mint_type_id(&self, _pool: &PoolContext, ty: &PdxType) -> Result<i32> {
        self.mint_type_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let key = ty.duplicate().to_bytes();
        let mut state = self.state.lock();
        if let Some(id) = state.type_ids.get(&key) {
            return Ok(*id);
        }
        let id = state.next_type_id;
        state.next_type_id += 1;
        let stored = ty.duplicate();
        stored.assign_type_id(id);
        state.types.insert(id, stored.to_bytes());
        state.type_ids.insert(key, id);
        Ok(id)
    }

    fn fetch_type(&self, _pool: &PoolContext, type_id: i32) -> Result<Option<PdxType>> {
        self.fetch_type_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let bytes = self.state.lock().types.get(&type_id).cloned();
        bytes.map(|b| PdxType::from_bytes(&b)).transpose()
    }

    fn mint_enum_code(&self, _pool: &PoolContext, info: &EnumInfo) -> Result<i32> {
        self.mint_enum_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut state = self.state.lock();
        if let Some(code) = state.enum_codes.get(info) {
            return Ok(*code);
        }
        let code = state.next_enum_code;
        state.next_enum_code += 1;
        state.enum_codes.insert(info.clone(), code);
        state.enums.insert(code, info.to_bytes());
        Ok(code)
    }

    fn fetch_enum(&self, _pool: &PoolContext, code: i32) -> Result<Option<EnumInfo>> {
        self.fetch_enum_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let bytes = self.state.lock().enums.get(&code).cloned();
        bytes.map(|b| EnumInfo::from_bytes(&b)).transpose()
    }
}
