// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PDX type registry.
//!
//! Process-side cache of every schema and enum identity this process has seen,
//! backed by a [`PdxAuthority`] for ids it does not know yet.
//!
//! # Locking
//!
//! The four type maps and the two enum maps share one `RwLock`; unread-field
//! retention has its own. The registry lock is never held across an
//! authority call: lookups take the read lock, release it, call the
//! authority, then re-check under the write lock before inserting. Concurrent
//! id requests for one schema are collapsed so the authority mints once.

mod authority;
mod expiry;
mod retention;
mod single_flight;

pub use authority::{AuthorityCalls, LocalAuthority, PdxAuthority, PoolContext};
pub use expiry::{ExpiryScheduler, TaskId};
pub use retention::{RetentionHandle, UnreadFields};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{PdxConfig, RuntimeConfig};
use crate::error::{PdxError, Result};
use crate::stats::PdxStats;
use crate::types::{EnumInfo, PdxType};
use retention::RetentionStore;
use single_flight::SingleFlight;

#[derive(Default)]
struct TypeMaps {
    by_id: HashMap<i32, Arc<PdxType>>,
    local: HashMap<String, Arc<PdxType>>,
    merged: HashMap<i32, Arc<PdxType>>,
    ids: HashMap<Arc<PdxType>, i32>,
    enum_codes: HashMap<EnumInfo, i32>,
    enums: HashMap<i32, EnumInfo>,
}

/// Schema and enum registry shared by every codec of one process.
pub struct PdxTypeRegistry {
    authority: Arc<dyn PdxAuthority>,
    maps: RwLock<TypeMaps>,
    type_id_flight: SingleFlight<Arc<PdxType>, i32>,
    enum_flight: SingleFlight<EnumInfo, i32>,
    retention: Arc<RetentionStore>,
    config: RuntimeConfig,
    stats: PdxStats,
}

impl PdxTypeRegistry {
    pub fn new(authority: Arc<dyn PdxAuthority>) -> Arc<Self> {
        Self::with_config(authority, PdxConfig::default())
    }

    pub fn with_config(authority: Arc<dyn PdxAuthority>, config: PdxConfig) -> Arc<Self> {
        Arc::new(Self {
            authority,
            maps: RwLock::new(TypeMaps::default()),
            type_id_flight: SingleFlight::new(),
            enum_flight: SingleFlight::new(),
            retention: RetentionStore::new(),
            config: RuntimeConfig::new(config),
            stats: PdxStats::new(),
        })
    }

    pub fn authority(&self) -> &Arc<dyn PdxAuthority> {
        &self.authority
    }

    pub fn config(&self) -> Arc<PdxConfig> {
        self.config.load()
    }

    pub fn set_config(&self, config: PdxConfig) {
        self.config.store(config);
    }

    pub fn stats(&self) -> &PdxStats {
        &self.stats
    }

    // -----------------------------------------------------------------------
    // Type ids
    // -----------------------------------------------------------------------

    fn known_type_id(&self, ty: &Arc<PdxType>) -> Option<i32> {
        let maps = self.maps.read();
        let id = ty.type_id();
        if id != 0 && maps.by_id.contains_key(&id) {
            return Some(id);
        }
        maps.ids.get(ty).copied()
    }

    /// Id of `ty`, minted by the authority on first use.
    ///
    /// The id is also assigned to `ty` itself and the schema becomes
    /// reachable through [`Self::get_type`].
    pub fn resolve_type_id(&self, ty: &Arc<PdxType>, pool: &PoolContext) -> Result<i32> {
        if let Some(id) = self.known_type_id(ty) {
            ty.assign_type_id(id);
            return Ok(id);
        }

        let id = self.type_id_flight.run(ty, || {
            if let Some(id) = self.known_type_id(ty) {
                return Ok(id);
            }
            let minted = self.authority.mint_type_id(pool, ty)?;

            let mut maps = self.maps.write();
            if let Some(existing) = maps.ids.get(ty) {
                return Ok(*existing);
            }
            maps.ids.insert(Arc::clone(ty), minted);
            maps.by_id.entry(minted).or_insert_with(|| Arc::clone(ty));
            log::debug!(
                "[pdx::registry] type id {} assigned to {}",
                minted,
                ty.class_name()
            );
            Ok(minted)
        })?;

        if !ty.assign_type_id(id) {
            log::warn!(
                "[pdx::registry] {} already carries id {}, registry resolved {}",
                ty.class_name(),
                ty.type_id(),
                id
            );
        }
        Ok(id)
    }

    pub fn get_type(&self, type_id: i32) -> Option<Arc<PdxType>> {
        self.maps.read().by_id.get(&type_id).cloned()
    }

    /// Schema for `type_id`, fetched from the authority when unknown.
    pub fn get_or_fetch_type(&self, type_id: i32, pool: &PoolContext) -> Result<Arc<PdxType>> {
        if let Some(ty) = self.get_type(type_id) {
            return Ok(ty);
        }

        let fetched = self
            .authority
            .fetch_type(pool, type_id)?
            .ok_or(PdxError::UnknownTypeId(type_id))?;
        fetched.assign_type_id(type_id);

        let mut maps = self.maps.write();
        if let Some(existing) = maps.by_id.get(&type_id) {
            return Ok(Arc::clone(existing));
        }
        let fetched = Arc::new(fetched);
        maps.by_id.insert(type_id, Arc::clone(&fetched));
        maps.ids.entry(Arc::clone(&fetched)).or_insert(type_id);
        log::debug!(
            "[pdx::registry] fetched {} ({} fields) for type id {}",
            fetched.class_name(),
            fetched.field_count(),
            type_id
        );
        Ok(fetched)
    }

    pub fn add_type(&self, type_id: i32, ty: Arc<PdxType>) {
        ty.assign_type_id(type_id);
        let mut maps = self.maps.write();
        maps.ids.entry(Arc::clone(&ty)).or_insert(type_id);
        maps.by_id.insert(type_id, ty);
    }

    pub fn local_type(&self, class_name: &str) -> Option<Arc<PdxType>> {
        self.maps.read().local.get(class_name).cloned()
    }

    /// Register `ty` as the shape of its class in this process.
    pub fn add_local_type(&self, ty: Arc<PdxType>) {
        ty.set_local(true);
        self.maps
            .write()
            .local
            .insert(ty.class_name().to_owned(), ty);
    }

    /// Merged schema recorded for a remote type id.
    pub fn merged_type(&self, remote_type_id: i32) -> Option<Arc<PdxType>> {
        self.maps.read().merged.get(&remote_type_id).cloned()
    }

    pub fn set_merged_type(&self, remote_type_id: i32, merged: Arc<PdxType>) {
        self.maps.write().merged.insert(remote_type_id, merged);
    }

    pub fn type_count(&self) -> usize {
        self.maps.read().by_id.len()
    }

    // -----------------------------------------------------------------------
    // Enums
    // -----------------------------------------------------------------------

    /// Code for `info`, minted by the authority on first use.
    pub fn enum_code(&self, info: &EnumInfo, pool: &PoolContext) -> Result<i32> {
        if let Some(code) = self.maps.read().enum_codes.get(info) {
            return Ok(*code);
        }

        self.enum_flight.run(info, || {
            if let Some(code) = self.maps.read().enum_codes.get(info) {
                return Ok(*code);
            }
            let code = self.authority.mint_enum_code(pool, info)?;
            let mut maps = self.maps.write();
            let code = *maps.enum_codes.entry(info.clone()).or_insert(code);
            maps.enums.entry(code).or_insert_with(|| info.clone());
            Ok(code)
        })
    }

    /// Identity behind `code`, fetched from the authority when unknown.
    pub fn enum_info(&self, code: i32, pool: &PoolContext) -> Result<EnumInfo> {
        if let Some(info) = self.maps.read().enums.get(&code) {
            return Ok(info.clone());
        }

        let info = self
            .authority
            .fetch_enum(pool, code)?
            .ok_or(PdxError::UnknownEnumCode(code))?;

        let mut maps = self.maps.write();
        let info = maps.enums.entry(code).or_insert(info).clone();
        maps.enum_codes.entry(info.clone()).or_insert(code);
        Ok(info)
    }

    // -----------------------------------------------------------------------
    // Unread-field retention
    // -----------------------------------------------------------------------

    pub fn new_retention_handle(&self) -> RetentionHandle {
        self.retention.new_handle()
    }

    /// Store or refresh the unread fields behind `handle`, using the
    /// configured lifespans. Returns `true` for a new entry.
    pub fn record_unread_fields(&self, handle: RetentionHandle, fields: UnreadFields) -> bool {
        let config = self.config.load();
        let created = self.retention.record(
            handle,
            fields,
            config.unread_fields_lifespan,
            config.unread_fields_refresh_lifespan,
        );
        if created {
            self.stats.record_unread_fields();
        }
        created
    }

    pub fn unread_fields(&self, handle: RetentionHandle) -> Option<Arc<UnreadFields>> {
        self.retention.get(handle)
    }

    pub fn remove_unread_fields(&self, handle: RetentionHandle) -> bool {
        self.retention.remove(handle)
    }

    pub fn unread_fields_count(&self) -> usize {
        self.retention.len()
    }

    /// Forget every schema, enum and retained field.
    pub fn clear(&self) {
        *self.maps.write() = TypeMaps::default();
        self.retention.clear();
        log::debug!("[pdx::registry] cleared");
    }
}
