// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PDX configuration - wire constants and runtime settings.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire constants (header size, offset thresholds,
//!   object tags). Never hardcode these elsewhere.
//! - **Level 2 (Dynamic)**: [`RuntimeConfig`] holding a [`PdxConfig`] that can
//!   be swapped while encoders and decoders are running.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use pdx::config::{PdxConfig, RuntimeConfig};
//!
//! let runtime = RuntimeConfig::new(PdxConfig::default());
//! runtime.store(
//!     PdxConfig::default().with_unread_fields_lifespan(Duration::from_secs(60)),
//! );
//! assert_eq!(runtime.load().unread_fields_lifespan, Duration::from_secs(60));
//! ```

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;

// =======================================================================
// Record layout
// =======================================================================

/// Record header: 4-byte length followed by 4-byte type id.
pub const PDX_HEADER_SIZE: usize = 8;

/// Largest record length addressed with 1-byte offsets.
pub const MAX_ONE_BYTE_OFFSET_LEN: usize = 0xFF;

/// Largest record length addressed with 2-byte offsets.
pub const MAX_TWO_BYTE_OFFSET_LEN: usize = 0xFFFF;

// =======================================================================
// Object field tags
// =======================================================================

/// Null object reference.
pub const DS_NULL: u8 = 41;

/// Nested PDX record follows.
pub const DS_PDX: u8 = 93;

/// PDX enum code follows.
pub const DS_PDX_ENUM: u8 = 94;

// =======================================================================
// Retention defaults
// =======================================================================

/// Lifespan of a freshly created unread-field entry.
pub const DEFAULT_UNREAD_FIELDS_LIFESPAN: Duration = Duration::from_secs(20);

/// Lifespan granted when an existing unread-field entry is refreshed.
pub const DEFAULT_UNREAD_FIELDS_REFRESH_LIFESPAN: Duration = Duration::from_secs(5);

// =======================================================================
// Runtime Configuration
// =======================================================================

/// Codec behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PdxConfig {
    /// Drop fields unknown to the local class instead of retaining them.
    pub ignore_unread_fields: bool,
    /// Decode into generic records even when a class factory is registered.
    pub read_serialized: bool,
    /// How long unread fields are kept after the first decode.
    pub unread_fields_lifespan: Duration,
    /// How long unread fields are kept after a later decode refreshes them.
    pub unread_fields_refresh_lifespan: Duration,
}

impl Default for PdxConfig {
    fn default() -> Self {
        Self {
            ignore_unread_fields: false,
            read_serialized: false,
            unread_fields_lifespan: DEFAULT_UNREAD_FIELDS_LIFESPAN,
            unread_fields_refresh_lifespan: DEFAULT_UNREAD_FIELDS_REFRESH_LIFESPAN,
        }
    }
}

impl PdxConfig {
    #[must_use]
    pub fn with_ignore_unread_fields(mut self, ignore: bool) -> Self {
        self.ignore_unread_fields = ignore;
        self
    }

    #[must_use]
    pub fn with_read_serialized(mut self, read_serialized: bool) -> Self {
        self.read_serialized = read_serialized;
        self
    }

    #[must_use]
    pub fn with_unread_fields_lifespan(mut self, lifespan: Duration) -> Self {
        self.unread_fields_lifespan = lifespan;
        self
    }

    #[must_use]
    pub fn with_unread_fields_refresh_lifespan(mut self, lifespan: Duration) -> Self {
        self.unread_fields_refresh_lifespan = lifespan;
        self
    }
}

/// Shared runtime configuration (thread-safe, lock-free).
///
/// Reads are an atomic load; `store` swaps the whole [`PdxConfig`] so readers
/// never observe a half-updated set of switches.
#[derive(Clone)]
pub struct RuntimeConfig {
    current: Arc<ArcSwap<PdxConfig>>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new(config: PdxConfig) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    #[inline]
    #[must_use]
    pub fn load(&self) -> Arc<PdxConfig> {
        self.current.load_full()
    }

    #[inline]
    pub fn store(&self, config: PdxConfig) {
        self.current.store(Arc::new(config));
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(PdxConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PdxConfig::default();
        assert!(!config.ignore_unread_fields);
        assert!(!config.read_serialized);
        assert_eq!(config.unread_fields_lifespan, Duration::from_secs(20));
        assert_eq!(config.unread_fields_refresh_lifespan, Duration::from_secs(5));
    }

    #[test]
    fn test_runtime_config_swap_is_visible_to_clones() {
        let runtime = RuntimeConfig::default();
        let shared = runtime.clone();
        runtime.store(PdxConfig::default().with_read_serialized(true));
        assert!(shared.load().read_serialized);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_partial_json() {
        let config: PdxConfig =
            serde_json::from_str(r#"{"ignore_unread_fields": true}"#).expect("valid json");
        assert!(config.ignore_unread_fields);
        assert_eq!(config.unread_fields_lifespan, DEFAULT_UNREAD_FIELDS_LIFESPAN);
    }
}
