// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identity of one enum member shared across processes.

use std::fmt;

use crate::error::{PdxError, Result};
use crate::ser::{wire, Cursor, CursorMut};

/// Enum member identity: (enum class, member name, ordinal).
///
/// The authority assigns each distinct identity a stable code; two
/// identities are equal only when all three parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumInfo {
    class_name: String,
    name: String,
    ordinal: i32,
}

impl EnumInfo {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>, ordinal: i32) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            ordinal,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    /// Binary form used at the authority boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut w = CursorMut::new(&mut buf);
        wire::write_string(&mut w, &self.class_name);
        wire::write_string(&mut w, &self.name);
        w.write_i32_be(self.ordinal);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(bytes);
        let class_name = wire::read_string(&mut r)?;
        let name = wire::read_string(&mut r)?;
        let ordinal = r.read_i32_be()?;
        if !r.is_eof() {
            return Err(PdxError::InvalidData(format!(
                "{} trailing bytes after enum info",
                r.remaining()
            )));
        }
        Ok(Self::new(class_name, name, ordinal))
    }
}

impl fmt::Display for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.class_name, self.name, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_uses_all_parts() {
        let red = EnumInfo::new("Color", "RED", 0);
        let mut set = HashSet::new();
        set.insert(red.clone());
        assert!(set.contains(&EnumInfo::new("Color", "RED", 0)));
        assert!(!set.contains(&EnumInfo::new("Color", "RED", 1)));
        assert!(!set.contains(&EnumInfo::new("Shade", "RED", 0)));
        assert_eq!(red.to_string(), "Color.RED(0)");
    }

    #[test]
    fn test_binary_form() {
        let info = EnumInfo::new("Color", "GREEN", 1);
        assert_eq!(EnumInfo::from_bytes(&info.to_bytes()).expect("decode"), info);
        let mut bytes = info.to_bytes();
        bytes.push(0);
        assert!(EnumInfo::from_bytes(&bytes).is_err());
    }
}
