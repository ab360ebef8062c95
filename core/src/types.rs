//! Core types for QSTATE
//!
//! Defines the state kinds a snapshot can describe and the raw snapshot buffer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a keyed state abstraction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Value,
    List,
    Map,
    Reducing,
    Aggregating,
}

impl StateKind {
    pub const ALL: [StateKind; 5] = [
        StateKind::Value,
        StateKind::List,
        StateKind::Map,
        StateKind::Reducing,
        StateKind::Aggregating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::Value => "value",
            StateKind::List => "list",
            StateKind::Map => "map",
            StateKind::Reducing => "reducing",
            StateKind::Aggregating => "aggregating",
        }
    }

    /// Names of the mutators the live form of this kind offers
    pub fn mutators(&self) -> &'static [&'static str] {
        match self {
            StateKind::Value => &["update", "clear"],
            StateKind::List => &["add", "add_all", "update", "clear"],
            StateKind::Map => &["put", "put_all", "remove", "clear"],
            StateKind::Reducing | StateKind::Aggregating => &["add", "clear"],
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized copy of one piece of keyed state, as received from a query
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RawSnapshot(Vec<u8>);

impl RawSnapshot {
    /// Bytes shown by `Debug` before the preview is cut
    const PREVIEW_LEN: usize = 16;

    pub fn new(bytes: Vec<u8>) -> Self {
        RawSnapshot(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for RawSnapshot {
    fn from(bytes: Vec<u8>) -> Self {
        RawSnapshot(bytes)
    }
}

impl AsRef<[u8]> for RawSnapshot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RawSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() > Self::PREVIEW_LEN {
            write!(
                f,
                "RawSnapshot({} bytes, 0x{}...)",
                self.0.len(),
                hex::encode(&self.0[..Self::PREVIEW_LEN])
            )
        } else {
            write!(f, "RawSnapshot({} bytes, 0x{})", self.0.len(), self.to_hex())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_kind_serde_names() {
        for kind in StateKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
            let back: StateKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_snapshot_debug_preview() {
        let short = RawSnapshot::new(vec![0xab, 0xcd]);
        assert_eq!(format!("{:?}", short), "RawSnapshot(2 bytes, 0xabcd)");

        let long = RawSnapshot::new(vec![0x11; 20]);
        assert_eq!(
            format!("{:?}", long),
            format!("RawSnapshot(20 bytes, 0x{}...)", "11".repeat(16))
        );
    }
}
