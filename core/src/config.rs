//! Configuration types for QSTATE

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::traits::StateResult;

/// Top-level configuration for a query client's snapshot handling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Options applied when a deferred serializer is initialized
    pub serializer: SerializerConfig,

    /// Options applied when a view is materialized
    pub view: ViewConfig,
}

impl QueryConfig {
    /// Parse a JSON configuration document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> StateResult<Self> {
        serde_json::from_str(json).map_err(StateError::from)
    }

    pub fn to_json_string(&self) -> StateResult<String> {
        serde_json::to_string_pretty(self).map_err(StateError::from)
    }
}

/// Integer layout used by the binary serializer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntEncoding {
    /// Integers take their full width, little endian
    #[default]
    Fixed,
    /// Variable-length integers
    Varint,
}

/// Serializer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Integer layout
    pub int_encoding: IntEncoding,

    /// Upper bound on the bytes one value may claim while decoding
    pub size_limit: Option<u64>,
}

/// What to do with bytes left over after a single decoded value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingBytes {
    #[default]
    Ignore,
    Reject,
}

/// View materialization configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Trailing-byte policy for single-value snapshots
    pub trailing_bytes: TrailingBytes,
}
