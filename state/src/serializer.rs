//! Bincode-backed type serializers

use bincode::Options;
use qstate_core::{
    DeserializationError, IntEncoding, SerializerConfig, StateError, StateResult, TypeSerializer,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::marker::PhantomData;
use std::sync::Arc;

/// Serializer for any serde type, laid out by bincode
pub struct BincodeSerializer<T> {
    config: SerializerConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeSerializer<T> {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self {
            config,
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }
}

impl<T> Default for BincodeSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeSerializer<T> {
    fn clone(&self) -> Self {
        Self::with_config(self.config.clone())
    }
}

impl<T> std::fmt::Debug for BincodeSerializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BincodeSerializer")
            .field("type", &std::any::type_name::<T>())
            .field("config", &self.config)
            .finish()
    }
}

impl<T> TypeSerializer<T> for BincodeSerializer<T>
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T, out: &mut Vec<u8>) -> StateResult<()> {
        match self.config.int_encoding {
            IntEncoding::Fixed => bincode::DefaultOptions::new()
                .with_fixint_encoding()
                .serialize_into(out, value),
            IntEncoding::Varint => bincode::DefaultOptions::new()
                .with_varint_encoding()
                .serialize_into(out, value),
        }
        .map_err(StateError::from)
    }

    fn deserialize(&self, input: &mut &[u8]) -> Result<T, DeserializationError> {
        // A length prefix is checked against the limit before anything is
        // allocated, so the limit never exceeds what the buffer holds.
        let available = input.len() as u64;
        let (limit, bounded_by_input) = match self.config.size_limit {
            Some(limit) if limit < available => (limit, false),
            _ => (available, true),
        };

        let result = match self.config.int_encoding {
            IntEncoding::Fixed => bincode::DefaultOptions::new()
                .with_fixint_encoding()
                .with_limit(limit)
                .deserialize_from(&mut *input),
            IntEncoding::Varint => bincode::DefaultOptions::new()
                .with_varint_encoding()
                .with_limit(limit)
                .deserialize_from(&mut *input),
        };

        result.map_err(|err| classify(*err, bounded_by_input))
    }
}

/// Split bincode failures into truncation and corruption
fn classify(err: bincode::ErrorKind, bounded_by_input: bool) -> DeserializationError {
    match err {
        bincode::ErrorKind::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
            DeserializationError::Truncated(io.to_string())
        }
        bincode::ErrorKind::SizeLimit if bounded_by_input => {
            DeserializationError::Truncated("value extends past the end of the snapshot".into())
        }
        bincode::ErrorKind::SizeLimit => {
            DeserializationError::Corrupt("value exceeds the configured size limit".into())
        }
        other => DeserializationError::Corrupt(other.to_string()),
    }
}

/// Build a shared bincode serializer for `T` from `config`
pub fn bincode_serializer<T>(config: &SerializerConfig) -> Arc<dyn TypeSerializer<T>>
where
    T: Serialize + DeserializeOwned + 'static,
{
    Arc::new(BincodeSerializer::<T>::with_config(config.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: Serialize + DeserializeOwned>(s: &BincodeSerializer<T>, value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        s.serialize(value, &mut out).unwrap();
        out
    }

    #[test]
    fn test_deserialize_advances_input() {
        let s = BincodeSerializer::<u32>::new();
        let mut bytes = encode(&s, &7);
        bytes.extend(encode(&s, &9));

        let mut input = bytes.as_slice();
        assert_eq!(s.deserialize(&mut input).unwrap(), 7);
        assert_eq!(input.len(), 4);
        assert_eq!(s.deserialize(&mut input).unwrap(), 9);
        assert!(input.is_empty());
    }

    #[test]
    fn test_fixed_layout() {
        let s = BincodeSerializer::<String>::new();
        let bytes = encode(&s, &"42".to_string());
        assert_eq!(bytes, vec![2, 0, 0, 0, 0, 0, 0, 0, b'4', b'2']);
    }

    #[test]
    fn test_varint_layout() {
        let s = BincodeSerializer::<String>::with_config(SerializerConfig {
            int_encoding: IntEncoding::Varint,
            size_limit: None,
        });
        let bytes = encode(&s, &"42".to_string());
        assert_eq!(bytes, vec![2, b'4', b'2']);
    }

    #[test]
    fn test_short_integer_is_truncated() {
        let s = BincodeSerializer::<u64>::new();
        let mut input: &[u8] = &[1, 2, 3];
        assert!(matches!(
            s.deserialize(&mut input),
            Err(DeserializationError::Truncated(_))
        ));
    }

    #[test]
    fn test_oversized_length_prefix_is_truncated() {
        let s = BincodeSerializer::<String>::new();
        let mut bytes = (u64::MAX / 2).to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let mut input = bytes.as_slice();
        assert!(matches!(
            s.deserialize(&mut input),
            Err(DeserializationError::Truncated(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let s = BincodeSerializer::<String>::new();
        let mut bytes = encode(&s, &"ab".to_string());
        let len = bytes.len();
        bytes[len - 2] = 0xff;
        bytes[len - 1] = 0xfe;
        let mut input = bytes.as_slice();
        assert!(matches!(
            s.deserialize(&mut input),
            Err(DeserializationError::Corrupt(_))
        ));
    }

    #[test]
    fn test_configured_limit_is_corrupt() {
        let s = BincodeSerializer::<Vec<u8>>::with_config(SerializerConfig {
            int_encoding: IntEncoding::Fixed,
            size_limit: Some(10),
        });
        let unlimited = BincodeSerializer::<Vec<u8>>::new();
        let bytes = encode(&unlimited, &vec![0u8; 32]);
        let mut input = bytes.as_slice();
        assert!(matches!(
            s.deserialize(&mut input),
            Err(DeserializationError::Corrupt(_))
        ));
    }
}
