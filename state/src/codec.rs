//! Snapshot codec
//!
//! Single-value snapshots hold exactly one encoded value. Collection state uses
//! two framings on top of the element serializers:
//!
//! ```text
//! list: elem (0x2C elem)*                 empty buffer = empty list
//! map:  (key null_flag [value])*          null_flag: 0 = value follows, 1 = null
//! ```

use qstate_core::{
    DeserializationError, StateError, StateResult, TrailingBytes, TypeSerializer,
};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::trace;

/// Byte separating list elements
pub const LIST_DELIMITER: u8 = b',';

const MAP_VALUE_PRESENT: u8 = 0;
const MAP_VALUE_NULL: u8 = 1;

/// Decode the single value held by `snapshot`
pub fn deserialize_value<T, S>(
    serializer: &S,
    snapshot: &[u8],
    trailing: TrailingBytes,
) -> StateResult<T>
where
    S: TypeSerializer<T> + ?Sized,
{
    let mut input = snapshot;
    let value = serializer.deserialize(&mut input)?;

    if !input.is_empty() {
        match trailing {
            TrailingBytes::Reject => {
                return Err(DeserializationError::TrailingBytes {
                    remaining: input.len(),
                }
                .into());
            }
            TrailingBytes::Ignore => {
                trace!(remaining = input.len(), "ignoring trailing snapshot bytes");
            }
        }
    }

    Ok(value)
}

/// Decode a delimited list snapshot
pub fn deserialize_list<T, S>(serializer: &S, snapshot: &[u8]) -> StateResult<Vec<T>>
where
    S: TypeSerializer<T> + ?Sized,
{
    let mut input = snapshot;
    let mut elements = Vec::new();

    while !input.is_empty() {
        let before = input.len();
        elements.push(serializer.deserialize(&mut input)?);
        if input.len() == before {
            return Err(DeserializationError::Corrupt(format!(
                "list element {} consumed no bytes",
                elements.len() - 1
            ))
            .into());
        }

        let Some((&next, rest)) = input.split_first() else {
            break;
        };
        if next != LIST_DELIMITER {
            return Err(DeserializationError::Corrupt(format!(
                "expected list delimiter after element {}, found 0x{:02x}",
                elements.len() - 1,
                next
            ))
            .into());
        }
        if rest.is_empty() {
            return Err(DeserializationError::Truncated(
                "list delimiter not followed by an element".into(),
            )
            .into());
        }
        input = rest;
    }

    trace!(elements = elements.len(), "decoded list snapshot");
    Ok(elements)
}

/// Decode a map snapshot; a repeated key keeps its last value
pub fn deserialize_map<K, V, KS, VS>(
    key_serializer: &KS,
    value_serializer: &VS,
    snapshot: &[u8],
) -> StateResult<HashMap<K, Option<V>>>
where
    K: Eq + Hash,
    KS: TypeSerializer<K> + ?Sized,
    VS: TypeSerializer<V> + ?Sized,
{
    let mut input = snapshot;
    let mut entries = HashMap::new();

    while !input.is_empty() {
        let key = key_serializer.deserialize(&mut input)?;

        let Some((&flag, rest)) = input.split_first() else {
            return Err(DeserializationError::Truncated(
                "map entry ends before its null flag".into(),
            )
            .into());
        };
        input = rest;

        let value = match flag {
            MAP_VALUE_PRESENT => Some(value_serializer.deserialize(&mut input)?),
            MAP_VALUE_NULL => None,
            other => {
                return Err(DeserializationError::Corrupt(format!(
                    "invalid map null flag 0x{:02x}",
                    other
                ))
                .into());
            }
        };
        entries.insert(key, value);
    }

    trace!(entries = entries.len(), "decoded map snapshot");
    Ok(entries)
}

/// Encode one value as a single-value snapshot
pub fn serialize_value<T, S>(serializer: &S, value: &T) -> StateResult<Vec<u8>>
where
    S: TypeSerializer<T> + ?Sized,
{
    let mut out = Vec::new();
    serializer.serialize(value, &mut out)?;
    Ok(out)
}

/// Encode elements as a delimited list snapshot
///
/// Every element must encode to at least one byte; an empty encoding cannot be
/// told apart from the framing.
pub fn serialize_list<T, S>(serializer: &S, values: &[T]) -> StateResult<Vec<u8>>
where
    S: TypeSerializer<T> + ?Sized,
{
    let mut out = Vec::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(LIST_DELIMITER);
        }
        let start = out.len();
        serializer.serialize(value, &mut out)?;
        if out.len() == start {
            return Err(StateError::Serialization(format!(
                "list element {} encodes to zero bytes",
                i
            )));
        }
    }
    Ok(out)
}

/// Encode entries as a map snapshot; `None` values are written as null
pub fn serialize_map<'a, K, V, KS, VS, I>(
    key_serializer: &KS,
    value_serializer: &VS,
    entries: I,
) -> StateResult<Vec<u8>>
where
    K: 'a,
    V: 'a,
    KS: TypeSerializer<K> + ?Sized,
    VS: TypeSerializer<V> + ?Sized,
    I: IntoIterator<Item = (&'a K, Option<&'a V>)>,
{
    let mut out = Vec::new();
    for (key, value) in entries {
        key_serializer.serialize(key, &mut out)?;
        match value {
            Some(value) => {
                out.push(MAP_VALUE_PRESENT);
                value_serializer.serialize(value, &mut out)?;
            }
            None => out.push(MAP_VALUE_NULL),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::BincodeSerializer;

    fn strings() -> BincodeSerializer<String> {
        BincodeSerializer::new()
    }

    fn deser_err(err: StateError) -> DeserializationError {
        match err {
            StateError::Deserialization(e) => e,
            other => panic!("expected deserialization error, got {other:?}"),
        }
    }

    #[test]
    fn test_value_ignores_trailing_by_default() {
        let s = strings();
        let mut bytes = serialize_value(&s, &"42".to_string()).unwrap();
        bytes.extend_from_slice(&[9, 9, 9]);

        let value = deserialize_value(&s, &bytes, TrailingBytes::Ignore).unwrap();
        assert_eq!(value, "42");
    }

    #[test]
    fn test_value_rejects_trailing_when_strict() {
        let s = strings();
        let mut bytes = serialize_value(&s, &"42".to_string()).unwrap();
        bytes.extend_from_slice(&[9, 9, 9]);

        let err = deserialize_value(&s, &bytes, TrailingBytes::Reject).unwrap_err();
        assert_eq!(
            deser_err(err),
            DeserializationError::TrailingBytes { remaining: 3 }
        );
    }

    #[test]
    fn test_value_truncated() {
        let s = strings();
        let bytes = serialize_value(&s, &"hello".to_string()).unwrap();

        let err = deserialize_value(&s, &bytes[..bytes.len() - 2], TrailingBytes::Ignore)
            .unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Truncated(_)));
    }

    #[test]
    fn test_empty_value_snapshot_is_truncated() {
        let s = BincodeSerializer::<u64>::new();
        let err = deserialize_value(&s, &[], TrailingBytes::Ignore).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Truncated(_)));
    }

    #[test]
    fn test_list_layout_and_decode() {
        let s = BincodeSerializer::<u16>::new();
        let bytes = serialize_list(&s, &[1, 2, 3]).unwrap();
        assert_eq!(bytes, vec![1, 0, b',', 2, 0, b',', 3, 0]);
        assert_eq!(deserialize_list(&s, &bytes).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_list() {
        let s = strings();
        assert!(serialize_list(&s, &[]).unwrap().is_empty());
        assert!(deserialize_list(&s, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_list_dangling_delimiter_is_truncated() {
        let s = BincodeSerializer::<u16>::new();
        let err = deserialize_list(&s, &[1, 0, b',']).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Truncated(_)));
    }

    #[test]
    fn test_list_bad_delimiter_is_corrupt() {
        let s = BincodeSerializer::<u16>::new();
        let err = deserialize_list(&s, &[1, 0, b';', 2, 0]).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Corrupt(_)));
    }

    #[test]
    fn test_zero_width_elements_cannot_be_listed() {
        let s = BincodeSerializer::<()>::new();
        for elements in [vec![()], vec![(), ()]] {
            let err = serialize_list(&s, &elements).unwrap_err();
            assert!(matches!(err, StateError::Serialization(_)));
        }
        assert!(serialize_list(&s, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_list_element_consuming_nothing_is_corrupt() {
        let s = BincodeSerializer::<()>::new();
        let err = deserialize_list(&s, &[LIST_DELIMITER]).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Corrupt(_)));
        assert!(deserialize_list(&s, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_map_with_null_value() {
        let ks = strings();
        let vs = BincodeSerializer::<u32>::new();
        let a = "a".to_string();
        let b = "b".to_string();
        let bytes = serialize_map(&ks, &vs, vec![(&a, Some(&5)), (&b, None)]).unwrap();

        let map = deserialize_map(&ks, &vs, &bytes).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&Some(5)));
        assert_eq!(map.get("b"), Some(&None));
    }

    #[test]
    fn test_map_repeated_key_keeps_last() {
        let ks = strings();
        let vs = BincodeSerializer::<u32>::new();
        let k = "k".to_string();
        let bytes = serialize_map(&ks, &vs, vec![(&k, Some(&1)), (&k, Some(&2))]).unwrap();

        let map = deserialize_map(&ks, &vs, &bytes).unwrap();
        assert_eq!(map.get("k"), Some(&Some(2)));
    }

    #[test]
    fn test_map_missing_flag_is_truncated() {
        let ks = strings();
        let vs = BincodeSerializer::<u32>::new();
        let bytes = serialize_value(&ks, &"k".to_string()).unwrap();

        let err = deserialize_map(&ks, &vs, &bytes).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Truncated(_)));
    }

    #[test]
    fn test_map_present_flag_without_value_is_truncated() {
        let ks = strings();
        let vs = BincodeSerializer::<u32>::new();
        let mut bytes = serialize_value(&ks, &"k".to_string()).unwrap();
        bytes.push(MAP_VALUE_PRESENT);

        let err = deserialize_map(&ks, &vs, &bytes).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Truncated(_)));
    }

    #[test]
    fn test_map_bad_flag_is_corrupt() {
        let ks = strings();
        let vs = BincodeSerializer::<u32>::new();
        let mut bytes = serialize_value(&ks, &"k".to_string()).unwrap();
        bytes.push(7);

        let err = deserialize_map(&ks, &vs, &bytes).unwrap_err();
        assert!(matches!(deser_err(err), DeserializationError::Corrupt(_)));
    }
}
