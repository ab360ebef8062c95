//! Core traits defining QSTATE interfaces
//!
//! State access is split in two layers. The `Readable*` traits carry the read
//! accessors of each state kind; the unprefixed traits extend them with the
//! mutators a live, worker-side state offers. Snapshot views implement only the
//! read layer.

use crate::error::{DeserializationError, StateError};
use crate::types::StateKind;

/// Result type for QSTATE operations
pub type StateResult<T> = Result<T, StateError>;

/// Turns values of one type into bytes and back
pub trait TypeSerializer<T>: Send + Sync {
    /// Append the encoding of `value` to `out`
    fn serialize(&self, value: &T, out: &mut Vec<u8>) -> StateResult<()>;

    /// Decode one value from the front of `input`, advancing it past the
    /// bytes consumed
    fn deserialize(&self, input: &mut &[u8]) -> Result<T, DeserializationError>;
}

/// Aggregation logic: inputs are folded into an accumulator, which yields a result
pub trait AggregateFunction<IN, ACC, OUT>: Send + Sync {
    /// Fresh, empty accumulator
    fn create_accumulator(&self) -> ACC;

    /// Fold one input into the accumulator
    fn add(&self, value: IN, accumulator: &mut ACC);

    /// Result visible to readers
    fn get_result(&self, accumulator: &ACC) -> OUT;

    /// Combine two accumulators into one
    fn merge(&self, a: ACC, b: ACC) -> ACC;
}

/// Combines two values of the same type into one
pub trait ReduceFunction<V>: Send + Sync {
    fn reduce(&self, a: V, b: V) -> V;
}

impl<V, F> ReduceFunction<V> for F
where
    F: Fn(V, V) -> V + Send + Sync,
{
    fn reduce(&self, a: V, b: V) -> V {
        self(a, b)
    }
}

/// Anything that exposes keyed state of some kind
pub trait QueryableState {
    fn kind(&self) -> StateKind;
}

// ============ Read layer ============

/// Read access to a single value
pub trait ReadableValueState<V>: QueryableState {
    fn get(&self) -> &V;
}

/// Read access to an ordered list
pub trait ReadableListState<T>: QueryableState {
    /// All elements in order
    fn get(&self) -> &[T];

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.get().iter()
    }
}

/// Read access to a key/value mapping
///
/// An entry may be present with a null value: `contains` reports it while
/// `get` returns `None`.
pub trait ReadableMapState<K, V>: QueryableState {
    fn get(&self, key: &K) -> Option<&V>;

    fn contains(&self, key: &K) -> bool;

    fn keys(&self) -> Box<dyn Iterator<Item = &K> + '_>;

    fn values(&self) -> Box<dyn Iterator<Item = Option<&V>> + '_>;

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&V>)> + '_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read access to a reduced value
pub trait ReadableReducingState<V>: QueryableState {
    fn get(&self) -> &V;
}

/// Read access to an aggregation result
pub trait ReadableAggregatingState<OUT>: QueryableState {
    /// Result derived from the current accumulator
    fn get(&self) -> OUT;
}

// ============ Write layer ============

pub trait ValueState<V>: ReadableValueState<V> {
    fn update(&mut self, value: V) -> StateResult<()>;

    fn clear(&mut self) -> StateResult<()>;
}

pub trait ListState<T>: ReadableListState<T> {
    fn add(&mut self, value: T) -> StateResult<()>;

    fn add_all(&mut self, values: Vec<T>) -> StateResult<()>;

    /// Replace the whole list
    fn update(&mut self, values: Vec<T>) -> StateResult<()>;

    fn clear(&mut self) -> StateResult<()>;
}

pub trait MapState<K, V>: ReadableMapState<K, V> {
    fn put(&mut self, key: K, value: V) -> StateResult<()>;

    fn put_all(&mut self, entries: Vec<(K, V)>) -> StateResult<()>;

    fn remove(&mut self, key: &K) -> StateResult<()>;

    fn clear(&mut self) -> StateResult<()>;
}

pub trait ReducingState<V>: ReadableReducingState<V> {
    fn add(&mut self, value: V) -> StateResult<()>;

    fn clear(&mut self) -> StateResult<()>;
}

pub trait AggregatingState<IN, OUT>: ReadableAggregatingState<OUT> {
    fn add(&mut self, value: IN) -> StateResult<()>;

    fn clear(&mut self) -> StateResult<()>;
}
