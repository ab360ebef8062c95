//! Read/write facade over immutable views
//!
//! Callers written against the full state traits (`ValueState`, `MapState`, ...)
//! can be handed a `ReadOnlyState`. Reads go to the wrapped view; every mutator
//! fails with `StateError::UnsupportedMutation` without touching it.

use qstate_core::{
    AggregatingState, ListState, MapState, QueryableState, ReadableAggregatingState,
    ReadableListState, ReadableMapState, ReadableReducingState, ReadableValueState,
    ReducingState, StateError, StateKind, StateResult, ValueState,
};
use std::hash::Hash;

use crate::aggregating::ImmutableAggregatingState;
use crate::list::ImmutableListState;
use crate::map::ImmutableMapState;
use crate::reducing::ImmutableReducingState;
use crate::value::ImmutableValueState;

/// A view exposed through the read/write state traits
#[derive(Debug, Clone)]
pub struct ReadOnlyState<S> {
    view: S,
}

impl<S> ReadOnlyState<S> {
    pub fn new(view: S) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &S {
        &self.view
    }

    pub fn into_view(self) -> S {
        self.view
    }
}

impl<S: QueryableState> ReadOnlyState<S> {
    fn reject(&self, operation: &'static str) -> StateResult<()> {
        let kind = self.view.kind();
        debug_assert!(kind.mutators().contains(&operation));
        Err(StateError::UnsupportedMutation { kind, operation })
    }
}

impl<S: QueryableState> QueryableState for ReadOnlyState<S> {
    fn kind(&self) -> StateKind {
        self.view.kind()
    }
}

// ============ Value ============

impl<V> ReadableValueState<V> for ReadOnlyState<ImmutableValueState<V>> {
    fn get(&self) -> &V {
        self.view.get()
    }
}

impl<V> ValueState<V> for ReadOnlyState<ImmutableValueState<V>> {
    fn update(&mut self, _value: V) -> StateResult<()> {
        self.reject("update")
    }

    fn clear(&mut self) -> StateResult<()> {
        self.reject("clear")
    }
}

// ============ List ============

impl<T> ReadableListState<T> for ReadOnlyState<ImmutableListState<T>> {
    fn get(&self) -> &[T] {
        self.view.get()
    }
}

impl<T> ListState<T> for ReadOnlyState<ImmutableListState<T>> {
    fn add(&mut self, _value: T) -> StateResult<()> {
        self.reject("add")
    }

    fn add_all(&mut self, _values: Vec<T>) -> StateResult<()> {
        self.reject("add_all")
    }

    fn update(&mut self, _values: Vec<T>) -> StateResult<()> {
        self.reject("update")
    }

    fn clear(&mut self) -> StateResult<()> {
        self.reject("clear")
    }
}

// ============ Map ============

impl<K, V> ReadableMapState<K, V> for ReadOnlyState<ImmutableMapState<K, V>>
where
    K: Eq + Hash,
{
    fn get(&self, key: &K) -> Option<&V> {
        self.view.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.view.contains(key)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &K> + '_> {
        self.view.keys()
    }

    fn values(&self) -> Box<dyn Iterator<Item = Option<&V>> + '_> {
        self.view.values()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&V>)> + '_> {
        self.view.entries()
    }

    fn len(&self) -> usize {
        self.view.len()
    }
}

impl<K, V> MapState<K, V> for ReadOnlyState<ImmutableMapState<K, V>>
where
    K: Eq + Hash,
{
    fn put(&mut self, _key: K, _value: V) -> StateResult<()> {
        self.reject("put")
    }

    fn put_all(&mut self, _entries: Vec<(K, V)>) -> StateResult<()> {
        self.reject("put_all")
    }

    fn remove(&mut self, _key: &K) -> StateResult<()> {
        self.reject("remove")
    }

    fn clear(&mut self) -> StateResult<()> {
        self.reject("clear")
    }
}

// ============ Reducing ============

impl<V> ReadableReducingState<V> for ReadOnlyState<ImmutableReducingState<V>> {
    fn get(&self) -> &V {
        self.view.get()
    }
}

impl<V> ReducingState<V> for ReadOnlyState<ImmutableReducingState<V>> {
    fn add(&mut self, _value: V) -> StateResult<()> {
        self.reject("add")
    }

    fn clear(&mut self) -> StateResult<()> {
        self.reject("clear")
    }
}

// ============ Aggregating ============

impl<IN, ACC, OUT> ReadableAggregatingState<OUT>
    for ReadOnlyState<ImmutableAggregatingState<IN, ACC, OUT>>
{
    fn get(&self) -> OUT {
        self.view.get()
    }
}

impl<IN, ACC, OUT> AggregatingState<IN, OUT>
    for ReadOnlyState<ImmutableAggregatingState<IN, ACC, OUT>>
{
    fn add(&mut self, _value: IN) -> StateResult<()> {
        self.reject("add")
    }

    fn clear(&mut self) -> StateResult<()> {
        self.reject("clear")
    }
}
