//! Immutable map state

use qstate_core::{QueryableState, ReadableMapState, StateKind, StateResult};
use std::collections::HashMap;
use std::hash::Hash;

use crate::descriptor::MapStateDescriptor;
use crate::factory::ViewFactory;

/// Read-only copy of a queried map state
///
/// Entries written with a null value are kept: they count as contained and
/// show up in `keys()`, but `get` returns `None` for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableMapState<K, V>
where
    K: Eq + Hash,
{
    entries: HashMap<K, Option<V>>,
}

impl<K, V> ImmutableMapState<K, V>
where
    K: Eq + Hash,
{
    pub(crate) fn new(entries: HashMap<K, Option<V>>) -> Self {
        Self { entries }
    }

    /// Materialize a view from a map snapshot using the default configuration
    pub fn create(descriptor: &MapStateDescriptor<K, V>, snapshot: &[u8]) -> StateResult<Self> {
        ViewFactory::default().create_view(descriptor, snapshot)
    }
}

impl<K, V> QueryableState for ImmutableMapState<K, V>
where
    K: Eq + Hash,
{
    fn kind(&self) -> StateKind {
        StateKind::Map
    }
}

impl<K, V> ReadableMapState<K, V> for ImmutableMapState<K, V>
where
    K: Eq + Hash,
{
    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &K> + '_> {
        Box::new(self.entries.keys())
    }

    fn values(&self) -> Box<dyn Iterator<Item = Option<&V>> + '_> {
        Box::new(self.entries.values().map(Option::as_ref))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, Option<&V>)> + '_> {
        Box::new(self.entries.iter().map(|(k, v)| (k, v.as_ref())))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
