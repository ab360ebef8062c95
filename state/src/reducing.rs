//! Immutable reducing state

use qstate_core::{QueryableState, ReadableReducingState, StateKind, StateResult};

use crate::descriptor::ReducingStateDescriptor;
use crate::factory::ViewFactory;

/// Read-only copy of a queried reducing state
///
/// Holds the reduced value as stored by the owning worker; the reduce
/// function is never applied on the query side.
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableReducingState<V> {
    value: V,
}

impl<V> ImmutableReducingState<V> {
    pub(crate) fn new(value: V) -> Self {
        Self { value }
    }

    /// Materialize a view from a reducing-state snapshot using the default configuration
    pub fn create(descriptor: &ReducingStateDescriptor<V>, snapshot: &[u8]) -> StateResult<Self> {
        ViewFactory::default().create_view(descriptor, snapshot)
    }
}

impl<V> QueryableState for ImmutableReducingState<V> {
    fn kind(&self) -> StateKind {
        StateKind::Reducing
    }
}

impl<V> ReadableReducingState<V> for ImmutableReducingState<V> {
    fn get(&self) -> &V {
        &self.value
    }
}
