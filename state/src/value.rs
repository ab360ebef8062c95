//! Immutable value state

use qstate_core::{QueryableState, ReadableValueState, StateKind, StateResult};

use crate::descriptor::ValueStateDescriptor;
use crate::factory::ViewFactory;

/// Read-only copy of a queried value state
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableValueState<V> {
    value: V,
}

impl<V> ImmutableValueState<V> {
    pub(crate) fn new(value: V) -> Self {
        Self { value }
    }

    /// Materialize a view from a value snapshot using the default configuration
    pub fn create(descriptor: &ValueStateDescriptor<V>, snapshot: &[u8]) -> StateResult<Self> {
        ViewFactory::default().create_view(descriptor, snapshot)
    }
}

impl<V> QueryableState for ImmutableValueState<V> {
    fn kind(&self) -> StateKind {
        StateKind::Value
    }
}

impl<V> ReadableValueState<V> for ImmutableValueState<V> {
    fn get(&self) -> &V {
        &self.value
    }
}
