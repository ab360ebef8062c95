//! Immutable list state

use qstate_core::{QueryableState, ReadableListState, StateKind, StateResult};

use crate::descriptor::ListStateDescriptor;
use crate::factory::ViewFactory;

/// Read-only copy of a queried list state
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableListState<T> {
    elements: Vec<T>,
}

impl<T> ImmutableListState<T> {
    pub(crate) fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    /// Materialize a view from a list snapshot using the default configuration
    pub fn create(descriptor: &ListStateDescriptor<T>, snapshot: &[u8]) -> StateResult<Self> {
        ViewFactory::default().create_view(descriptor, snapshot)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> QueryableState for ImmutableListState<T> {
    fn kind(&self) -> StateKind {
        StateKind::List
    }
}

impl<T> ReadableListState<T> for ImmutableListState<T> {
    fn get(&self) -> &[T] {
        &self.elements
    }
}

impl<'a, T> IntoIterator for &'a ImmutableListState<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
