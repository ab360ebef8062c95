//! Immutable aggregating state

use qstate_core::{
    AggregateFunction, QueryableState, ReadableAggregatingState, StateKind, StateResult,
};
use std::fmt;
use std::sync::Arc;

use crate::descriptor::AggregatingStateDescriptor;
use crate::factory::ViewFactory;

/// Read-only copy of a queried aggregating state
///
/// Keeps the deserialized accumulator and the descriptor's aggregate
/// function. `get` runs `get_result` over the accumulator on every call;
/// nothing is cached.
pub struct ImmutableAggregatingState<IN, ACC, OUT> {
    accumulator: ACC,
    function: Arc<dyn AggregateFunction<IN, ACC, OUT>>,
}

impl<IN, ACC, OUT> ImmutableAggregatingState<IN, ACC, OUT> {
    pub(crate) fn new(
        accumulator: ACC,
        function: Arc<dyn AggregateFunction<IN, ACC, OUT>>,
    ) -> Self {
        Self {
            accumulator,
            function,
        }
    }

    /// Materialize a view from an accumulator snapshot using the default configuration
    pub fn create(
        descriptor: &AggregatingStateDescriptor<IN, ACC, OUT>,
        snapshot: &[u8],
    ) -> StateResult<Self> {
        ViewFactory::default().create_view(descriptor, snapshot)
    }

    /// The accumulator as it was serialized
    pub fn accumulator(&self) -> &ACC {
        &self.accumulator
    }
}

impl<IN, ACC, OUT> QueryableState for ImmutableAggregatingState<IN, ACC, OUT> {
    fn kind(&self) -> StateKind {
        StateKind::Aggregating
    }
}

impl<IN, ACC, OUT> ReadableAggregatingState<OUT> for ImmutableAggregatingState<IN, ACC, OUT> {
    fn get(&self) -> OUT {
        self.function.get_result(&self.accumulator)
    }
}

impl<IN, ACC: Clone, OUT> Clone for ImmutableAggregatingState<IN, ACC, OUT> {
    fn clone(&self) -> Self {
        Self {
            accumulator: self.accumulator.clone(),
            function: Arc::clone(&self.function),
        }
    }
}

impl<IN, ACC: fmt::Debug, OUT> fmt::Debug for ImmutableAggregatingState<IN, ACC, OUT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutableAggregatingState")
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}
