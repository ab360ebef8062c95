//! View factory
//!
//! Turns a descriptor plus one raw snapshot into the matching immutable view.
//! Construction is all-or-nothing: a view exists only if the serializer was
//! initialized and the whole snapshot decoded.

use qstate_core::{QueryConfig, SerializerConfig, StateError, StateResult, ViewConfig};
use tracing::debug;

use crate::descriptor::{uses_trailing_policy, StateDescriptor};
use crate::read_only::ReadOnlyState;

/// Builds immutable views under one `ViewConfig`
#[derive(Debug, Clone, Default)]
pub struct ViewFactory {
    config: ViewConfig,
}

impl ViewFactory {
    pub fn new(config: ViewConfig) -> Self {
        Self { config }
    }

    pub fn from_query_config(config: &QueryConfig) -> Self {
        Self::new(config.view.clone())
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Decode `snapshot` into the view for `descriptor`'s state kind
    pub fn create_view<D>(
        &self,
        descriptor: &D,
        snapshot: impl AsRef<[u8]>,
    ) -> StateResult<D::View>
    where
        D: StateDescriptor,
    {
        if !descriptor.is_serializer_initialized() {
            return Err(StateError::UninitializedSerializer {
                state: descriptor.name().to_string(),
            });
        }

        let snapshot = snapshot.as_ref();
        let view = descriptor.materialize(snapshot, &self.config)?;

        debug!(
            state = descriptor.name(),
            kind = %D::KIND,
            bytes = snapshot.len(),
            trailing = ?uses_trailing_policy(D::KIND).then_some(self.config.trailing_bytes),
            "materialized read-only view"
        );

        Ok(view)
    }

    /// Like `create_view`, wrapped for callers that need the read/write state traits
    pub fn create_state<D>(
        &self,
        descriptor: &D,
        snapshot: impl AsRef<[u8]>,
    ) -> StateResult<ReadOnlyState<D::View>>
    where
        D: StateDescriptor,
    {
        self.create_view(descriptor, snapshot).map(ReadOnlyState::new)
    }

    /// Initialize any deferred serializer from `serializer_config`, then build the view
    pub fn prepare_and_create<D>(
        &self,
        descriptor: &mut D,
        serializer_config: &SerializerConfig,
        snapshot: impl AsRef<[u8]>,
    ) -> StateResult<D::View>
    where
        D: StateDescriptor,
    {
        descriptor.initialize_serializer_unless_set(serializer_config);
        self.create_view(descriptor, snapshot)
    }
}

/// Build a view with the default configuration
pub fn create_view<D>(descriptor: &D, snapshot: impl AsRef<[u8]>) -> StateResult<D::View>
where
    D: StateDescriptor,
{
    ViewFactory::default().create_view(descriptor, snapshot)
}

/// Build a read/write-facade view with the default configuration
pub fn create_state<D>(
    descriptor: &D,
    snapshot: impl AsRef<[u8]>,
) -> StateResult<ReadOnlyState<D::View>>
where
    D: StateDescriptor,
{
    ViewFactory::default().create_state(descriptor, snapshot)
}
