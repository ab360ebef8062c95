//! State descriptors
//!
//! A descriptor names a piece of keyed state and carries what is needed to read
//! its snapshots: the serializer(s) and, for reducing and aggregating state,
//! the combine logic. A serializer is either given up front or deferred until
//! `initialize_serializer_unless_set` supplies a `SerializerConfig`.

use qstate_core::{
    AggregateFunction, QueryableState, ReduceFunction, SerializerConfig, StateError, StateKind,
    StateResult, TypeSerializer, ViewConfig,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

use crate::aggregating::ImmutableAggregatingState;
use crate::codec;
use crate::list::ImmutableListState;
use crate::map::ImmutableMapState;
use crate::reducing::ImmutableReducingState;
use crate::serializer::bincode_serializer;
use crate::value::ImmutableValueState;

/// Builds a serializer once the configuration is known
pub type SerializerFactory<T> = fn(&SerializerConfig) -> Arc<dyn TypeSerializer<T>>;

/// A descriptor's serializer, possibly not built yet
pub enum SerializerSlot<T> {
    Initialized(Arc<dyn TypeSerializer<T>>),
    Deferred(SerializerFactory<T>),
}

impl<T> SerializerSlot<T> {
    pub fn initialized<S>(serializer: S) -> Self
    where
        S: TypeSerializer<T> + 'static,
    {
        SerializerSlot::Initialized(Arc::new(serializer))
    }

    /// Defer to a bincode serializer for `T`
    pub fn of_type() -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        SerializerSlot::Deferred(bincode_serializer::<T>)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, SerializerSlot::Initialized(_))
    }

    /// Build a deferred serializer; returns whether anything changed
    pub fn initialize_unless_set(&mut self, config: &SerializerConfig) -> bool {
        match self {
            SerializerSlot::Initialized(_) => false,
            SerializerSlot::Deferred(factory) => {
                let serializer = (*factory)(config);
                *self = SerializerSlot::Initialized(serializer);
                true
            }
        }
    }

    pub fn get(&self) -> Option<&Arc<dyn TypeSerializer<T>>> {
        match self {
            SerializerSlot::Initialized(serializer) => Some(serializer),
            SerializerSlot::Deferred(_) => None,
        }
    }

    fn require(&self, state: &str) -> StateResult<&Arc<dyn TypeSerializer<T>>> {
        self.get().ok_or_else(|| StateError::UninitializedSerializer {
            state: state.to_string(),
        })
    }
}

impl<T> fmt::Debug for SerializerSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializerSlot::Initialized(_) => {
                write!(f, "Initialized<{}>", std::any::type_name::<T>())
            }
            SerializerSlot::Deferred(_) => write!(f, "Deferred<{}>", std::any::type_name::<T>()),
        }
    }
}

/// Name and query registration shared by every descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorInfo {
    name: String,
    queryable_name: Option<String>,
}

impl DescriptorInfo {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queryable_name: None,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Descriptor of one state kind; the closed set of implementors is the set
/// of state kinds
pub trait StateDescriptor: sealed::Sealed {
    /// Read-only view materialized from this descriptor's snapshots
    type View: QueryableState;

    const KIND: StateKind;

    fn info(&self) -> &DescriptorInfo;

    fn info_mut(&mut self) -> &mut DescriptorInfo;

    fn is_serializer_initialized(&self) -> bool;

    /// Build every deferred serializer from `config`
    fn initialize_serializer_unless_set(&mut self, config: &SerializerConfig);

    /// Decode `snapshot` into this descriptor's view
    ///
    /// Fails with `UninitializedSerializer` before reading any byte when a
    /// serializer is still deferred.
    fn materialize(&self, snapshot: &[u8], config: &ViewConfig) -> StateResult<Self::View>;

    fn name(&self) -> &str {
        &self.info().name
    }

    fn kind(&self) -> StateKind {
        Self::KIND
    }

    /// Register the state for queries under `queryable_name`
    fn set_queryable(&mut self, queryable_name: impl Into<String>)
    where
        Self: Sized,
    {
        self.info_mut().queryable_name = Some(queryable_name.into());
    }

    fn is_queryable(&self) -> bool {
        self.info().queryable_name.is_some()
    }

    fn queryable_state_name(&self) -> Option<&str> {
        self.info().queryable_name.as_deref()
    }
}

fn log_initialized(info: &DescriptorInfo, kind: StateKind) {
    debug!(state = %info.name, %kind, "initialized deferred serializer");
}

// ============ Value ============

/// Descriptor for a single-value state
#[derive(Debug)]
pub struct ValueStateDescriptor<V> {
    info: DescriptorInfo,
    serializer: SerializerSlot<V>,
}

impl<V> ValueStateDescriptor<V> {
    pub fn new<S>(name: impl Into<String>, serializer: S) -> Self
    where
        S: TypeSerializer<V> + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            serializer: SerializerSlot::initialized(serializer),
        }
    }

    /// Serializer deferred until initialization
    pub fn with_type(name: impl Into<String>) -> Self
    where
        V: Serialize + DeserializeOwned + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            serializer: SerializerSlot::of_type(),
        }
    }

    pub fn serializer(&self) -> StateResult<&Arc<dyn TypeSerializer<V>>> {
        self.serializer.require(&self.info.name)
    }
}

impl<V> sealed::Sealed for ValueStateDescriptor<V> {}

impl<V> StateDescriptor for ValueStateDescriptor<V> {
    type View = ImmutableValueState<V>;

    const KIND: StateKind = StateKind::Value;

    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut DescriptorInfo {
        &mut self.info
    }

    fn is_serializer_initialized(&self) -> bool {
        self.serializer.is_initialized()
    }

    fn initialize_serializer_unless_set(&mut self, config: &SerializerConfig) {
        if self.serializer.initialize_unless_set(config) {
            log_initialized(&self.info, Self::KIND);
        }
    }

    fn materialize(&self, snapshot: &[u8], config: &ViewConfig) -> StateResult<Self::View> {
        let serializer = self.serializer()?;
        let value = codec::deserialize_value(&**serializer, snapshot, config.trailing_bytes)?;
        Ok(ImmutableValueState::new(value))
    }
}

// ============ List ============

/// Descriptor for a list state; the serializer handles single elements
#[derive(Debug)]
pub struct ListStateDescriptor<T> {
    info: DescriptorInfo,
    element_serializer: SerializerSlot<T>,
}

impl<T> ListStateDescriptor<T> {
    pub fn new<S>(name: impl Into<String>, element_serializer: S) -> Self
    where
        S: TypeSerializer<T> + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            element_serializer: SerializerSlot::initialized(element_serializer),
        }
    }

    pub fn with_type(name: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            element_serializer: SerializerSlot::of_type(),
        }
    }

    pub fn element_serializer(&self) -> StateResult<&Arc<dyn TypeSerializer<T>>> {
        self.element_serializer.require(&self.info.name)
    }
}

impl<T> sealed::Sealed for ListStateDescriptor<T> {}

impl<T> StateDescriptor for ListStateDescriptor<T> {
    type View = ImmutableListState<T>;

    const KIND: StateKind = StateKind::List;

    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut DescriptorInfo {
        &mut self.info
    }

    fn is_serializer_initialized(&self) -> bool {
        self.element_serializer.is_initialized()
    }

    fn initialize_serializer_unless_set(&mut self, config: &SerializerConfig) {
        if self.element_serializer.initialize_unless_set(config) {
            log_initialized(&self.info, Self::KIND);
        }
    }

    fn materialize(&self, snapshot: &[u8], _config: &ViewConfig) -> StateResult<Self::View> {
        let serializer = self.element_serializer()?;
        let elements = codec::deserialize_list(&**serializer, snapshot)?;
        Ok(ImmutableListState::new(elements))
    }
}

// ============ Map ============

/// Descriptor for a map state
#[derive(Debug)]
pub struct MapStateDescriptor<K, V> {
    info: DescriptorInfo,
    key_serializer: SerializerSlot<K>,
    value_serializer: SerializerSlot<V>,
}

impl<K, V> MapStateDescriptor<K, V> {
    pub fn new<KS, VS>(name: impl Into<String>, key_serializer: KS, value_serializer: VS) -> Self
    where
        KS: TypeSerializer<K> + 'static,
        VS: TypeSerializer<V> + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            key_serializer: SerializerSlot::initialized(key_serializer),
            value_serializer: SerializerSlot::initialized(value_serializer),
        }
    }

    pub fn with_types(name: impl Into<String>) -> Self
    where
        K: Serialize + DeserializeOwned + 'static,
        V: Serialize + DeserializeOwned + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            key_serializer: SerializerSlot::of_type(),
            value_serializer: SerializerSlot::of_type(),
        }
    }

    pub fn key_serializer(&self) -> StateResult<&Arc<dyn TypeSerializer<K>>> {
        self.key_serializer.require(&self.info.name)
    }

    pub fn value_serializer(&self) -> StateResult<&Arc<dyn TypeSerializer<V>>> {
        self.value_serializer.require(&self.info.name)
    }
}

impl<K, V> sealed::Sealed for MapStateDescriptor<K, V> {}

impl<K, V> StateDescriptor for MapStateDescriptor<K, V>
where
    K: Eq + Hash,
{
    type View = ImmutableMapState<K, V>;

    const KIND: StateKind = StateKind::Map;

    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut DescriptorInfo {
        &mut self.info
    }

    fn is_serializer_initialized(&self) -> bool {
        self.key_serializer.is_initialized() && self.value_serializer.is_initialized()
    }

    fn initialize_serializer_unless_set(&mut self, config: &SerializerConfig) {
        let keys = self.key_serializer.initialize_unless_set(config);
        let values = self.value_serializer.initialize_unless_set(config);
        if keys || values {
            log_initialized(&self.info, Self::KIND);
        }
    }

    fn materialize(&self, snapshot: &[u8], _config: &ViewConfig) -> StateResult<Self::View> {
        let key_serializer = self.key_serializer()?;
        let value_serializer = self.value_serializer()?;
        let entries = codec::deserialize_map(&**key_serializer, &**value_serializer, snapshot)?;
        Ok(ImmutableMapState::new(entries))
    }
}

// ============ Reducing ============

/// Descriptor for a reducing state
pub struct ReducingStateDescriptor<V> {
    info: DescriptorInfo,
    serializer: SerializerSlot<V>,
    function: Arc<dyn ReduceFunction<V>>,
}

impl<V> ReducingStateDescriptor<V> {
    pub fn new<F, S>(name: impl Into<String>, function: F, serializer: S) -> Self
    where
        F: ReduceFunction<V> + 'static,
        S: TypeSerializer<V> + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            serializer: SerializerSlot::initialized(serializer),
            function: Arc::new(function),
        }
    }

    pub fn with_type<F>(name: impl Into<String>, function: F) -> Self
    where
        F: ReduceFunction<V> + 'static,
        V: Serialize + DeserializeOwned + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            serializer: SerializerSlot::of_type(),
            function: Arc::new(function),
        }
    }

    pub fn serializer(&self) -> StateResult<&Arc<dyn TypeSerializer<V>>> {
        self.serializer.require(&self.info.name)
    }

    /// The function the owning worker reduces with
    pub fn reduce_function(&self) -> &Arc<dyn ReduceFunction<V>> {
        &self.function
    }
}

impl<V> fmt::Debug for ReducingStateDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducingStateDescriptor")
            .field("info", &self.info)
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}

impl<V> sealed::Sealed for ReducingStateDescriptor<V> {}

impl<V> StateDescriptor for ReducingStateDescriptor<V> {
    type View = ImmutableReducingState<V>;

    const KIND: StateKind = StateKind::Reducing;

    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut DescriptorInfo {
        &mut self.info
    }

    fn is_serializer_initialized(&self) -> bool {
        self.serializer.is_initialized()
    }

    fn initialize_serializer_unless_set(&mut self, config: &SerializerConfig) {
        if self.serializer.initialize_unless_set(config) {
            log_initialized(&self.info, Self::KIND);
        }
    }

    fn materialize(&self, snapshot: &[u8], config: &ViewConfig) -> StateResult<Self::View> {
        let serializer = self.serializer()?;
        let value = codec::deserialize_value(&**serializer, snapshot, config.trailing_bytes)?;
        Ok(ImmutableReducingState::new(value))
    }
}

// ============ Aggregating ============

/// Descriptor for an aggregating state
///
/// The serializer handles the accumulator type, not the input or result type.
pub struct AggregatingStateDescriptor<IN, ACC, OUT> {
    info: DescriptorInfo,
    accumulator_serializer: SerializerSlot<ACC>,
    function: Arc<dyn AggregateFunction<IN, ACC, OUT>>,
}

impl<IN, ACC, OUT> AggregatingStateDescriptor<IN, ACC, OUT> {
    pub fn new<F, S>(name: impl Into<String>, function: F, accumulator_serializer: S) -> Self
    where
        F: AggregateFunction<IN, ACC, OUT> + 'static,
        S: TypeSerializer<ACC> + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            accumulator_serializer: SerializerSlot::initialized(accumulator_serializer),
            function: Arc::new(function),
        }
    }

    /// Accumulator serializer deferred until initialization
    pub fn with_accumulator_type<F>(name: impl Into<String>, function: F) -> Self
    where
        F: AggregateFunction<IN, ACC, OUT> + 'static,
        ACC: Serialize + DeserializeOwned + 'static,
    {
        Self {
            info: DescriptorInfo::new(name),
            accumulator_serializer: SerializerSlot::of_type(),
            function: Arc::new(function),
        }
    }

    pub fn accumulator_serializer(&self) -> StateResult<&Arc<dyn TypeSerializer<ACC>>> {
        self.accumulator_serializer.require(&self.info.name)
    }

    pub fn aggregate_function(&self) -> &Arc<dyn AggregateFunction<IN, ACC, OUT>> {
        &self.function
    }
}

impl<IN, ACC, OUT> fmt::Debug for AggregatingStateDescriptor<IN, ACC, OUT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatingStateDescriptor")
            .field("info", &self.info)
            .field("accumulator_serializer", &self.accumulator_serializer)
            .finish_non_exhaustive()
    }
}

impl<IN, ACC, OUT> sealed::Sealed for AggregatingStateDescriptor<IN, ACC, OUT> {}

impl<IN, ACC, OUT> StateDescriptor for AggregatingStateDescriptor<IN, ACC, OUT> {
    type View = ImmutableAggregatingState<IN, ACC, OUT>;

    const KIND: StateKind = StateKind::Aggregating;

    fn info(&self) -> &DescriptorInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut DescriptorInfo {
        &mut self.info
    }

    fn is_serializer_initialized(&self) -> bool {
        self.accumulator_serializer.is_initialized()
    }

    fn initialize_serializer_unless_set(&mut self, config: &SerializerConfig) {
        if self.accumulator_serializer.initialize_unless_set(config) {
            log_initialized(&self.info, Self::KIND);
        }
    }

    fn materialize(&self, snapshot: &[u8], config: &ViewConfig) -> StateResult<Self::View> {
        let serializer = self.accumulator_serializer()?;
        let accumulator = codec::deserialize_value(&**serializer, snapshot, config.trailing_bytes)?;
        Ok(ImmutableAggregatingState::new(accumulator, Arc::clone(&self.function)))
    }
}

/// Trailing-byte policy is only meaningful for single-value kinds
pub fn uses_trailing_policy(kind: StateKind) -> bool {
    match kind {
        StateKind::Value | StateKind::Reducing | StateKind::Aggregating => true,
        StateKind::List | StateKind::Map => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::BincodeSerializer;
    use qstate_core::IntEncoding;

    #[test]
    fn test_deferred_serializer_lifecycle() {
        let mut descriptor = ValueStateDescriptor::<String>::with_type("greeting");
        assert!(!descriptor.is_serializer_initialized());
        assert!(matches!(
            descriptor.serializer(),
            Err(StateError::UninitializedSerializer { ref state }) if state == "greeting"
        ));

        descriptor.initialize_serializer_unless_set(&SerializerConfig::default());
        assert!(descriptor.is_serializer_initialized());
        assert!(descriptor.serializer().is_ok());
    }

    #[test]
    fn test_initialize_keeps_existing_serializer() {
        let mut slot = SerializerSlot::<u32>::initialized(BincodeSerializer::new());
        assert!(!slot.initialize_unless_set(&SerializerConfig::default()));

        let mut deferred = SerializerSlot::<u32>::of_type();
        assert!(deferred.initialize_unless_set(&SerializerConfig::default()));
        assert!(!deferred.initialize_unless_set(&SerializerConfig::default()));
    }

    #[test]
    fn test_deferred_serializer_uses_config() {
        let mut descriptor = ValueStateDescriptor::<u32>::with_type("small");
        descriptor.initialize_serializer_unless_set(&SerializerConfig {
            int_encoding: IntEncoding::Varint,
            size_limit: None,
        });

        let mut out = Vec::new();
        descriptor.serializer().unwrap().serialize(&5, &mut out).unwrap();
        assert_eq!(out, vec![5]);
    }

    #[test]
    fn test_map_needs_both_serializers() {
        let mut descriptor = MapStateDescriptor::<String, u32>::with_types("index");
        assert!(!descriptor.is_serializer_initialized());
        descriptor.initialize_serializer_unless_set(&SerializerConfig::default());
        assert!(descriptor.is_serializer_initialized());
    }

    #[test]
    fn test_uninitialized_materialize_fails() {
        let descriptor = ListStateDescriptor::<u8>::with_type("bytes");
        let err = descriptor.materialize(&[1, b',', 2], &ViewConfig::default()).unwrap_err();
        assert!(matches!(err, StateError::UninitializedSerializer { .. }));
    }

    #[test]
    fn test_queryable_registration() {
        let mut descriptor =
            ReducingStateDescriptor::with_type("sum", |a: u64, b: u64| a + b);
        assert!(!descriptor.is_queryable());
        assert_eq!(descriptor.queryable_state_name(), None);

        descriptor.set_queryable("sum-query");
        assert!(descriptor.is_queryable());
        assert_eq!(descriptor.queryable_state_name(), Some("sum-query"));
        assert_eq!(descriptor.name(), "sum");
        assert_eq!(descriptor.kind(), StateKind::Reducing);
        assert_eq!(descriptor.reduce_function().reduce(2, 3), 5);
    }

    #[test]
    fn test_trailing_policy_applies_to_single_value_kinds() {
        let single: Vec<StateKind> = StateKind::ALL
            .into_iter()
            .filter(|kind| uses_trailing_policy(*kind))
            .collect();
        assert_eq!(
            single,
            vec![StateKind::Value, StateKind::Reducing, StateKind::Aggregating]
        );
    }

    #[test]
    fn test_debug_hides_functions() {
        let descriptor = ReducingStateDescriptor::new(
            "max",
            |a: u8, b: u8| a.max(b),
            BincodeSerializer::<u8>::new(),
        );
        let debug = format!("{:?}", descriptor);
        assert!(debug.starts_with("ReducingStateDescriptor"));
        assert!(debug.contains("Initialized<u8>"));
    }
}
