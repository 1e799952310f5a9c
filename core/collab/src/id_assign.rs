//! Assign globally unique replica and core names.
use std::sync::Arc;

use anyhow::Result;

use replicore_cluster_models::ReplicaType;
use replicore_context::Context;
use replicore_store::StateManager;

/// Assign replica identities: core names (pure, local) and replica names (backed by a
/// monotonic counter persisted in the external state manager).
#[derive(Clone)]
pub struct IdAssigner(Arc<dyn IdAssignerBackend>);

impl IdAssigner {
    /// Build a core name of the form `<collection>_<shard>_replica_<t><sequence>`.
    ///
    /// Pure and local: the format is fixed, so no backend involvement is needed.
    pub fn core_name(
        &self,
        collection: &str,
        shard: &str,
        replica_type: ReplicaType,
        sequence: u32,
    ) -> String {
        format!(
            "{collection}_{shard}_replica_{}{sequence}",
            replica_type.initial()
        )
    }

    /// Allocate the next globally unique id for `collection` and format it as a replica name of
    /// the form `core_node<id>`.
    pub async fn replica_name(
        &self,
        context: &Context,
        state: &StateManager,
        collection: &str,
        seed: &str,
    ) -> Result<String> {
        let id = self.0.next_id(context, state, collection, seed).await?;
        Ok(format!("core_node{id}"))
    }
}

impl<T> From<T> for IdAssigner
where
    T: IdAssignerBackend + 'static,
{
    fn from(value: T) -> Self {
        IdAssigner(Arc::new(value))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl IdAssigner {
    /// Initialise a new in-memory id assigner backend fixture for unit tests.
    pub fn fixture() -> Self {
        IdAssigner::from(IdAssignerFixture::default())
    }
}

/// Operations an id-assignment backend must implement.
#[async_trait::async_trait]
pub trait IdAssignerBackend: Send + Sync {
    /// Allocate and persist the next globally unique id for `collection`.
    ///
    /// `seed` identifies the caller-provided sequence (the production system partitions ids by
    /// a caller-chosen seed so independent callers don't need to coordinate).
    async fn next_id(
        &self,
        context: &Context,
        state: &StateManager,
        collection: &str,
        seed: &str,
    ) -> Result<u64>;
}

/// In-memory implementation of a mock [`IdAssigner`] for unit tests.
///
/// Ignores the state manager entirely and counts up from zero per `(collection, seed)` pair.
#[derive(Clone, Default)]
pub struct IdAssignerFixture {
    inner: Arc<std::sync::Mutex<std::collections::BTreeMap<(String, String), u64>>>,
}

#[async_trait::async_trait]
impl IdAssignerBackend for IdAssignerFixture {
    async fn next_id(
        &self,
        _: &Context,
        _: &StateManager,
        collection: &str,
        seed: &str,
    ) -> Result<u64> {
        let mut counters = self
            .inner
            .lock()
            .expect("IdAssignerFixture::inner lock poisoned");
        let key = (collection.to_string(), seed.to_string());
        let next = counters.entry(key).or_insert(0);
        let id = *next;
        *next += 1;
        Ok(id)
    }
}
