//! Per-node telemetry, as observed and mutated by the provider.
//!
//! The production system tracks many per-node values; the simulator only ever touches the
//! `cores` counter (the number of replicas a node hosts), so the interface is kept narrow and
//! strongly typed around that one counter instead of an arbitrary string-keyed value.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use replicore_context::Context;

/// Well-known node value key tracking how many replicas a node currently hosts.
pub const CORES_KEY: &str = "cores";

/// Query and mutate per-node telemetry values.
#[derive(Clone)]
pub struct NodeStateProvider(Arc<dyn NodeStateProviderBackend>);

impl NodeStateProvider {
    /// Fetch every node's `cores` counter.
    pub async fn get_all_node_values(
        &self,
        context: &Context,
    ) -> Result<BTreeMap<String, i64>> {
        self.0.get_all_node_values(context).await
    }

    /// Fetch a node's `cores` counter, if the node is known.
    pub async fn get_node_value(&self, context: &Context, node: &str) -> Result<Option<i64>> {
        self.0.get_node_value(context, node).await
    }

    /// Overwrite a node's `cores` counter.
    pub async fn set_node_value(&self, context: &Context, node: &str, value: i64) -> Result<()> {
        self.0.set_node_value(context, node, value).await
    }
}

impl<T> From<T> for NodeStateProvider
where
    T: NodeStateProviderBackend + 'static,
{
    fn from(value: T) -> Self {
        NodeStateProvider(Arc::new(value))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl NodeStateProvider {
    /// Initialise a new in-memory node state provider backend fixture for unit tests.
    pub fn fixture() -> Self {
        NodeStateProvider::from(NodeStateProviderFixture::default())
    }
}

/// Operations a per-node telemetry backend must implement.
#[async_trait::async_trait]
pub trait NodeStateProviderBackend: Send + Sync {
    /// Fetch every node's `cores` counter.
    async fn get_all_node_values(&self, context: &Context) -> Result<BTreeMap<String, i64>>;

    /// Fetch a node's `cores` counter, if the node is known.
    async fn get_node_value(&self, context: &Context, node: &str) -> Result<Option<i64>>;

    /// Overwrite a node's `cores` counter.
    async fn set_node_value(&self, context: &Context, node: &str, value: i64) -> Result<()>;
}

/// In-memory implementation of a mock [`NodeStateProvider`] for unit tests.
#[derive(Clone, Default)]
pub struct NodeStateProviderFixture {
    inner: Arc<std::sync::Mutex<BTreeMap<String, i64>>>,
}

impl NodeStateProviderFixture {
    fn access(&self) -> std::sync::MutexGuard<BTreeMap<String, i64>> {
        self.inner
            .lock()
            .expect("NodeStateProviderFixture::inner lock poisoned")
    }
}

#[async_trait::async_trait]
impl NodeStateProviderBackend for NodeStateProviderFixture {
    async fn get_all_node_values(&self, _: &Context) -> Result<BTreeMap<String, i64>> {
        Ok(self.access().clone())
    }

    async fn get_node_value(&self, _: &Context, node: &str) -> Result<Option<i64>> {
        Ok(self.access().get(node).copied())
    }

    async fn set_node_value(&self, _: &Context, node: &str, value: i64) -> Result<()> {
        self.access().insert(node.to_string(), value);
        Ok(())
    }
}
