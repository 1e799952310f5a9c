//! Decide where newly created replicas go.
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_models::PropertyMap;
use replicore_cluster_models::ReplicaType;
use replicore_cluster_view::ClusterState;
use replicore_context::Context;

/// One placement decision for a replica being created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicaPosition {
    pub shard: String,
    pub node: String,
    pub replica_type: ReplicaType,
}

/// Compute replica placements for a new collection.
#[derive(Clone)]
pub struct PlacementEngine(Arc<dyn PlacementEngineBackend>);

impl PlacementEngine {
    /// Build the list of `(shard, node, type)` positions for a collection with `shards` slices
    /// and `replicas` replicas per slice.
    pub async fn build_replica_positions(
        &self,
        context: &Context,
        state: &ClusterState,
        properties: &PropertyMap,
        live_nodes: &LiveNodeSet,
        shards: u32,
        replicas: u32,
    ) -> Result<Vec<ReplicaPosition>> {
        self.0
            .build_replica_positions(context, state, properties, live_nodes, shards, replicas)
            .await
    }
}

impl<T> From<T> for PlacementEngine
where
    T: PlacementEngineBackend + 'static,
{
    fn from(value: T) -> Self {
        PlacementEngine(Arc::new(value))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl PlacementEngine {
    /// Initialise the round-robin placement engine fixture for unit tests.
    pub fn fixture() -> Self {
        PlacementEngine::from(PlacementEngineFixture)
    }
}

/// Operations a replica placement backend must implement.
#[async_trait::async_trait]
pub trait PlacementEngineBackend: Send + Sync {
    /// Build the list of `(shard, node, type)` positions for a new collection.
    async fn build_replica_positions(
        &self,
        context: &Context,
        state: &ClusterState,
        properties: &PropertyMap,
        live_nodes: &LiveNodeSet,
        shards: u32,
        replicas: u32,
    ) -> Result<Vec<ReplicaPosition>>;
}

/// Deterministic round-robin placement engine for unit tests.
///
/// Every replica is of type [`ReplicaType::Nrt`]; nodes are assigned to shards in order, cycling
/// through the live node set. No attempt is made at rack- or resource-awareness.
#[derive(Clone, Copy, Default)]
pub struct PlacementEngineFixture;

#[async_trait::async_trait]
impl PlacementEngineBackend for PlacementEngineFixture {
    async fn build_replica_positions(
        &self,
        _: &Context,
        _: &ClusterState,
        _: &PropertyMap,
        live_nodes: &LiveNodeSet,
        shards: u32,
        replicas: u32,
    ) -> Result<Vec<ReplicaPosition>> {
        anyhow::ensure!(!live_nodes.is_empty(), "no live nodes to place replicas on");
        let nodes: Vec<&String> = live_nodes.iter().collect();
        let mut positions = Vec::with_capacity((shards * replicas) as usize);
        let mut next_node = 0usize;
        for shard in 0..shards {
            for _ in 0..replicas {
                let node = nodes[next_node % nodes.len()].clone();
                next_node += 1;
                positions.push(ReplicaPosition {
                    shard: format!("shard{}", shard + 1),
                    node,
                    replica_type: ReplicaType::Nrt,
                });
            }
        }
        Ok(positions)
    }
}
