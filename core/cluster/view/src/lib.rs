//! Derived, immutable view of the simulated cluster's state.
//!
//! A [`ClusterState`] is rebuilt from the provider's internal maps by
//! [`ClusterStateBuilder`] whenever it is requested or published; callers only ever observe this
//! view, never the internal maps it was built from.
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_models::PropertyMap;
use replicore_cluster_models::ReplicaState;
use replicore_cluster_models::ReplicaType;
use replicore_cluster_models::VAR_LEADER;
use replicore_cluster_models::VAR_STATE;

mod builder;

#[cfg(test)]
mod tests;

pub use self::builder::ClusterStateBuilder;
pub use self::builder::DEFAULT_ROUTING_POLICY;

/// Immutable snapshot of the entire simulated cluster, as published to the external store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    pub version: i64,

    #[serde(rename = "liveNodes")]
    pub live_nodes: LiveNodeSet,

    pub collections: BTreeMap<String, CollectionState>,
}

impl ClusterState {
    /// Collection names present in this snapshot, in order.
    pub fn list_collections(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}

/// Snapshot of a single collection: its shards and collection-level properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionState {
    pub version: i64,
    pub policy: String,

    #[serde(default)]
    pub properties: PropertyMap,

    pub shards: BTreeMap<String, Slice>,
}

/// Snapshot of a single shard: its replicas and slice-level properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    #[serde(default)]
    pub properties: PropertyMap,

    pub replicas: Vec<Replica>,
}

impl Slice {
    /// The replica currently marked as leader, if any.
    pub fn leader(&self) -> Option<&Replica> {
        self.replicas.iter().find(|replica| replica.is_leader())
    }

    /// Whether this slice has exactly `replicas` replicas, all active and on live nodes.
    ///
    /// This is the per-slice half of the `shape(shards, replicas)` wait predicate.
    pub fn is_settled(&self, replicas: usize, live_nodes: &LiveNodeSet) -> bool {
        self.replicas.len() == replicas
            && self
                .replicas
                .iter()
                .all(|replica| replica.is_active(live_nodes))
    }
}

/// Read-only view of one replica, embedding its record's `variables` bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    pub name: String,
    pub core: String,

    #[serde(rename = "type")]
    pub replica_type: ReplicaType,

    pub node_name: String,

    #[serde(flatten)]
    pub variables: PropertyMap,
}

impl Replica {
    /// Current [`ReplicaState`], defaulting to [`ReplicaState::Down`] if unset.
    pub fn state(&self) -> ReplicaState {
        self.variables
            .get(VAR_STATE)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(ReplicaState::Down)
    }

    /// Whether this replica carries `leader = true`.
    pub fn is_leader(&self) -> bool {
        self.variables
            .get(VAR_LEADER)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    /// Whether this replica is active and its node is live (invariant I4's condition).
    pub fn is_active(&self, live_nodes: &LiveNodeSet) -> bool {
        self.state() == ReplicaState::Active && live_nodes.contains(&self.node_name)
    }
}
