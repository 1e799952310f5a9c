use replicore_cluster_models::NodeIndex;
use replicore_cluster_models::PropertyMaps;
use replicore_cluster_models::ReplicaRecord;
use replicore_cluster_models::ReplicaState;
use replicore_cluster_models::ReplicaType;

use crate::ClusterStateBuilder;

fn record(core: &str, collection: &str, shard: &str, node: &str) -> ReplicaRecord {
    let mut record = ReplicaRecord {
        name: format!("{core}_name"),
        core: core.to_string(),
        collection: collection.to_string(),
        shard: shard.to_string(),
        replica_type: ReplicaType::Nrt,
        node: node.to_string(),
        variables: Default::default(),
    };
    record.set_state(ReplicaState::Active);
    record
}

#[test]
fn groups_replicas_by_collection_and_shard() {
    let mut node_index = NodeIndex::new();
    node_index.insert(
        "node-1".to_string(),
        vec![record("c_s1_replica_n1", "c", "s1", "node-1")],
    );
    node_index.insert(
        "node-2".to_string(),
        vec![record("c_s1_replica_n2", "c", "s1", "node-2")],
    );

    let properties = PropertyMaps::default();
    let mut live_nodes = std::collections::BTreeSet::new();
    live_nodes.insert("node-1".to_string());
    live_nodes.insert("node-2".to_string());

    let state = ClusterStateBuilder::build(&node_index, &properties, &live_nodes);
    let collection = state.collections.get("c").unwrap();
    let shard = collection.shards.get("s1").unwrap();
    assert_eq!(shard.replicas.len(), 2);
    assert_eq!(collection.policy, crate::DEFAULT_ROUTING_POLICY);
}

#[test]
fn deterministic_given_identical_inputs() {
    let mut node_index = NodeIndex::new();
    node_index.insert(
        "node-1".to_string(),
        vec![record("c_s1_replica_n1", "c", "s1", "node-1")],
    );
    let properties = PropertyMaps::default();
    let live_nodes = std::collections::BTreeSet::from(["node-1".to_string()]);

    let a = ClusterStateBuilder::build(&node_index, &properties, &live_nodes);
    let b = ClusterStateBuilder::build(&node_index, &properties, &live_nodes);
    assert_eq!(a, b);
}

#[test]
fn empty_collection_property_still_surfaces_collection() {
    let node_index = NodeIndex::new();
    let mut properties = PropertyMaps::default();
    properties
        .collection
        .insert("ghost".to_string(), Default::default());
    let live_nodes = std::collections::BTreeSet::new();

    let state = ClusterStateBuilder::build(&node_index, &properties, &live_nodes);
    assert!(state.collections.contains_key("ghost"));
    assert!(state.collections["ghost"].shards.is_empty());
}
