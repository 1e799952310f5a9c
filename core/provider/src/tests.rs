use replicore_cluster_models::ReplicaRecord;
use replicore_cluster_models::ReplicaState;
use replicore_cluster_models::ReplicaType;
use replicore_collab::IdAssigner;
use replicore_collab::NodeStateProvider;
use replicore_collab::PlacementEngine;
use replicore_context::Context;
use replicore_store::keys;
use replicore_store::StateManager;

use crate::ClusterStateProvider;
use crate::Collaborators;
use crate::CreateCollectionRequest;

fn test_provider() -> (ClusterStateProvider, StateManager) {
    let distrib_state = StateManager::fixture();
    let collaborators = Collaborators {
        node_state: NodeStateProvider::fixture(),
        distrib_state: distrib_state.clone(),
        placement: PlacementEngine::fixture(),
        ids: IdAssigner::fixture(),
    };
    (ClusterStateProvider::new(collaborators, 42), distrib_state)
}

/// Elections run on a detached task after the mutator that scheduled them returns; yield enough
/// times to let one settle before inspecting the resulting snapshot.
async fn let_elections_run() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn a_replica(collection: &str, shard: &str, core: &str, name: &str) -> ReplicaRecord {
    ReplicaRecord {
        name: name.to_string(),
        core: core.to_string(),
        collection: collection.to_string(),
        shard: shard.to_string(),
        replica_type: ReplicaType::Nrt,
        node: String::new(),
        variables: Default::default(),
    }
}

#[tokio::test]
async fn duplicate_core_is_rejected() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();

    provider
        .add_replica(&context, "node-1", a_replica("widgets", "shard1", "c1", "r1"), false)
        .await
        .unwrap();
    let error = provider
        .add_replica(&context, "node-1", a_replica("widgets", "shard1", "c1", "r2"), false)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("already exists"));
}

#[tokio::test]
async fn add_replica_rejects_non_live_node() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    let error = provider
        .add_replica(&context, "node-1", a_replica("widgets", "shard1", "c1", "r1"), false)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("not live"));
}

#[tokio::test]
async fn add_node_rejects_duplicate_and_remove_reports_liveness() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();

    assert!(provider.add_node(&context, "node-1").await.unwrap());
    let error = provider.add_node(&context, "node-1").await.unwrap_err();
    assert!(error.to_string().contains("already live"));

    assert!(provider.remove_node(&context, "node-1").await.unwrap());
    assert!(!provider.remove_node(&context, "node-1").await.unwrap());
}

#[tokio::test]
async fn cores_counter_tracks_add_and_remove_replica() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();

    provider
        .add_replica(&context, "node-1", a_replica("widgets", "shard1", "c1", "r1"), false)
        .await
        .unwrap();
    let infos = provider.get_replica_infos_for_node("node-1").await;
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].state(), ReplicaState::Active);

    provider.remove_replica(&context, "node-1", "r1").await.unwrap();
    let infos = provider.get_replica_infos_for_node("node-1").await;
    assert!(infos.is_empty());
}

#[tokio::test]
async fn cluster_property_setter_adds_and_removes_keys() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();

    provider
        .set_cluster_property(&context, "region", Some(serde_json::json!("eu-west")))
        .await
        .unwrap();
    let properties = provider.get_cluster_properties(&context).await;
    assert_eq!(properties.get("region").unwrap(), "eu-west");

    provider.set_cluster_property(&context, "region", None).await.unwrap();
    let properties = provider.get_cluster_properties(&context).await;
    assert!(!properties.contains_key("region"));
}

#[tokio::test]
async fn set_cluster_state_round_trips_through_publish() {
    let (provider, store) = test_provider();
    let context = Context::fixture();

    provider.add_node(&context, "node-1").await.unwrap();
    provider
        .add_replica(&context, "node-1", a_replica("widgets", "shard1", "c1", "r1"), false)
        .await
        .unwrap();
    let seeded = provider.get_cluster_state(&context).await;

    // Wipe the provider's internal state, then rebuild it purely from the snapshot via
    // `set_cluster_state`, and check the result actually matches what was seeded.
    provider.delete_all_collections(&context).await.unwrap();
    assert!(provider.get_cluster_state(&context).await.collections.is_empty());

    provider.set_cluster_state(&context, seeded.clone()).await.unwrap();
    let restored = provider.get_cluster_state(&context).await;
    assert_eq!(restored, seeded);

    let record = store.get_data(&context, keys::CLUSTER_STATE).await.unwrap().unwrap();
    let published: replicore_cluster_view::ClusterState = serde_json::from_slice(&record.data).unwrap();
    assert_eq!(published, restored);
}

#[tokio::test]
async fn publish_state_is_idempotent() {
    let (provider, store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();

    provider.publish_state(&context).await.unwrap();
    let first = store
        .get_data(&context, keys::CLUSTER_STATE)
        .await
        .unwrap()
        .unwrap()
        .version;

    provider.publish_state(&context).await.unwrap();
    let second = store
        .get_data(&context, keys::CLUSTER_STATE)
        .await
        .unwrap()
        .unwrap()
        .version;
    assert_eq!(first, second, "a no-op publish must not write a new version");
}

#[tokio::test]
async fn create_collection_elects_a_leader_once_replicas_settle() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();
    provider.add_node(&context, "node-2").await.unwrap();

    provider
        .create_collection(
            &context,
            CreateCollectionRequest {
                collection: "widgets".to_string(),
                shards: 1,
                replicas: 2,
                properties: Default::default(),
            },
        )
        .await
        .unwrap();
    let_elections_run().await;

    let snapshot = provider.get_cluster_state(&context).await;
    let shard = &snapshot.collections.get("widgets").unwrap().shards["shard1"];
    assert_eq!(shard.replicas.len(), 2);
    assert!(shard.leader().is_some());
}

#[tokio::test]
async fn node_loss_triggers_reelection_with_dead_leader_replacement() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();
    provider.add_node(&context, "node-2").await.unwrap();

    provider
        .create_collection(
            &context,
            CreateCollectionRequest {
                collection: "widgets".to_string(),
                shards: 1,
                replicas: 2,
                properties: Default::default(),
            },
        )
        .await
        .unwrap();
    let_elections_run().await;

    let snapshot = provider.get_cluster_state(&context).await;
    let shard = &snapshot.collections["widgets"].shards["shard1"];
    let leader = shard.leader().expect("a leader must be elected").node_name.clone();

    provider.remove_node(&context, &leader).await.unwrap();
    let_elections_run().await;

    let snapshot = provider.get_cluster_state(&context).await;
    let shard = &snapshot.collections["widgets"].shards["shard1"];
    let new_leader = shard.leader().expect("a replacement leader must be elected");
    assert_ne!(new_leader.node_name, leader, "a dead leader must be replaced");
    let dead_replica = shard.replicas.iter().find(|r| r.node_name == leader).unwrap();
    assert_eq!(dead_replica.state(), ReplicaState::Down);
}

#[tokio::test]
async fn move_replica_preserves_shard_replica_count() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();
    provider.add_node(&context, "node-2").await.unwrap();
    provider.add_node(&context, "node-3").await.unwrap();

    provider
        .create_collection(
            &context,
            CreateCollectionRequest {
                collection: "widgets".to_string(),
                shards: 1,
                replicas: 2,
                properties: Default::default(),
            },
        )
        .await
        .unwrap();
    let_elections_run().await;

    let before = provider.get_cluster_state(&context).await;
    let shard_before = &before.collections["widgets"].shards["shard1"];
    assert_eq!(shard_before.replicas.len(), 2);
    let moving = shard_before.replicas[0].clone();

    provider
        .move_replica(&context, "widgets", &moving.name, "node-3")
        .await
        .unwrap();
    let_elections_run().await;

    let after = provider.get_cluster_state(&context).await;
    let shard_after = &after.collections["widgets"].shards["shard1"];
    assert_eq!(shard_after.replicas.len(), 2, "move must preserve replica count");
    assert!(shard_after.replicas.iter().any(|r| r.node_name == "node-3"));
    assert!(!shard_after.replicas.iter().any(|r| r.name == moving.name));
    assert!(provider
        .get_replica_infos_for_node(&moving.node_name)
        .await
        .iter()
        .all(|r| r.name != moving.name));
}

#[tokio::test]
async fn move_replica_rejects_unknown_collection() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();

    let error = provider
        .move_replica(&context, "widgets", "r1", "node-1")
        .await
        .unwrap_err();
    assert!(error.to_string().contains("not found"));
}

#[tokio::test]
async fn leader_election_is_deterministic_for_a_fixed_seed() {
    async fn elect_once() -> String {
        let (provider, _store) = test_provider();
        let context = Context::fixture();
        provider.add_node(&context, "node-1").await.unwrap();
        provider.add_node(&context, "node-2").await.unwrap();
        provider
            .create_collection(
                &context,
                CreateCollectionRequest {
                    collection: "widgets".to_string(),
                    shards: 1,
                    replicas: 2,
                    properties: Default::default(),
                },
            )
            .await
            .unwrap();
        let_elections_run().await;

        let snapshot = provider.get_cluster_state(&context).await;
        snapshot.collections["widgets"].shards["shard1"]
            .leader()
            .expect("a leader must be elected")
            .node_name
            .clone()
    }

    let first = elect_once().await;
    let second = elect_once().await;
    assert_eq!(first, second, "the same election seed must pick the same leader");
}

#[tokio::test]
async fn delete_collection_clears_cores_counter() {
    let (provider, _store) = test_provider();
    let context = Context::fixture();
    provider.add_node(&context, "node-1").await.unwrap();
    provider
        .add_replica(&context, "node-1", a_replica("widgets", "shard1", "c1", "r1"), false)
        .await
        .unwrap();

    provider.delete_collection(&context, "widgets").await.unwrap();
    assert!(provider.get_replica_infos_for_node("node-1").await.is_empty());
    assert!(provider.list_collections(&context).await.is_empty());
}
