use std::time::Duration;

use replicore_context::Context;
use replicore_store::StateManager;

use crate::Executor;
use crate::IdAssigner;
use crate::NodeStateProvider;
use crate::PlacementEngine;
use crate::TimeSource;

#[tokio::test]
async fn node_state_round_trips_cores_counter() {
    let context = Context::fixture();
    let nodes = NodeStateProvider::fixture();

    assert_eq!(nodes.get_node_value(&context, "node-1").await.unwrap(), None);
    nodes.set_node_value(&context, "node-1", 3).await.unwrap();
    assert_eq!(
        nodes.get_node_value(&context, "node-1").await.unwrap(),
        Some(3)
    );
    let all = nodes.get_all_node_values(&context).await.unwrap();
    assert_eq!(all.get("node-1"), Some(&3));
}

#[tokio::test]
async fn placement_round_robins_over_live_nodes() {
    let context = Context::fixture();
    let placement = PlacementEngine::fixture();
    let state = replicore_cluster_view::ClusterStateBuilder::build(
        &Default::default(),
        &Default::default(),
        &Default::default(),
    );
    let live_nodes = std::collections::BTreeSet::from([
        "node-1".to_string(),
        "node-2".to_string(),
    ]);

    let positions = placement
        .build_replica_positions(
            &context,
            &state,
            &Default::default(),
            &live_nodes,
            2,
            2,
        )
        .await
        .unwrap();
    assert_eq!(positions.len(), 4);
    assert_eq!(positions[0].shard, "shard1");
    assert_eq!(positions[2].shard, "shard2");
}

#[tokio::test]
async fn id_assigner_counts_up_per_collection_and_seed() {
    let context = Context::fixture();
    let state = StateManager::fixture();
    let ids = IdAssigner::fixture();

    let first = ids.replica_name(&context, &state, "widgets", "seed").await.unwrap();
    let second = ids.replica_name(&context, &state, "widgets", "seed").await.unwrap();
    assert_eq!(first, "core_node0");
    assert_eq!(second, "core_node1");
}

#[tokio::test]
async fn executor_fixture_queues_until_drained() {
    let context = Context::fixture();
    let (executor, fixture) = Executor::fixture();

    executor
        .submit_election(
            &context,
            std::collections::BTreeSet::from(["c".to_string()]),
            true,
        )
        .await
        .unwrap();
    let drained = fixture.drain();
    assert_eq!(drained.len(), 1);
    assert!(fixture.drain().is_empty());
}

#[tokio::test]
async fn simulated_time_source_unblocks_sleepers_on_advance() {
    let (time, fixture) = TimeSource::fixture();
    let waiter = tokio::spawn({
        let time = time.clone();
        async move {
            time.sleep(Duration::from_millis(50)).await;
        }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    fixture.advance(Duration::from_millis(50));
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("sleeper did not unblock after advance")
        .unwrap();
}
