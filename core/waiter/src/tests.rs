use std::time::Duration;

use replicore_collab::IdAssigner;
use replicore_collab::NodeStateProvider;
use replicore_collab::PlacementEngine;
use replicore_collab::TimeSource;
use replicore_context::Context;
use replicore_provider::Collaborators;
use replicore_provider::ClusterStateProvider;
use replicore_provider::CreateCollectionRequest;
use replicore_store::StateManager;

use crate::shape;
use crate::PredicateWaiter;
use crate::WaitError;

fn test_provider() -> ClusterStateProvider {
    let collaborators = Collaborators {
        node_state: NodeStateProvider::fixture(),
        distrib_state: StateManager::fixture(),
        placement: PlacementEngine::fixture(),
        ids: IdAssigner::fixture(),
    };
    ClusterStateProvider::new(collaborators, 7)
}

#[tokio::test]
async fn wait_for_succeeds_once_collection_settles() {
    let context = Context::fixture();
    let provider = test_provider();
    let (time, _clock) = TimeSource::fixture();
    let waiter = PredicateWaiter::new(provider.clone(), time);

    provider.add_node(&context, "node-1").await.unwrap();
    provider.add_node(&context, "node-2").await.unwrap();
    provider
        .create_collection(
            &context,
            CreateCollectionRequest {
                collection: "widgets".to_string(),
                shards: 2,
                replicas: 2,
                properties: Default::default(),
            },
        )
        .await
        .unwrap();

    // The election runs in the background; give the executor's task a chance to settle it
    // before polling, since the simulated clock never advances on its own in this test.
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }

    waiter
        .wait_for(&context, "widgets", Duration::from_secs(1), shape(2, 2))
        .await
        .unwrap();
}

#[tokio::test]
async fn wait_for_succeeds_if_collection_absent() {
    let context = Context::fixture();
    let provider = test_provider();
    let (time, _clock) = TimeSource::fixture();
    let waiter = PredicateWaiter::new(provider, time);

    waiter
        .wait_for(&context, "ghost", Duration::from_secs(1), shape(1, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn wait_for_times_out_with_last_observation() {
    let context = Context::fixture();
    let provider = test_provider();
    let (time, clock) = TimeSource::fixture();
    let waiter = PredicateWaiter::new(provider.clone(), time);

    provider.add_node(&context, "node-1").await.unwrap();
    provider
        .create_collection(
            &context,
            CreateCollectionRequest {
                collection: "widgets".to_string(),
                shards: 1,
                replicas: 1,
                properties: Default::default(),
            },
        )
        .await
        .unwrap();

    let advancer = tokio::spawn(async move {
        for _ in 0..25 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            clock.advance(Duration::from_millis(60));
        }
    });

    // Never matches: no collection ever reaches 99 shards.
    let error = waiter
        .wait_for(&context, "widgets", Duration::from_secs(1), shape(99, 99))
        .await
        .unwrap_err();
    advancer.abort();

    match error {
        WaitError::Timeout { collection_state, .. } => {
            assert!(collection_state.is_some());
        }
    }
}
