//! Run a scripted demo scenario against the simulated cluster state provider.
use std::time::Duration;

use anyhow::Result;

use replicore_collab::IdAssigner;
use replicore_collab::NodeStateProvider;
use replicore_collab::PlacementEngine;
use replicore_collab::SystemTimeSource;
use replicore_collab::TimeSource;
use replicore_conf::Conf;
use replicore_context::Context;
use replicore_injector::Injector;
use replicore_provider::Collaborators;
use replicore_provider::ClusterStateProvider;
use replicore_provider::CreateCollectionRequest;
use replicore_store::StateManager;
use replicore_waiter::shape;
use replicore_waiter::PredicateWaiter;

use crate::init;

/// Generous timeout for the demo's wait, well above anything `shape` should actually need given
/// the waiter's fixed poll interval.
const WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stand up an in-memory cluster, create a sharded collection, wait for it to settle, and print
/// the resulting cluster state as JSON.
pub async fn run(conf: Conf, collection: String, shards: u32, replicas: u32, nodes: u32) -> Result<()> {
    let telemetry = init::telemetry(conf.telemetry.clone()).await?;
    let context = Context::root(telemetry.logger.clone()).build();

    let collaborators = Collaborators {
        node_state: NodeStateProvider::fixture(),
        distrib_state: StateManager::fixture(),
        placement: PlacementEngine::fixture(),
        ids: IdAssigner::fixture(),
    };
    let provider = ClusterStateProvider::new(collaborators, conf.simulator.election_seed);
    let time = TimeSource::from(SystemTimeSource);
    let waiter = PredicateWaiter::new(provider.clone(), time);
    Injector::set_global(Injector {
        conf: conf.clone(),
        context: context.clone(),
        provider: provider.clone(),
        waiter: waiter.clone(),
    });

    for index in 0..nodes {
        let node = format!("node-{index}");
        provider.add_node(&context, &node).await?;
    }
    slog::info!(context.logger, "started simulated nodes"; "count" => nodes);

    let request = CreateCollectionRequest {
        collection: collection.clone(),
        shards,
        replicas,
        properties: Default::default(),
    };
    provider.create_collection(&context, request).await?;
    slog::info!(
        context.logger, "requested collection creation";
        "collection" => &collection, "shards" => shards, "replicas" => replicas,
    );

    waiter
        .wait_for(&context, &collection, WAIT_TIMEOUT, shape(shards as usize, replicas as usize))
        .await?;
    slog::info!(context.logger, "collection settled"; "collection" => &collection);

    let state = provider.get_cluster_state(&context).await;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
