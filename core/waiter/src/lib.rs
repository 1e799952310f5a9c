//! Block on a predicate over the simulated cluster's state, under a simulated clock.
//!
//! Production autoscaling tests need to assert "collection X now has shape Y" without sleeping
//! on wall-clock time; [`PredicateWaiter`] polls fresh [`ClusterState`](replicore_cluster_view::ClusterState)
//! snapshots from a [`ClusterStateProvider`] at a fixed cadence, driven entirely by the injected
//! [`TimeSource`], so a whole timeout-bound scenario runs instantly under a simulated clock.
use std::time::Duration;

use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_view::CollectionState;
use replicore_collab::TimeSource;
use replicore_context::Context;
use replicore_provider::ClusterStateProvider;

mod error;

#[cfg(test)]
mod tests;

pub use self::error::WaitError;

/// Cadence at which [`PredicateWaiter::wait_for`] re-reads the cluster state snapshot.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Blocks on a user predicate over `(live nodes, collection state)`.
#[derive(Clone)]
pub struct PredicateWaiter {
    provider: ClusterStateProvider,
    time: TimeSource,
}

impl PredicateWaiter {
    /// Build a waiter over `provider`, reading time from `time`.
    pub fn new(provider: ClusterStateProvider, time: TimeSource) -> Self {
        PredicateWaiter { provider, time }
    }

    /// Block until `predicate` matches, `collection` stops existing, or `timeout` elapses.
    ///
    /// `predicate` must be side-effect-free: it may be invoked any number of times. A caller
    /// that needs the last observation on timeout gets it from [`WaitError::Timeout`].
    pub async fn wait_for<P>(
        &self,
        context: &Context,
        collection: &str,
        timeout: Duration,
        predicate: P,
    ) -> Result<(), WaitError>
    where
        P: Fn(&LiveNodeSet, &CollectionState) -> bool,
    {
        let start = self.time.now().await;
        loop {
            let state = self.provider.get_cluster_state(context).await;
            match state.collections.get(collection) {
                None => return Ok(()),
                Some(collection_state) if predicate(&state.live_nodes, collection_state) => {
                    return Ok(());
                }
                _ => {}
            }

            let elapsed = self.time.now().await.saturating_sub(start);
            if elapsed >= timeout {
                return Err(WaitError::Timeout {
                    collection_state: state.collections.get(collection).cloned(),
                    live_nodes: state.live_nodes,
                });
            }
            self.time.sleep(POLL_INTERVAL).await;
        }
    }
}

/// `shape(shards, replicas)`: true iff the collection has exactly `shards` slices, each with
/// exactly `replicas` replicas that are active and on live nodes.
pub fn shape(shards: usize, replicas: usize) -> impl Fn(&LiveNodeSet, &CollectionState) -> bool {
    move |live_nodes, collection_state| {
        collection_state.shards.len() == shards
            && collection_state
                .shards
                .values()
                .all(|slice| slice.is_settled(replicas, live_nodes))
    }
}
