//! Failure kinds returned by [`crate::PredicateWaiter::wait_for`].
use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_view::CollectionState;

/// A wait that never matched its predicate before the simulated clock reached the timeout.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The predicate never matched; carries the last snapshot observed for diagnostics.
    #[error("timed out waiting for the collection state predicate to match")]
    Timeout {
        live_nodes: LiveNodeSet,
        collection_state: Option<CollectionState>,
    },
}
