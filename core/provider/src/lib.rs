//! The simulated cluster state provider: mutator API, leader election and state publishing.
//!
//! [`ClusterStateProvider`] owns every `ReplicaRecord`, property map and live-node set in the
//! simulated cluster. All structural changes go through its methods, which serialise on a
//! single `tokio::sync::Mutex` (chosen over `std::sync::Mutex` so it can stay held across the
//! `.await` points that reach into the external collaborators without releasing and
//! re-acquiring it). Leader elections triggered by a mutator run after that mutator returns, on
//! a background task, mirroring how the production system defers them to an executor.
use std::collections::BTreeSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use anyhow::Result;
use serde_json::Value as Json;
use tokio::sync::Mutex as AsyncMutex;

use replicore_collab::ElectionTask;
use replicore_collab::Executor;
use replicore_collab::ExecutorBackend;
use replicore_collab::IdAssigner;
use replicore_collab::NodeStateProvider;
use replicore_collab::PlacementEngine;
use replicore_cluster_models::PropertyMap;
use replicore_context::Context;
use replicore_store::StateManager;

mod elector;
mod mutators;
mod publisher;
mod state;

#[cfg(test)]
mod tests;

use self::state::ProviderState;

/// Request driving [`ClusterStateProvider::create_collection`].
#[derive(Clone, Debug)]
pub struct CreateCollectionRequest {
    pub collection: String,
    pub shards: u32,
    pub replicas: u32,
    pub properties: PropertyMap,
}

/// Result of [`ClusterStateProvider::create_collection`].
#[derive(Clone, Debug, Default)]
pub struct CreateCollectionResult {
    /// Echo of the request's `async` property, when present.
    pub request_id: Option<Json>,
}

/// External collaborators the provider depends on, supplied by the caller at construction.
///
/// The provider wires its own [`Executor`] internally (see [`InlineExecutor`]) since running
/// elections is the provider's own job; every other collaborator is genuinely external.
pub struct Collaborators {
    pub node_state: NodeStateProvider,
    pub distrib_state: StateManager,
    pub placement: PlacementEngine,
    pub ids: IdAssigner,
}

/// Owns the simulated cluster's state and exposes the mutator API over it.
#[derive(Clone)]
pub struct ClusterStateProvider(Arc<Inner>);

struct Inner {
    state: AsyncMutex<ProviderState>,
    elector_lock: AsyncMutex<()>,
    node_state: NodeStateProvider,
    distrib_state: StateManager,
    placement: PlacementEngine,
    ids: IdAssigner,
    executor: Executor,
    election_seed: AtomicU64,
}

impl ClusterStateProvider {
    /// Construct a provider over the given collaborators.
    ///
    /// `election_seed` seeds every leader election's RNG (mixed with the collection/shard being
    /// elected); pass the same seed across runs to make `createCollection` + election
    /// reproducible.
    pub fn new(collaborators: Collaborators, election_seed: u64) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| Inner {
            state: AsyncMutex::new(ProviderState::default()),
            elector_lock: AsyncMutex::new(()),
            node_state: collaborators.node_state,
            distrib_state: collaborators.distrib_state,
            placement: collaborators.placement,
            ids: collaborators.ids,
            executor: Executor::from(InlineExecutor {
                inner: weak.clone(),
            }),
            election_seed: AtomicU64::new(election_seed),
        });
        ClusterStateProvider(inner)
    }

    /// Change the election seed used by future elections.
    pub fn set_election_seed(&self, seed: u64) {
        self.0.election_seed.store(seed, Ordering::Relaxed);
    }

    async fn schedule_election(
        &self,
        context: &Context,
        collections: BTreeSet<String>,
        publish_before_electing: bool,
    ) -> Result<()> {
        if collections.is_empty() {
            return Ok(());
        }
        self.0
            .executor
            .submit_election(context, collections, publish_before_electing)
            .await
    }
}

impl Inner {
    /// Run one deferred election task: acquire the elector's monitor, optionally publish,
    /// acquire the state lock, mutate, release both.
    async fn run_election(inner: &Arc<Inner>, context: &Context, task: ElectionTask) -> Result<()> {
        let _monitor = inner.elector_lock.lock().await;
        let mut guard = inner.state.lock().await;
        if task.publish_before_electing {
            publisher::publish_state(context, &inner.distrib_state, &mut guard).await?;
        }
        let seed = inner.election_seed.load(Ordering::Relaxed);
        elector::elect(context, &mut guard, &task.collections, seed);
        Ok(())
    }
}

/// [`ExecutorBackend`] that runs elections on a detached background task.
///
/// Holds only a [`Weak`] reference to [`Inner`] so the provider's `Arc` cycle (provider →
/// executor → provider) doesn't leak; a submission arriving after the provider is dropped is
/// simply discarded.
struct InlineExecutor {
    inner: Weak<Inner>,
}

#[async_trait::async_trait]
impl ExecutorBackend for InlineExecutor {
    async fn submit(&self, context: &Context, task: ElectionTask) -> Result<()> {
        let Some(inner) = self.inner.upgrade() else {
            return Ok(());
        };
        let context = context.clone();
        tokio::spawn(async move {
            if let Err(error) = Inner::run_election(&inner, &context, task).await {
                slog::error!(context.logger, "deferred leader election failed"; "error" => %error);
            }
        });
        Ok(())
    }
}
