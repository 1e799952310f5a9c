//! Re-elect shard leaders after a change that can invalidate the current one.
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use slog::debug;

use replicore_cluster_models::NodeIndex;
use replicore_cluster_models::ReplicaRecord;
use replicore_cluster_models::ReplicaState;
use replicore_cluster_view::ClusterStateBuilder;
use replicore_cluster_view::Slice;
use replicore_context::Context;

use crate::state::ProviderState;

/// Re-run leader election for `collections`.
///
/// Called with `stateLock` already held. Slices whose current leader is live are left alone;
/// every other slice has its candidates shuffled with a seed derived from `seed` so that
/// replays with the same seed pick the same leader.
pub(crate) fn elect(context: &Context, state: &mut ProviderState, collections: &BTreeSet<String>, seed: u64) {
    let snapshot = ClusterStateBuilder::build(&state.node_index, &state.properties, &state.live_nodes);
    for collection_name in collections {
        let Some(collection) = snapshot.collections.get(collection_name) else {
            continue;
        };
        for (shard_name, slice) in &collection.shards {
            elect_slice(context, state, collection_name, shard_name, slice, seed);
        }
    }
}

fn elect_slice(
    context: &Context,
    state: &mut ProviderState,
    collection: &str,
    shard: &str,
    slice: &Slice,
    seed: u64,
) {
    if let Some(leader) = slice.leader() {
        if state.live_nodes.contains(&leader.node_name) {
            return;
        }
    }

    let mut candidates = Vec::new();
    for replica in &slice.replicas {
        let record = find_record_mut(&mut state.node_index, &replica.node_name, &replica.name)
            .unwrap_or_else(|| {
                panic!(
                    "leader election: no backing record for replica '{}' on node '{}' (I2 violated)",
                    replica.name, replica.node_name,
                )
            });
        record.clear_leader();
        let live = state.live_nodes.contains(&record.node);
        if live && record.state() == ReplicaState::Active {
            candidates.push((replica.node_name.clone(), replica.name.clone()));
        } else if !live {
            record.set_state(ReplicaState::Down);
        }
    }

    if candidates.is_empty() {
        debug!(
            context.logger,
            "no active candidate to elect as leader";
            "collection" => collection,
            "shard" => shard,
        );
        return;
    }

    let mut rng = StdRng::seed_from_u64(slice_seed(seed, collection, shard));
    candidates.shuffle(&mut rng);
    let (node, name) = &candidates[0];
    let record = find_record_mut(&mut state.node_index, node, name)
        .expect("leader election: elected candidate record disappeared (I2 violated)");
    record.set_leader();
}

fn find_record_mut<'a>(
    node_index: &'a mut NodeIndex,
    node: &str,
    name: &str,
) -> Option<&'a mut ReplicaRecord> {
    node_index
        .get_mut(node)?
        .iter_mut()
        .find(|record| record.name == name)
}

/// Derive a per-slice seed from the election seed so every slice shuffles independently while
/// staying reproducible for a fixed `seed`.
fn slice_seed(seed: u64, collection: &str, shard: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    collection.hash(&mut hasher);
    shard.hash(&mut hasher);
    hasher.finish()
}
