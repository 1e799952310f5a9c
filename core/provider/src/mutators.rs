//! The mutator API: every operation that advances the simulated cluster's state.
use std::collections::BTreeSet;

use anyhow::Result;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde_json::Value as Json;

use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_models::PropertyMap;
use replicore_cluster_models::ReplicaRecord;
use replicore_cluster_models::ReplicaState;
use replicore_cluster_view::ClusterState;
use replicore_cluster_view::ClusterStateBuilder;
use replicore_cluster_view::CollectionState;
use replicore_context::Context;
use replicore_errors::CollectionNotFound;
use replicore_errors::DuplicateCore;
use replicore_errors::NodeAlreadyLive;
use replicore_errors::NodeNotLive;
use replicore_errors::ReplicaNotFound;
use replicore_errors::Unsupported;

use crate::publisher;
use crate::state::ProviderState;
use crate::ClusterStateProvider;
use crate::CreateCollectionRequest;
use crate::CreateCollectionResult;

impl ClusterStateProvider {
    /// Wipe all internal maps and repopulate them from `initial`, then re-publish.
    ///
    /// Cluster-wide properties are untouched: they live at a separate published key and are
    /// only ever set through [`Self::set_cluster_properties`]/[`Self::set_cluster_property`].
    pub async fn set_cluster_state(&self, context: &Context, initial: ClusterState) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        guard.node_index.clear();
        guard.properties.collection.clear();
        guard.properties.slice.clear();
        guard.live_nodes = initial.live_nodes.clone();
        for node in &guard.live_nodes {
            guard.node_index.entry(node.clone()).or_default();
        }

        for (collection_name, collection) in &initial.collections {
            guard
                .properties
                .collection
                .insert(collection_name.clone(), collection.properties.clone());
            for (shard_name, slice) in &collection.shards {
                guard
                    .properties
                    .slice
                    .entry(collection_name.clone())
                    .or_default()
                    .insert(shard_name.clone(), slice.properties.clone());
                for replica in &slice.replicas {
                    let record = ReplicaRecord {
                        name: replica.name.clone(),
                        core: replica.core.clone(),
                        collection: collection_name.clone(),
                        shard: shard_name.clone(),
                        replica_type: replica.replica_type,
                        node: replica.node_name.clone(),
                        variables: replica.variables.clone(),
                    };
                    guard
                        .node_index
                        .entry(record.node.clone())
                        .or_default()
                        .push(record);
                }
            }
        }

        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Add `node` to the live node set. Returns `true` if its replica list was newly created.
    pub async fn add_node(&self, _context: &Context, node: &str) -> Result<bool> {
        let mut guard = self.0.state.lock().await;
        if guard.live_nodes.contains(node) {
            return Err(NodeAlreadyLive::new(node).into());
        }
        guard.live_nodes.insert(node.to_string());
        let created = !guard.node_index.contains_key(node);
        guard.node_index.entry(node.to_string()).or_default();
        Ok(created)
    }

    /// Remove `node` from the live node set. Every replica it hosted is marked `DOWN` and its
    /// collections are scheduled for re-election (with a publish beforehand). Returns whether
    /// the node was live.
    pub async fn remove_node(&self, context: &Context, node: &str) -> Result<bool> {
        let mut collections = BTreeSet::new();
        let was_live = {
            let mut guard = self.0.state.lock().await;
            let was_live = guard.live_nodes.remove(node);
            if let Some(records) = guard.node_index.get_mut(node) {
                for record in records.iter_mut() {
                    record.set_state(ReplicaState::Down);
                    collections.insert(record.collection.clone());
                }
            }
            was_live
        };
        self.schedule_election(context, collections, true).await?;
        Ok(was_live)
    }

    /// Add `record` to `node`'s replica list, marking it `ACTIVE` and bumping the node's `cores`
    /// counter. Fails if `record.core` is already in use (I1) or `node` is not live.
    ///
    /// Acquires `stateLock` once around [`Self::add_replica_locked`]; composite mutators that
    /// already hold the guard call that helper directly instead of re-entering the lock here.
    pub async fn add_replica(
        &self,
        context: &Context,
        node: &str,
        record: ReplicaRecord,
        run_election: bool,
    ) -> Result<()> {
        let collection = record.collection.clone();
        {
            let mut guard = self.0.state.lock().await;
            self.add_replica_locked(context, &mut guard, node, record).await?;
        }

        if run_election {
            self.schedule_election(context, BTreeSet::from([collection]), false)
                .await?;
        }
        Ok(())
    }

    /// [`Self::add_replica`]'s body, operating on an already-held `stateLock` guard and never
    /// scheduling an election itself: callers that fold several structural changes into one
    /// lock hold (`create_collection`, `move_replica`) call this directly, then decide for
    /// themselves what to schedule once the whole change is in place.
    async fn add_replica_locked(
        &self,
        context: &Context,
        guard: &mut ProviderState,
        node: &str,
        mut record: ReplicaRecord,
    ) -> Result<()> {
        if guard
            .node_index
            .values()
            .flatten()
            .any(|existing| existing.core == record.core)
        {
            return Err(DuplicateCore::new(record.core).into());
        }
        if !guard.live_nodes.contains(node) {
            return Err(NodeNotLive::new(node).into());
        }

        record.node = node.to_string();
        record.set_state(ReplicaState::Active);
        guard
            .node_index
            .entry(node.to_string())
            .or_default()
            .push(record);

        let cores = self.0.node_state.get_node_value(context, node).await?.unwrap_or(0);
        self.0.node_state.set_node_value(context, node, cores + 1).await?;
        Ok(())
    }

    /// Remove the replica named `replica_name` from `node`. If `node` is live, decrements its
    /// `cores` counter. Schedules a leader election over the replica's collection.
    ///
    /// Acquires `stateLock` once around [`Self::remove_replica_locked`]; see that method's docs
    /// for why composite mutators bypass this wrapper.
    pub async fn remove_replica(
        &self,
        context: &Context,
        node: &str,
        replica_name: &str,
    ) -> Result<()> {
        let collection = {
            let mut guard = self.0.state.lock().await;
            self.remove_replica_locked(context, &mut guard, node, replica_name)
                .await?
        };

        self.schedule_election(context, BTreeSet::from([collection]), false)
            .await?;
        Ok(())
    }

    /// [`Self::remove_replica`]'s body, operating on an already-held `stateLock` guard. Returns
    /// the removed replica's collection so the caller can decide what, if anything, to elect.
    async fn remove_replica_locked(
        &self,
        context: &Context,
        guard: &mut ProviderState,
        node: &str,
        replica_name: &str,
    ) -> Result<String> {
        let records = guard
            .node_index
            .get_mut(node)
            .ok_or_else(|| ReplicaNotFound::new(node, replica_name))?;
        let index = records
            .iter()
            .position(|record| record.name == replica_name)
            .ok_or_else(|| ReplicaNotFound::new(node, replica_name))?;
        let record = records.remove(index);

        if guard.live_nodes.contains(node) {
            let cores = self.0.node_state.get_node_value(context, node).await?.unwrap_or(0);
            if cores == 0 {
                panic!(
                    "cores counter for node '{node}' underflowed removing replica '{replica_name}' (I5 violated)"
                );
            }
            self.0.node_state.set_node_value(context, node, cores - 1).await?;
        }
        Ok(record.collection)
    }

    /// Place and create every replica of a new collection via the placement engine, then
    /// schedule one election for it.
    pub async fn create_collection(
        &self,
        context: &Context,
        request: CreateCollectionRequest,
    ) -> Result<CreateCollectionResult> {
        let CreateCollectionRequest {
            collection,
            shards,
            replicas,
            properties,
        } = request;

        // One guard for the whole structural change: snapshot, placement, every replica
        // insertion and the core_sequence update all happen without releasing `stateLock`.
        let mut guard = self.0.state.lock().await;
        let snapshot = ClusterStateBuilder::build(&guard.node_index, &guard.properties, &guard.live_nodes);
        let live_nodes = guard.live_nodes.clone();
        let positions = self
            .0
            .placement
            .build_replica_positions(context, &snapshot, &properties, &live_nodes, shards, replicas)
            .await?;

        guard
            .properties
            .collection
            .insert(collection.clone(), properties.clone());

        let mut sequence = 0u32;
        for position in positions {
            sequence += 1;
            let core = self
                .0
                .ids
                .core_name(&collection, &position.shard, position.replica_type, sequence);
            let name = self
                .0
                .ids
                .replica_name(context, &self.0.distrib_state, &collection, &collection)
                .await?;
            let record = ReplicaRecord {
                name,
                core,
                collection: collection.clone(),
                shard: position.shard,
                replica_type: position.replica_type,
                node: position.node.clone(),
                variables: PropertyMap::new(),
            };
            self.add_replica_locked(context, &mut guard, &position.node, record)
                .await?;
        }

        guard.core_sequence.insert(collection.clone(), sequence);
        drop(guard);

        self.schedule_election(context, BTreeSet::from([collection]), false)
            .await?;

        let request_id = properties.get("async").cloned();
        Ok(CreateCollectionResult { request_id })
    }

    /// Remove every replica and property entry for `collection`; decrement affected nodes'
    /// `cores` counters by exactly what they lost.
    pub async fn delete_collection(&self, context: &Context, collection: &str) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        guard.properties.forget_collection(collection);
        guard.core_sequence.remove(collection);

        let mut removed_per_node = Vec::new();
        for (node, records) in guard.node_index.iter_mut() {
            let before = records.len();
            records.retain(|record| record.collection != collection);
            let removed = before - records.len();
            if removed > 0 {
                removed_per_node.push((node.clone(), removed as i64));
            }
        }

        for (node, removed) in removed_per_node {
            if guard.live_nodes.contains(&node) {
                let cores = self.0.node_state.get_node_value(context, &node).await?.unwrap_or(0);
                if cores < removed {
                    panic!(
                        "cores counter for node '{node}' underflowed deleting collection '{collection}' (I5 violated)"
                    );
                }
                self.0
                    .node_state
                    .set_node_value(context, &node, cores - removed)
                    .await?;
            }
        }

        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Clear every replica and collection/slice property entry; reset every live node's `cores`
    /// counter to zero.
    pub async fn delete_all_collections(&self, context: &Context) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        for records in guard.node_index.values_mut() {
            records.clear();
        }
        guard.properties.forget_all_collections();
        guard.core_sequence.clear();

        let live_nodes: Vec<String> = guard.live_nodes.iter().cloned().collect();
        for node in live_nodes {
            self.0.node_state.set_node_value(context, &node, 0).await?;
        }

        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Move a replica to `target_node`, minting a fresh replica name and core name, then
    /// removing the original. One `stateLock` guard is held across the lookup, both the add
    /// and the remove, and the core_sequence bump; a single election is scheduled once the
    /// whole change is in place.
    pub async fn move_replica(
        &self,
        context: &Context,
        collection: &str,
        replica_name: &str,
        target_node: &str,
    ) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        if !guard.properties.collection.contains_key(collection) {
            return Err(CollectionNotFound::new(collection).into());
        }

        let mut found = None;
        'search: for (node, records) in guard.node_index.iter() {
            for record in records {
                if record.collection == collection && record.name == replica_name {
                    found = Some((node.clone(), record.shard.clone(), record.replica_type));
                    break 'search;
                }
            }
        }
        let (source_node, shard, replica_type) =
            found.ok_or_else(|| ReplicaNotFound::new(target_node, replica_name))?;

        let new_name = self
            .0
            .ids
            .replica_name(context, &self.0.distrib_state, collection, collection)
            .await?;
        let sequence = {
            let counter = guard.core_sequence.entry(collection.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        let new_core = self.0.ids.core_name(collection, &shard, replica_type, sequence);
        let new_record = ReplicaRecord {
            name: new_name,
            core: new_core,
            collection: collection.to_string(),
            shard,
            replica_type,
            node: target_node.to_string(),
            variables: PropertyMap::new(),
        };

        self.add_replica_locked(context, &mut guard, target_node, new_record)
            .await?;
        self.remove_replica_locked(context, &mut guard, &source_node, replica_name)
            .await?;
        drop(guard);

        self.schedule_election(context, BTreeSet::from([collection.to_string()]), false)
            .await?;
        Ok(())
    }

    /// Overwrite the cluster-wide property map.
    pub async fn set_cluster_properties(
        &self,
        context: &Context,
        properties: PropertyMap,
    ) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        guard.properties.cluster = properties;
        publisher::publish_cluster_properties(context, &self.0.distrib_state, &mut guard).await
    }

    /// Set or, if `value` is `None`, remove a single cluster-wide property.
    pub async fn set_cluster_property(
        &self,
        context: &Context,
        key: &str,
        value: Option<Json>,
    ) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        match value {
            Some(value) => {
                guard.properties.cluster.insert(key.to_string(), value);
            }
            None => {
                guard.properties.cluster.remove(key);
            }
        }
        publisher::publish_cluster_properties(context, &self.0.distrib_state, &mut guard).await
    }

    /// Overwrite, or if `None`, clear `collection`'s property map.
    pub async fn set_collection_properties(
        &self,
        context: &Context,
        collection: &str,
        properties: Option<PropertyMap>,
    ) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        match properties {
            Some(properties) => {
                guard.properties.collection.insert(collection.to_string(), properties);
            }
            None => {
                guard.properties.collection.remove(collection);
            }
        }
        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Set or, if `value` is `None`, remove a single collection property.
    pub async fn set_collection_property(
        &self,
        context: &Context,
        collection: &str,
        key: &str,
        value: Option<Json>,
    ) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        let properties = guard
            .properties
            .collection
            .entry(collection.to_string())
            .or_default();
        match value {
            Some(value) => {
                properties.insert(key.to_string(), value);
            }
            None => {
                properties.remove(key);
            }
        }
        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Overwrite a slice's property map.
    pub async fn set_slice_properties(
        &self,
        context: &Context,
        collection: &str,
        shard: &str,
        properties: PropertyMap,
    ) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        guard
            .properties
            .slice
            .entry(collection.to_string())
            .or_default()
            .insert(shard.to_string(), properties);
        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Force a publish of the current cluster state, independent of any mutator.
    pub async fn publish_state(&self, context: &Context) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        publisher::publish_state(context, &self.0.distrib_state, &mut guard).await
    }

    /// Force a publish of the current cluster property map, independent of any mutator.
    pub async fn publish_cluster_properties(&self, context: &Context) -> Result<()> {
        let mut guard = self.0.state.lock().await;
        publisher::publish_cluster_properties(context, &self.0.distrib_state, &mut guard).await
    }

    /// Build and return the current read-only cluster state snapshot.
    pub async fn get_cluster_state(&self, _context: &Context) -> ClusterState {
        let guard = self.0.state.lock().await;
        ClusterStateBuilder::build(&guard.node_index, &guard.properties, &guard.live_nodes)
    }

    /// The current live node set.
    pub async fn get_live_nodes(&self, _context: &Context) -> LiveNodeSet {
        self.0.state.lock().await.live_nodes.clone()
    }

    /// The current cluster-wide property map.
    pub async fn get_cluster_properties(&self, _context: &Context) -> PropertyMap {
        self.0.state.lock().await.properties.cluster.clone()
    }

    /// Collection names currently present in the cluster, in order.
    pub async fn list_collections(&self, context: &Context) -> Vec<String> {
        self.get_cluster_state(context)
            .await
            .list_collections()
            .map(String::from)
            .collect()
    }

    /// The routing policy attached to `collection`, if it exists.
    pub async fn get_collection_policy(&self, context: &Context, collection: &str) -> Option<String> {
        self.get_cluster_state(context)
            .await
            .collections
            .get(collection)
            .map(|state| state.policy.clone())
    }

    /// The state reference for a single collection, if it exists.
    pub async fn get_collection_state(
        &self,
        context: &Context,
        collection: &str,
    ) -> Option<CollectionState> {
        self.get_cluster_state(context)
            .await
            .collections
            .remove(collection)
    }

    /// Every replica record currently hosted on `node`.
    pub async fn get_replica_infos_for_node(&self, node: &str) -> Vec<ReplicaRecord> {
        self.0
            .state
            .lock()
            .await
            .node_index
            .get(node)
            .cloned()
            .unwrap_or_default()
    }

    /// Pick a uniformly random live node using the caller-supplied randomness source.
    pub async fn get_random_node<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        let guard = self.0.state.lock().await;
        guard.live_nodes.iter().choose(rng).cloned()
    }

    /// No-op, provided for interface conformance with real cluster providers.
    pub async fn connect(&self, _context: &Context) -> Result<()> {
        Ok(())
    }

    /// No-op, provided for interface conformance with real cluster providers.
    pub async fn close(&self, _context: &Context) -> Result<()> {
        Ok(())
    }

    /// Alias resolution is not implemented by the simulator.
    pub fn resolve_alias(&self, _alias: &str) -> Result<String> {
        Err(Unsupported::new("resolveAlias").into())
    }
}
