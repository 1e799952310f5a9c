//! Materialise a [`ClusterState`] snapshot from the provider's internal maps.
use std::collections::BTreeMap;

use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_models::NodeIndex;
use replicore_cluster_models::PropertyMaps;

use crate::ClusterState;
use crate::CollectionState;
use crate::Replica;
use crate::Slice;

/// Default shard routing policy attached to every collection snapshot.
///
/// The simulator implements a single routing strategy, mirroring the production system's
/// default compositeId router.
pub const DEFAULT_ROUTING_POLICY: &str = "compositeId";

/// Stateless builder turning the provider's internal maps into a [`ClusterState`] snapshot.
pub struct ClusterStateBuilder;

impl ClusterStateBuilder {
    /// Build a [`ClusterState`] snapshot from the given internal maps.
    ///
    /// Every map involved is ordered, so identical inputs always produce an equal output.
    pub fn build(
        node_index: &NodeIndex,
        properties: &PropertyMaps,
        live_nodes: &LiveNodeSet,
    ) -> ClusterState {
        let mut collections: BTreeMap<String, CollectionState> = BTreeMap::new();

        for records in node_index.values() {
            for record in records {
                let collection = Self::collection_entry(
                    &mut collections,
                    properties,
                    &record.collection,
                );
                let slice = collection
                    .shards
                    .entry(record.shard.clone())
                    .or_insert_with(|| Slice {
                        properties: properties
                            .slice
                            .get(&record.collection)
                            .and_then(|shards| shards.get(&record.shard))
                            .cloned()
                            .unwrap_or_default(),
                        replicas: Vec::new(),
                    });
                slice.replicas.push(Replica {
                    name: record.name.clone(),
                    core: record.core.clone(),
                    replica_type: record.replica_type,
                    node_name: record.node.clone(),
                    variables: record.variables.clone(),
                });
            }
        }

        // Collections/slices that only have an explicit property entry (no replicas yet) must
        // still appear, so a lookup right after `setCollectionProperties` is stable.
        for collection in properties.collection.keys() {
            Self::collection_entry(&mut collections, properties, collection);
        }
        for (collection, shards) in &properties.slice {
            let entry = Self::collection_entry(&mut collections, properties, collection);
            for (shard, props) in shards {
                entry.shards.entry(shard.clone()).or_insert_with(|| Slice {
                    properties: props.clone(),
                    replicas: Vec::new(),
                });
            }
        }

        ClusterState {
            version: 0,
            live_nodes: live_nodes.clone(),
            collections,
        }
    }

    fn collection_entry<'a>(
        collections: &'a mut BTreeMap<String, CollectionState>,
        properties: &PropertyMaps,
        collection: &str,
    ) -> &'a mut CollectionState {
        collections
            .entry(collection.to_string())
            .or_insert_with(|| CollectionState {
                version: 0,
                policy: DEFAULT_ROUTING_POLICY.to_string(),
                properties: properties
                    .collection
                    .get(collection)
                    .cloned()
                    .unwrap_or_default(),
                shards: BTreeMap::new(),
            })
    }
}
