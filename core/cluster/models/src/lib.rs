//! Data model for the simulated cluster state provider.
//!
//! [`ReplicaRecord`] is the authoritative, mutable entity the provider owns; everything else
//! about a replica (its `state`, its `leader` flag, and any other ad-hoc attribute) lives in its
//! `variables` bag. This mirrors how the production coordination service stores replica
//! properties as a loosely structured bag rather than a rigid record.
use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map as JsonMap;
use serde_json::Value as Json;

mod replica;

pub use self::replica::ReplicaRecord;
pub use self::replica::ReplicaState;
pub use self::replica::ReplicaType;

/// Well-known `variables` key recording a replica's [`ReplicaState`].
pub const VAR_STATE: &str = "state";

/// Well-known `variables` key recording whether a replica is the shard leader.
pub const VAR_LEADER: &str = "leader";

/// Arbitrary string-keyed property bag, used for cluster/collection/slice properties and for
/// the unstructured part of a [`ReplicaRecord`].
pub type PropertyMap = JsonMap<String, Json>;

/// Authoritative store of every live replica, indexed by the node that hosts it.
///
/// Ordered so builder output and published snapshots are deterministic.
pub type NodeIndex = BTreeMap<String, Vec<ReplicaRecord>>;

/// Set of node identities currently considered live.
pub type LiveNodeSet = BTreeSet<String>;

/// Ordered nested property maps: cluster-wide, per-collection, and per-collection/per-slice.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyMaps {
    /// Singleton cluster-wide property map.
    pub cluster: PropertyMap,

    /// Per-collection property maps.
    pub collection: BTreeMap<String, PropertyMap>,

    /// Per-collection, per-shard property maps.
    pub slice: BTreeMap<String, BTreeMap<String, PropertyMap>>,
}

impl PropertyMaps {
    /// Drop every property entry (cluster properties excluded) belonging to `collection`.
    pub fn forget_collection(&mut self, collection: &str) {
        self.collection.remove(collection);
        self.slice.remove(collection);
    }

    /// Drop every collection and slice property entry, keeping cluster properties.
    pub fn forget_all_collections(&mut self) {
        self.collection.clear();
        self.slice.clear();
    }
}
