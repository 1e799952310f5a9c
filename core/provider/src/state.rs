//! Structural state guarded by the provider's single state lock.
use std::collections::BTreeMap;

use replicore_cluster_models::LiveNodeSet;
use replicore_cluster_models::NodeIndex;
use replicore_cluster_models::PropertyMap;
use replicore_cluster_models::PropertyMaps;
use replicore_cluster_view::ClusterState;
use replicore_store::VERSION_MISSING;

/// Everything `stateLock` guards: the authoritative maps, plus the last-published caches used
/// to make `publishState`/`publishClusterProperties` idempotent.
pub(crate) struct ProviderState {
    pub(crate) node_index: NodeIndex,
    pub(crate) properties: PropertyMaps,
    pub(crate) live_nodes: LiveNodeSet,

    /// Per-collection high-water mark for core-name sequence numbers, so `moveReplica` can mint
    /// a core name that never collides with one handed out by `createCollection`.
    pub(crate) core_sequence: BTreeMap<String, u32>,

    pub(crate) published_state: Option<ClusterState>,
    pub(crate) published_state_version: i64,
    pub(crate) published_props: Option<PropertyMap>,
    pub(crate) published_props_version: i64,
}

impl Default for ProviderState {
    fn default() -> Self {
        ProviderState {
            node_index: NodeIndex::new(),
            properties: PropertyMaps::default(),
            live_nodes: LiveNodeSet::new(),
            core_sequence: BTreeMap::new(),
            published_state: None,
            published_state_version: VERSION_MISSING,
            published_props: None,
            published_props_version: VERSION_MISSING,
        }
    }
}
