//! Fixed paths the simulator core publishes snapshots to.

/// Path the current [`ClusterState`](../replicore_cluster_view/struct.ClusterState.html)
/// snapshot is published to.
pub const CLUSTER_STATE: &str = "CLUSTER_STATE";

/// Path the current cluster-wide property map is published to.
pub const CLUSTER_PROPS: &str = "CLUSTER_PROPS";
