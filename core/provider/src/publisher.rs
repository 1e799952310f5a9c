//! Serialise snapshots and write them to the external state manager.
use anyhow::Result;

use replicore_cluster_view::ClusterStateBuilder;
use replicore_context::Context;
use replicore_store::keys;
use replicore_store::StateManager;

use crate::state::ProviderState;

/// Compute the current snapshot and write it to `CLUSTER_STATE` if it changed since the last
/// successful publish.
pub(crate) async fn publish_state(
    context: &Context,
    distrib_state: &StateManager,
    state: &mut ProviderState,
) -> Result<()> {
    let snapshot =
        ClusterStateBuilder::build(&state.node_index, &state.properties, &state.live_nodes);
    if state.published_state.as_ref() == Some(&snapshot) {
        return Ok(());
    }

    let encoded = serde_json::to_vec(&snapshot)?;
    let version = distrib_state
        .set_data(
            context,
            keys::CLUSTER_STATE,
            encoded,
            state.published_state_version,
        )
        .await?;
    state.published_state_version = version;
    state.published_state = Some(snapshot);
    Ok(())
}

/// Write the cluster-wide property map to `CLUSTER_PROPS` if it changed since the last
/// successful publish.
pub(crate) async fn publish_cluster_properties(
    context: &Context,
    distrib_state: &StateManager,
    state: &mut ProviderState,
) -> Result<()> {
    if state.published_props.as_ref() == Some(&state.properties.cluster) {
        return Ok(());
    }

    let encoded = serde_json::to_vec(&state.properties.cluster)?;
    let version = distrib_state
        .set_data(
            context,
            keys::CLUSTER_PROPS,
            encoded,
            state.published_props_version,
        )
        .await?;
    state.published_props_version = version;
    state.published_props = Some(state.properties.cluster.clone());
    Ok(())
}
