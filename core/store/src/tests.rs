use replicore_context::Context;

use crate::StateManager;
use crate::VERSION_MISSING;

#[tokio::test]
async fn create_then_update() {
    let context = Context::fixture();
    let state = StateManager::fixture();

    let version = state
        .set_data(&context, "CLUSTER_STATE", b"v1".to_vec(), VERSION_MISSING)
        .await
        .unwrap();
    assert_eq!(version, 0);

    let record = state
        .get_data(&context, "CLUSTER_STATE")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.data, b"v1");
    assert_eq!(record.version, 0);

    let version = state
        .set_data(&context, "CLUSTER_STATE", b"v2".to_vec(), 0)
        .await
        .unwrap();
    assert_eq!(version, 1);
}

#[tokio::test]
async fn reject_stale_version() {
    let context = Context::fixture();
    let state = StateManager::fixture();

    state
        .set_data(&context, "CLUSTER_STATE", b"v1".to_vec(), VERSION_MISSING)
        .await
        .unwrap();
    let error = state
        .set_data(&context, "CLUSTER_STATE", b"v2".to_vec(), VERSION_MISSING)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("version conflict"));
}

#[tokio::test]
async fn missing_path_returns_none() {
    let context = Context::fixture();
    let state = StateManager::fixture();
    let record = state.get_data(&context, "CLUSTER_PROPS").await.unwrap();
    assert!(record.is_none());
}
