//! In-memory implementation of [`StateManager`](super::StateManager) for unit tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use replicore_context::Context;

use super::DataRecord;
use super::StateManagerBackend;
use super::StateManagerError;

/// In-memory implementation of a mock [`StateManager`](super::StateManager) for unit tests.
#[derive(Clone, Default)]
pub struct StateManagerFixture {
    inner: Arc<Mutex<HashMap<&'static str, DataRecord>>>,
}

impl StateManagerFixture {
    fn access(&self) -> MutexGuard<HashMap<&'static str, DataRecord>> {
        self.inner
            .lock()
            .expect("StateManagerFixture::inner lock poisoned")
    }
}

#[async_trait::async_trait]
impl StateManagerBackend for StateManagerFixture {
    async fn get_data(&self, _: &Context, path: &'static str) -> Result<Option<DataRecord>> {
        let store = self.access();
        Ok(store.get(path).cloned())
    }

    async fn set_data(
        &self,
        _: &Context,
        path: &'static str,
        data: Vec<u8>,
        expected_version: i64,
    ) -> Result<i64> {
        let mut store = self.access();
        let actual = store.get(path).map(|record| record.version);
        match (actual, expected_version) {
            (None, super::VERSION_MISSING) => (),
            (Some(actual), expected) if actual == expected => (),
            (actual, expected) => {
                return Err(StateManagerError::VersionConflict {
                    path,
                    expected,
                    actual: actual.unwrap_or(super::VERSION_MISSING),
                }
                .into())
            }
        };

        let version = actual.map(|version| version + 1).unwrap_or(0);
        store.insert(path, DataRecord { data, version });
        Ok(version)
    }
}
