//! Interface to the external versioned key-value state manager.
//!
//! Production Replicante Core replicates collection metadata through a coordination service
//! (a hierarchical znode store). The simulator never talks to a real coordination service:
//! it only needs the shape of that interface so publishing code can be exercised the same way
//! regardless of which backend eventually serves it.
//!
//! The interface is intentionally narrow: get a versioned record, set a versioned record with
//! an optimistic compare-and-set check. [`crate::keys`] lists the fixed paths the simulator
//! core ever writes to.
use std::sync::Arc;

use anyhow::Result;

use replicore_context::Context;

pub mod keys;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::StateManagerFixture;

#[cfg(test)]
mod tests;

/// Version to pass to [`StateManager::set_data`] when the path is expected not to exist yet.
pub const VERSION_MISSING: i64 = -1;

/// Errors raised while reading or writing through a [`StateManager`].
#[derive(Debug, thiserror::Error)]
pub enum StateManagerError {
    /// A compare-and-set write did not match the currently stored version.
    #[error("version conflict writing '{path}': expected {expected}, found {actual}")]
    VersionConflict {
        path: &'static str,
        expected: i64,
        actual: i64,
    },
}

/// Record returned by [`StateManager::get_data`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRecord {
    /// Raw bytes stored at the path.
    pub data: Vec<u8>,

    /// Version of the record, for optimistic concurrency control.
    pub version: i64,
}

/// Read and write versioned records in the external state manager.
#[derive(Clone)]
pub struct StateManager(Arc<dyn StateManagerBackend>);

impl StateManager {
    /// Fetch the record stored at `path`, if any.
    pub async fn get_data(
        &self,
        context: &Context,
        path: &'static str,
    ) -> Result<Option<DataRecord>> {
        self.0.get_data(context, path).await
    }

    /// Write `data` at `path`, failing if `expected_version` does not match the stored version.
    ///
    /// Use [`VERSION_MISSING`] as `expected_version` to require the path does not exist yet.
    pub async fn set_data(
        &self,
        context: &Context,
        path: &'static str,
        data: Vec<u8>,
        expected_version: i64,
    ) -> Result<i64> {
        self.0.set_data(context, path, data, expected_version).await
    }
}

impl<T> From<T> for StateManager
where
    T: StateManagerBackend + 'static,
{
    fn from(value: T) -> Self {
        StateManager(Arc::new(value))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl StateManager {
    /// Initialise a new in-memory state manager backend fixture for unit tests.
    pub fn fixture() -> Self {
        StateManager::from(StateManagerFixture::default())
    }
}

/// Operations a versioned key-value state manager backend must implement.
#[async_trait::async_trait]
pub trait StateManagerBackend: Send + Sync {
    /// Fetch the record stored at `path`, if any.
    async fn get_data(&self, context: &Context, path: &'static str) -> Result<Option<DataRecord>>;

    /// Write `data` at `path` with an optimistic version check.
    async fn set_data(
        &self,
        context: &Context,
        path: &'static str,
        data: Vec<u8>,
        expected_version: i64,
    ) -> Result<i64>;
}
