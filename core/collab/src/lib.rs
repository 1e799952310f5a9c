//! Interfaces to the simulator's external collaborators.
//!
//! The simulated cluster state provider never talks to real infrastructure. It only needs the
//! shape of its collaborators so the mutator API and the leader elector can be exercised
//! regardless of which backend eventually serves them. Each collaborator follows the same
//! shape: a public, cheaply cloneable wrapper around `Arc<dyn ...Backend>`, plus an in-memory
//! fixture for tests.
mod executor;
mod id_assign;
mod node_state;
mod placement;
mod time;

#[cfg(test)]
mod tests;

pub use self::executor::ElectionTask;
pub use self::executor::Executor;
pub use self::executor::ExecutorBackend;
pub use self::id_assign::IdAssigner;
pub use self::id_assign::IdAssignerBackend;
pub use self::node_state::NodeStateProvider;
pub use self::node_state::NodeStateProviderBackend;
pub use self::node_state::CORES_KEY;
pub use self::placement::PlacementEngine;
pub use self::placement::PlacementEngineBackend;
pub use self::placement::ReplicaPosition;
pub use self::time::SystemTimeSource;
pub use self::time::TimeSource;
pub use self::time::TimeSourceBackend;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::executor::ExecutorFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::id_assign::IdAssignerFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::node_state::NodeStateProviderFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::placement::PlacementEngineFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::time::TimeSourceFixture;
