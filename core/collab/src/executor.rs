//! Defer leader-election work to run after a mutator releases the state lock.
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;

use replicore_context::Context;

/// A deferred leader election, over the given collections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionTask {
    pub collections: BTreeSet<String>,

    /// Whether the state must be published before the election runs.
    pub publish_before_electing: bool,
}

/// Submit deferred work so mutators don't have to run it inline.
#[derive(Clone)]
pub struct Executor(Arc<dyn ExecutorBackend>);

impl Executor {
    /// Submit a leader election over `collections` to run after the caller releases the lock.
    pub async fn submit_election(
        &self,
        context: &Context,
        collections: BTreeSet<String>,
        publish_before_electing: bool,
    ) -> Result<()> {
        self.0
            .submit(
                context,
                ElectionTask {
                    collections,
                    publish_before_electing,
                },
            )
            .await
    }
}

impl<T> From<T> for Executor
where
    T: ExecutorBackend + 'static,
{
    fn from(value: T) -> Self {
        Executor(Arc::new(value))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl Executor {
    /// Initialise a new in-memory executor backend fixture for unit tests.
    ///
    /// Submitted tasks are queued rather than run; tests drain them with
    /// [`ExecutorFixture::drain`] and drive the election themselves.
    pub fn fixture() -> (Self, ExecutorFixture) {
        let fixture = ExecutorFixture::default();
        (Executor::from(fixture.clone()), fixture)
    }
}

/// Operations a deferred-work executor backend must implement.
#[async_trait::async_trait]
pub trait ExecutorBackend: Send + Sync {
    /// Submit an [`ElectionTask`] for deferred execution.
    async fn submit(&self, context: &Context, task: ElectionTask) -> Result<()>;
}

/// In-memory implementation of a mock [`Executor`] for unit tests.
///
/// Queues submitted tasks instead of running them, so tests can assert on what was scheduled and
/// replay it deterministically.
#[derive(Clone, Default)]
pub struct ExecutorFixture {
    inner: Arc<Mutex<Vec<ElectionTask>>>,
}

impl ExecutorFixture {
    /// Remove and return every task submitted so far, in submission order.
    pub fn drain(&self) -> Vec<ElectionTask> {
        let mut queue = self
            .inner
            .lock()
            .expect("ExecutorFixture::inner lock poisoned");
        std::mem::take(&mut *queue)
    }
}

#[async_trait::async_trait]
impl ExecutorBackend for ExecutorFixture {
    async fn submit(&self, _: &Context, task: ElectionTask) -> Result<()> {
        self.inner
            .lock()
            .expect("ExecutorFixture::inner lock poisoned")
            .push(task);
        Ok(())
    }
}
