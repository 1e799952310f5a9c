//! A clock the provider and its waiter read time from, real or simulated.
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

/// Read the current time and wait for durations to elapse.
///
/// The waiter (`replicore-waiter`) never reads the wall clock directly so tests can run a whole
/// timeout-bound scenario without actually sleeping.
#[derive(Clone)]
pub struct TimeSource(Arc<dyn TimeSourceBackend>);

impl TimeSource {
    /// Current elapsed time since this source was created.
    pub async fn now(&self) -> Duration {
        self.0.now().await
    }

    /// Wait until at least `duration` has elapsed according to this source.
    pub async fn sleep(&self, duration: Duration) {
        self.0.sleep(duration).await
    }
}

impl<T> From<T> for TimeSource
where
    T: TimeSourceBackend + 'static,
{
    fn from(value: T) -> Self {
        TimeSource(Arc::new(value))
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl TimeSource {
    /// Initialise a new simulated time source fixture for unit tests.
    ///
    /// Unlike the other collaborators, tests need a handle to drive the clock forward, so this
    /// returns both the wrapper and the concrete fixture.
    pub fn fixture() -> (Self, TimeSourceFixture) {
        let fixture = TimeSourceFixture::default();
        (TimeSource::from(fixture.clone()), fixture)
    }
}

/// Operations a clock backend must implement.
#[async_trait::async_trait]
pub trait TimeSourceBackend: Send + Sync {
    /// Current elapsed time since this source was created.
    async fn now(&self) -> Duration;

    /// Wait until at least `duration` has elapsed according to this source.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backend, for the non-test binary.
#[derive(Clone, Copy, Default)]
pub struct SystemTimeSource;

#[async_trait::async_trait]
impl TimeSourceBackend for SystemTimeSource {
    async fn now(&self) -> Duration {
        // Relative to process start is all callers ever need: elapsed time, not wall-clock date.
        static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
        START.get_or_init(std::time::Instant::now).elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated clock for unit tests: time only advances when [`TimeSourceFixture::advance`] is
/// called, never on its own.
#[derive(Clone, Default)]
pub struct TimeSourceFixture {
    elapsed: Arc<Mutex<Duration>>,
    notify: Arc<Notify>,
}

impl TimeSourceFixture {
    /// Move the simulated clock forward by `delta`, waking any pending [`Self::sleep`] calls.
    pub fn advance(&self, delta: Duration) {
        {
            let mut elapsed = self.elapsed.lock().expect("TimeSourceFixture lock poisoned");
            *elapsed += delta;
        }
        self.notify.notify_waiters();
    }
}

#[async_trait::async_trait]
impl TimeSourceBackend for TimeSourceFixture {
    async fn now(&self) -> Duration {
        *self.elapsed.lock().expect("TimeSourceFixture lock poisoned")
    }

    async fn sleep(&self, duration: Duration) {
        let target = self.now().await + duration;
        loop {
            if self.now().await >= target {
                return;
            }
            let notified = self.notify.notified();
            if self.now().await >= target {
                return;
            }
            notified.await;
        }
    }
}
