//! Trailing-edge debouncer built on tokio timers.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Emits the latest source value once it has been stable for `delay`.
///
/// Each [`set`](Self::set) aborts the pending timer task and spawns a
/// new one, so at most one timer is pending and superseded values are
/// never emitted. Emission always happens on the spawned task, even
/// with a zero delay. Dropping the debouncer aborts the pending timer.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer<T> {
    /// Latest value passed to `set`.
    source: T,
    /// Quiet period before emission.
    delay: Duration,
    /// Emitted value.
    emitted: watch::Sender<T>,
    /// Timer task for the latest source value.
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a debouncer whose emitted value starts at `initial`.
    #[must_use]
    pub fn new(initial: T, delay: Duration) -> Self {
        let (emitted, _) = watch::channel(initial.clone());
        Self {
            source: initial,
            delay,
            emitted,
            pending: None,
        }
    }

    /// Replaces the source value and restarts the quiet period.
    pub fn set(&mut self, value: T) {
        self.source = value;
        self.schedule();
    }

    /// Changes the delay and restarts the quiet period for the
    /// current source value. No-op if the delay is unchanged.
    pub fn set_delay(&mut self, delay: Duration) {
        if delay != self.delay {
            self.delay = delay;
            self.schedule();
        }
    }

    /// Drops the pending timer without emitting.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Returns `true` while a timer is waiting to emit.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Latest value passed to `set`.
    #[must_use]
    pub const fn source(&self) -> &T {
        &self.source
    }

    /// Currently emitted value.
    #[must_use]
    pub fn current(&self) -> T {
        self.emitted.borrow().clone()
    }

    /// Current quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Subscribes to emitted values.
    ///
    /// The receiver is notified only when the emitted value actually
    /// changes; re-emitting an equal value is not an update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.emitted.subscribe()
    }

    fn schedule(&mut self) {
        self.cancel();

        let value = self.source.clone();
        let delay = self.delay;
        let emitted = self.emitted.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            emitted.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            });
        }));
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
