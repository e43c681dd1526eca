//! Async resource loader.
//!
//! [`ResourceLoader`] owns a producer and exposes the latest
//! [`FetchState`] through a `watch` channel. Every cycle captures a
//! generation number; results from a cycle that has since been
//! superseded by a newer `refetch`/`fetch` or by [`ResourceLoader::reset`]
//! are dropped.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Future returned by a [`Producer`].
pub type ProducerFuture<T> = BoxFuture<'static, Result<T>>;

/// Zero-argument async function producing the loader's data.
pub type Producer<T> = Arc<dyn Fn() -> ProducerFuture<T> + Send + Sync>;

/// Wraps an async closure as a [`Producer`].
pub fn producer<T, F, Fut>(f: F) -> Producer<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Normalized, cloneable error stored in [`FetchState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    message: String,
}

impl ErrorInfo {
    /// Message used when a producer fails without a usable error.
    pub const GENERIC_MESSAGE: &'static str = "An error occurred";

    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error carrying [`Self::GENERIC_MESSAGE`].
    #[must_use]
    pub fn generic() -> Self {
        Self::new(Self::GENERIC_MESSAGE)
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&anyhow::Error> for ErrorInfo {
    fn from(err: &anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Observable state of a [`ResourceLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    /// Last successful result. Kept across later failures.
    pub data: Option<T>,
    /// A cycle is in flight.
    pub loading: bool,
    /// Failure of the most recent settled cycle.
    pub error: Option<ErrorInfo>,
}

impl<T> FetchState<T> {
    /// The reset state: no data, not loading, no error.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    const fn initial(loading: bool) -> Self {
        Self {
            data: None,
            loading,
            error: None,
        }
    }

    /// Settled with data and no error.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Runs a producer and tracks its data, loading flag, and error.
///
/// Must be used from within a tokio runtime: `new` with `auto_fetch`,
/// `refetch`, and `set_producer` spawn tasks.
pub struct ResourceLoader<T> {
    producer: Producer<T>,
    auto_fetch: bool,
    state: watch::Sender<FetchState<T>>,
    generation: Arc<AtomicU64>,
}

impl<T> fmt::Debug for ResourceLoader<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("auto_fetch", &self.auto_fetch)
            .field("state", &*self.state.borrow())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T> ResourceLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a loader. With `auto_fetch` a first cycle starts right away.
    pub fn new(producer: Producer<T>, auto_fetch: bool) -> Self {
        let (state, _) = watch::channel(FetchState::initial(auto_fetch));
        let loader = Self {
            producer,
            auto_fetch,
            state,
            generation: Arc::new(AtomicU64::new(0)),
        };
        if auto_fetch {
            drop(loader.refetch());
        }
        loader
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Whether construction and `set_producer` trigger a fetch.
    #[must_use]
    pub const fn auto_fetch(&self) -> bool {
        self.auto_fetch
    }

    /// Replaces the producer. With `auto_fetch` a new cycle starts.
    pub fn set_producer(&mut self, producer: Producer<T>) {
        self.producer = producer;
        if self.auto_fetch {
            drop(self.refetch());
        }
    }

    /// Starts a cycle on a spawned task and returns its handle.
    ///
    /// `loading` is already `true` when this returns.
    pub fn refetch(&self) -> JoinHandle<()> {
        let ticket = self.begin_cycle();
        let producer = Arc::clone(&self.producer);
        let state = self.state.clone();
        let generation = Arc::clone(&self.generation);
        tokio::spawn(run_cycle(producer, state, generation, ticket))
    }

    /// Runs a cycle to completion on the current task.
    pub async fn fetch(&self) {
        let ticket = self.begin_cycle();
        run_cycle(
            Arc::clone(&self.producer),
            self.state.clone(),
            Arc::clone(&self.generation),
            ticket,
        )
        .await;
    }

    /// Restores `{ data: None, loading: false, error: None }` and
    /// invalidates any in-flight cycle.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = FetchState::idle();
        });
    }

    fn begin_cycle(&self) -> u64 {
        let mut ticket = 0;
        self.state.send_modify(|state| {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
            state.loading = true;
            state.error = None;
        });
        ticket
    }
}

async fn run_cycle<T>(
    producer: Producer<T>,
    state: watch::Sender<FetchState<T>>,
    generation: Arc<AtomicU64>,
    ticket: u64,
) {
    let outcome = AssertUnwindSafe(async move { producer().await })
        .catch_unwind()
        .await;

    let applied = state.send_if_modified(|current| {
        if generation.load(Ordering::SeqCst) != ticket {
            return false;
        }
        match outcome {
            Ok(Ok(data)) => {
                current.data = Some(data);
                current.error = None;
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %format!("{err:#}"), "fetch failed");
                current.error = Some(ErrorInfo::from(&err));
            }
            Err(_) => {
                tracing::warn!("producer panicked");
                current.error = Some(ErrorInfo::generic());
            }
        }
        current.loading = false;
        true
    });

    if !applied {
        tracing::debug!(ticket, "discarding superseded fetch result");
    }
}
