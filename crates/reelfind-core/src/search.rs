//! Search orchestration: debounced input driving a catalog loader.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reelfind_api::tmdb::{Movie, TmdbApi, fetch_movies};
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::loader::{FetchState, Producer, ResourceLoader, producer};

/// Quiet period applied to keystrokes before a search starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Where a search session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No query.
    Idle,
    /// Input changed and is waiting for the debounce to settle.
    Pending,
    /// A catalog request is in flight.
    Loading,
    /// Results for the current query are available.
    Ready,
    /// The last request for the current query failed.
    Failed,
}

/// Search-as-you-type session over a catalog.
///
/// Raw input goes through a [`Debouncer`]; each new stabilized value
/// either resets the loader (blank after trimming) or re-binds it to
/// the trimmed query and refetches.
#[derive(Debug)]
pub struct SearchSession<A> {
    catalog: Arc<A>,
    language: String,
    text: String,
    debouncer: Debouncer<String>,
    debounced: watch::Receiver<String>,
    query: String,
    loader: ResourceLoader<Vec<Movie>>,
    recorded: Option<String>,
}

impl<A> SearchSession<A>
where
    A: TmdbApi + Send + Sync + 'static,
{
    /// Creates a session with the default 500 ms debounce.
    pub fn new(catalog: Arc<A>, language: impl Into<String>) -> Self {
        Self::with_delay(catalog, language, DEFAULT_DEBOUNCE)
    }

    /// Creates a session with a custom debounce delay.
    pub fn with_delay(catalog: Arc<A>, language: impl Into<String>, delay: Duration) -> Self {
        let language = language.into();
        let debouncer = Debouncer::new(String::new(), delay);
        let debounced = debouncer.subscribe();
        let loader = ResourceLoader::new(bind_query(&catalog, &language, ""), false);
        Self {
            catalog,
            language,
            text: String::new(),
            debouncer,
            debounced,
            query: String::new(),
            loader,
            recorded: None,
        }
    }

    /// Feeds the raw input text.
    pub fn input(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.debouncer.set(self.text.clone());
    }

    /// Changes the debounce delay.
    pub fn set_delay(&mut self, delay: Duration) {
        self.debouncer.set_delay(delay);
    }

    /// Raw input text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Trimmed query the loader is currently bound to.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Applies a newly debounced value, if any. Returns `true` if one
    /// was applied. Never blocks.
    pub fn apply_debounced(&mut self) -> bool {
        if !self.debounced.has_changed().unwrap_or(false) {
            return false;
        }
        let value = self.debounced.borrow_and_update().clone();
        self.apply(&value);
        true
    }

    /// Waits for the next debounced value and applies it.
    ///
    /// # Errors
    ///
    /// Returns an error if the debouncer has been dropped.
    pub async fn next_debounced(&mut self) -> Result<()> {
        self.debounced
            .changed()
            .await
            .context("debounced input closed")?;
        let value = self.debounced.borrow_and_update().clone();
        self.apply(&value);
        Ok(())
    }

    fn apply(&mut self, value: &str) {
        let query = value.trim();
        self.query = query.to_owned();
        self.recorded = None;

        if query.is_empty() {
            tracing::debug!("query cleared");
            self.loader.reset();
            return;
        }

        tracing::debug!(query, "searching");
        self.loader
            .set_producer(bind_query(&self.catalog, &self.language, query));
        drop(self.loader.refetch());
    }

    /// Current phase, derived from the input and the loader state.
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        if self.text.trim() != self.query {
            return SearchPhase::Pending;
        }
        if self.query.is_empty() {
            return SearchPhase::Idle;
        }

        let state = self.loader.state();
        if state.loading {
            SearchPhase::Loading
        } else if state.error.is_some() {
            SearchPhase::Failed
        } else {
            SearchPhase::Ready
        }
    }

    /// Snapshot of the loader state.
    #[must_use]
    pub fn state(&self) -> FetchState<Vec<Movie>> {
        self.loader.state()
    }

    /// Movies currently held by the loader.
    #[must_use]
    pub fn movies(&self) -> Vec<Movie> {
        self.loader.state().data.unwrap_or_default()
    }

    /// Subscribes to loader state transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<FetchState<Vec<Movie>>> {
        self.loader.subscribe()
    }

    /// Returns the query and its top movie the first time results for
    /// the current query are ready.
    pub fn take_settled_hit(&mut self) -> Option<(String, Movie)> {
        let already = self.recorded.as_deref() == Some(self.query.as_str());
        if already || self.phase() != SearchPhase::Ready {
            return None;
        }
        let top = self.movies().into_iter().next()?;
        self.recorded = Some(self.query.clone());
        Some((self.query.clone(), top))
    }
}

fn bind_query<A>(catalog: &Arc<A>, language: &str, query: &str) -> Producer<Vec<Movie>>
where
    A: TmdbApi + Send + Sync + 'static,
{
    let catalog = Arc::clone(catalog);
    let language = language.to_owned();
    let query = query.to_owned();
    producer(move || {
        let catalog = Arc::clone(&catalog);
        let language = language.clone();
        let query = query.clone();
        async move { fetch_movies(catalog.as_ref(), Some(&query), &language).await }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::bail;
    use reelfind_api::tmdb::{
        DiscoverMovieParams, SearchMovieParams, TmdbMovieDetails, TmdbMovieListResponse,
    };

    use super::*;

    /// Catalog that echoes the query as a single movie title.
    #[derive(Debug, Default)]
    struct FakeCatalog {
        calls: Mutex<Vec<String>>,
        delays: HashMap<String, Duration>,
    }

    impl FakeCatalog {
        fn slow(mut self, query: &str, delay: Duration) -> Self {
            self.delays.insert(String::from(query), delay);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TmdbApi for FakeCatalog {
        async fn discover_movies(
            &self,
            _params: &DiscoverMovieParams,
        ) -> Result<TmdbMovieListResponse> {
            bail!("discover not expected")
        }

        async fn search_movie(&self, params: &SearchMovieParams) -> Result<TmdbMovieListResponse> {
            self.calls.lock().unwrap().push(params.query.clone());
            if let Some(delay) = self.delays.get(&params.query) {
                tokio::time::sleep(*delay).await;
            }
            if params.query.starts_with("err") {
                bail!("API request failed: 500 Internal Server Error");
            }
            Ok(TmdbMovieListResponse {
                page: 1,
                results: vec![Movie {
                    id: 1,
                    title: params.query.clone(),
                    poster_path: None,
                    vote_average: 7.0,
                    release_date: None,
                }],
                total_pages: 1,
                total_results: 1,
            })
        }

        async fn movie_details(&self, _movie_id: u64, _language: &str) -> Result<TmdbMovieDetails> {
            bail!("details not expected")
        }
    }

    fn session(catalog: &Arc<FakeCatalog>) -> SearchSession<FakeCatalog> {
        SearchSession::new(Arc::clone(catalog), "en-US")
    }

    async fn settle(session: &SearchSession<FakeCatalog>) {
        session
            .subscribe_state()
            .wait_for(|s| !s.loading)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_fetches_once() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);

        // Act
        session.input("b");
        tokio::time::sleep(Duration::from_millis(40)).await;
        session.input("ba");
        tokio::time::sleep(Duration::from_millis(40)).await;
        session.input("bat");
        session.next_debounced().await.unwrap();
        settle(&session).await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        // Assert
        assert_eq!(catalog.calls(), vec![String::from("bat")]);
        assert_eq!(session.phase(), SearchPhase::Ready);
        assert_eq!(session.movies()[0].title, "bat");
        assert!(!session.apply_debounced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_moves_pending_loading_ready() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default().slow("dune", Duration::from_millis(100)));
        let mut session = session(&catalog);

        // Act
        session.input("dune");
        let pending = session.phase();
        session.next_debounced().await.unwrap();
        let loading = session.phase();
        settle(&session).await;
        let ready = session.phase();

        // Assert
        assert_eq!(pending, SearchPhase::Pending);
        assert_eq!(loading, SearchPhase::Loading);
        assert_eq!(ready, SearchPhase::Ready);
        assert_eq!(session.query(), "dune");
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_only_input_stays_idle() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);

        // Act
        session.input("   ");
        let before = session.phase();
        session.next_debounced().await.unwrap();

        // Assert
        assert_eq!(before, SearchPhase::Idle);
        assert_eq!(session.phase(), SearchPhase::Idle);
        assert_eq!(session.state(), FetchState::idle());
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_before_debounce_never_fetches() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);

        // Act
        session.input("batman");
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.input("");
        tokio::time::sleep(Duration::from_millis(600)).await;
        let applied = session.apply_debounced();

        // Assert
        assert!(!applied);
        assert!(catalog.calls().is_empty());
        assert_eq!(session.state(), FetchState::idle());
        assert_eq!(session.phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_after_results_resets_loader() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);
        session.input("bat");
        session.next_debounced().await.unwrap();
        settle(&session).await;

        // Act
        session.input("batman");
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.input("");
        session.next_debounced().await.unwrap();

        // Assert
        assert_eq!(catalog.calls(), vec![String::from("bat")]);
        assert_eq!(session.state(), FetchState::idle());
        assert_eq!(session.phase(), SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_ready_query_is_pending_until_debounced() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);
        session.input("bat");
        session.next_debounced().await.unwrap();
        settle(&session).await;
        assert_eq!(session.phase(), SearchPhase::Ready);

        // Act
        session.input("   ");
        let cleared = session.phase();
        let hit = session.take_settled_hit();
        tokio::time::sleep(Duration::from_millis(600)).await;
        let applied = session.apply_debounced();

        // Assert
        assert_eq!(cleared, SearchPhase::Pending);
        assert!(hit.is_none());
        assert!(applied);
        assert_eq!(session.phase(), SearchPhase::Idle);
        assert_eq!(session.state(), FetchState::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_is_trimmed_before_search() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);

        // Act
        session.input("  alien ");
        session.next_debounced().await.unwrap();
        settle(&session).await;

        // Assert
        assert_eq!(catalog.calls(), vec![String::from("alien")]);
        assert_eq!(session.query(), "alien");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_search_reports_error() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);

        // Act
        session.input("error");
        session.next_debounced().await.unwrap();
        settle(&session).await;

        // Assert
        assert_eq!(session.phase(), SearchPhase::Failed);
        let message = session.state().error.unwrap().message().to_owned();
        assert!(message.contains("500 Internal Server Error"));
        assert!(session.take_settled_hit().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_search_result_is_discarded() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default().slow("dune", Duration::from_secs(1)));
        let mut session = session(&catalog);
        session.input("dune");
        session.next_debounced().await.unwrap();

        // Act
        session.input("dune 2");
        session.next_debounced().await.unwrap();
        settle(&session).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Assert
        assert_eq!(
            catalog.calls(),
            vec![String::from("dune"), String::from("dune 2")]
        );
        assert_eq!(session.movies()[0].title, "dune 2");
        assert_eq!(session.phase(), SearchPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_hit_taken_once_per_query() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);
        session.input("batman");
        session.next_debounced().await.unwrap();
        settle(&session).await;

        // Act
        let first = session.take_settled_hit();
        let second = session.take_settled_hit();

        // Assert
        let (term, movie) = first.unwrap();
        assert_eq!(term, "batman");
        assert_eq!(movie.title, "batman");
        assert!(second.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_hit_while_pending() {
        // Arrange
        let catalog = Arc::new(FakeCatalog::default());
        let mut session = session(&catalog);
        session.input("bat");
        session.next_debounced().await.unwrap();
        settle(&session).await;

        // Act
        session.input("batman");
        let hit = session.take_settled_hit();

        // Assert
        assert_eq!(session.phase(), SearchPhase::Pending);
        assert!(hit.is_none());
    }
}
