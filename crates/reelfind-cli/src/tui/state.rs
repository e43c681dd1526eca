//! Screen state for the home and search screens.

use std::sync::Arc;
use std::time::Duration;

use reelfind_api::appwrite::{PopularityStore, TrendingMovie};
use reelfind_api::tmdb::{Movie, TmdbApi, fetch_movies};
use reelfind_core::loader::{FetchState, ResourceLoader, producer};
use reelfind_core::search::{SearchPhase, SearchSession};

/// TMDB movie page base URL.
const MOVIE_PAGE_BASE_URL: &str = "https://www.themoviedb.org/movie";

/// Returns the TMDB web page for a movie.
#[must_use]
pub fn movie_page_url(movie_id: u64) -> String {
    format!("{MOVIE_PAGE_BASE_URL}/{movie_id}")
}

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Popular movies and the trending row.
    Home,
    /// Search-as-you-type.
    Search,
}

/// What the results area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    /// A request is in flight.
    Loading,
    /// The last request failed.
    Error(String),
    /// A movie list, possibly empty.
    List {
        /// Heading above the list.
        heading: Option<String>,
        /// Movies to show.
        movies: Vec<Movie>,
        /// Text shown when `movies` is empty.
        empty_text: &'static str,
    },
}

impl ResultsView {
    /// Movies in the list, empty for the other views.
    #[must_use]
    pub fn movies(&self) -> &[Movie] {
        match self {
            Self::List { movies, .. } => movies,
            Self::Loading | Self::Error(_) => &[],
        }
    }
}

/// Moves a list cursor up, saturating at the top.
const fn cursor_up(cursor: usize) -> usize {
    cursor.saturating_sub(1)
}

/// Moves a list cursor down, saturating at the last item.
const fn cursor_down(cursor: usize, len: usize) -> usize {
    if cursor.saturating_add(1) < len {
        cursor.saturating_add(1)
    } else {
        cursor
    }
}

/// Home screen: popular movies plus the trending row.
#[derive(Debug)]
pub struct HomeState {
    /// Popular movies, fetched on open.
    pub popular: ResourceLoader<Vec<Movie>>,
    /// Most searched movies, fetched on open and on every return.
    pub trending: ResourceLoader<Vec<TrendingMovie>>,
    /// Cursor in the popular list.
    pub cursor: usize,
}

impl HomeState {
    /// Creates the home state and starts both fetches.
    pub fn new<A, S>(catalog: &Arc<A>, store: &Arc<S>, language: &str, trending_limit: u32) -> Self
    where
        A: TmdbApi + Send + Sync + 'static,
        S: PopularityStore + Send + Sync + 'static,
    {
        let catalog = Arc::clone(catalog);
        let language = String::from(language);
        let popular = ResourceLoader::new(
            producer(move || {
                let catalog = Arc::clone(&catalog);
                let language = language.clone();
                async move { fetch_movies(catalog.as_ref(), None, &language).await }
            }),
            true,
        );

        let store = Arc::clone(store);
        let trending = ResourceLoader::new(
            producer(move || {
                let store = Arc::clone(&store);
                async move { Ok(store.top_trending(trending_limit).await) }
            }),
            true,
        );

        Self {
            popular,
            trending,
            cursor: 0,
        }
    }

    /// Refetches the trending row.
    pub fn focus(&self) {
        drop(self.trending.refetch());
    }

    /// Refetches everything.
    pub fn refresh(&self) {
        drop(self.popular.refetch());
        drop(self.trending.refetch());
    }

    /// Results area view.
    #[must_use]
    pub fn view(&self) -> ResultsView {
        let state = self.popular.state();
        if state.loading {
            return ResultsView::Loading;
        }
        if let Some(err) = state.error {
            return ResultsView::Error(String::from(err.message()));
        }
        ResultsView::List {
            heading: Some(String::from("Latest Movies")),
            movies: state.data.unwrap_or_default(),
            empty_text: "No movies found",
        }
    }

    /// Trending movies currently held.
    #[must_use]
    pub fn trending(&self) -> Vec<TrendingMovie> {
        self.trending.state().data.unwrap_or_default()
    }

    /// Movie under the cursor.
    #[must_use]
    pub fn selected(&self) -> Option<Movie> {
        self.view().movies().get(self.cursor).cloned()
    }

    /// Moves the cursor up.
    pub const fn move_up(&mut self) {
        self.cursor = cursor_up(self.cursor);
    }

    /// Moves the cursor down.
    pub fn move_down(&mut self) {
        self.cursor = cursor_down(self.cursor, self.view().movies().len());
    }
}

/// Search screen: a search session and a cursor.
#[derive(Debug)]
pub struct SearchState<A> {
    /// Debounced search session.
    pub session: SearchSession<A>,
    /// Cursor in the results list.
    pub cursor: usize,
    /// Last popularity store failure, shown in the footer.
    pub status: Option<String>,
}

impl<A> SearchState<A>
where
    A: TmdbApi + Send + Sync + 'static,
{
    /// Creates an empty search screen.
    pub fn new(catalog: Arc<A>, language: &str, debounce: Duration) -> Self {
        Self {
            session: SearchSession::with_delay(catalog, language, debounce),
            cursor: 0,
            status: None,
        }
    }

    /// Appends a typed character.
    pub fn push_char(&mut self, c: char) {
        let mut text = String::from(self.session.text());
        text.push(c);
        self.session.input(text);
        self.cursor = 0;
    }

    /// Removes the last character.
    pub fn pop_char(&mut self) {
        let mut text = String::from(self.session.text());
        if text.pop().is_some() {
            self.session.input(text);
            self.cursor = 0;
        }
    }

    /// Results area view.
    #[must_use]
    pub fn view(&self) -> ResultsView {
        let FetchState {
            data,
            loading,
            error,
        } = self.session.state();
        if loading {
            return ResultsView::Loading;
        }
        if let Some(err) = error {
            return ResultsView::Error(String::from(err.message()));
        }

        let query = self.session.query();
        if query.is_empty() {
            return ResultsView::List {
                heading: None,
                movies: Vec::new(),
                empty_text: "Start typing to search for movies",
            };
        }
        ResultsView::List {
            heading: Some(format!("Search Results for {query}")),
            movies: data.unwrap_or_default(),
            empty_text: "No movies found",
        }
    }

    /// Current session phase.
    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        self.session.phase()
    }

    /// Movie under the cursor.
    #[must_use]
    pub fn selected(&self) -> Option<Movie> {
        self.view().movies().get(self.cursor).cloned()
    }

    /// Moves the cursor up.
    pub const fn move_up(&mut self) {
        self.cursor = cursor_up(self.cursor);
    }

    /// Moves the cursor down.
    pub fn move_down(&mut self) {
        self.cursor = cursor_down(self.cursor, self.view().movies().len());
    }
}

/// Both screens and which one is active.
#[derive(Debug)]
pub struct AppState<A> {
    /// Active screen.
    pub screen: Screen,
    /// Home screen state.
    pub home: HomeState,
    /// Search screen state.
    pub search: SearchState<A>,
}

impl<A> AppState<A>
where
    A: TmdbApi + Send + Sync + 'static,
{
    /// Switches screens. Returning home refreshes the trending row.
    pub fn show(&mut self, screen: Screen) {
        if screen == Screen::Home && self.screen != Screen::Home {
            self.home.focus();
        }
        self.screen = screen;
    }
}
