//! Main loop shared by the home and search screens.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use reelfind_api::appwrite::PopularityStore;
use reelfind_api::tmdb::{Movie, TmdbApi};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::state::{AppState, HomeState, Screen, SearchState, movie_page_url};
use super::ui;
use crate::config::Settings;

/// Idle wait between input polls. Background fetches progress meanwhile.
const TICK: Duration = Duration::from_millis(50);

/// Runs the interactive screens, starting on `start`.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub async fn run_app<A, S>(
    catalog: Arc<A>,
    store: Arc<S>,
    settings: &Settings,
    start: Screen,
) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
    S: PopularityStore + Send + Sync + 'static,
{
    let mut state = AppState {
        screen: start,
        home: HomeState::new(&catalog, &store, &settings.language, settings.trending_limit),
        search: SearchState::new(catalog, &settings.language, settings.debounce),
    };
    let mut recorder = HitRecorder::new(store);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut state, &mut recorder).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
async fn run_event_loop<A, S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState<A>,
    recorder: &mut HitRecorder<S>,
) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
    S: PopularityStore + Send + Sync + 'static,
{
    loop {
        state.search.session.apply_debounced();
        if let Some((term, movie)) = state.search.session.take_settled_hit() {
            drop(recorder.record(term, movie));
        }
        if let Some(outcome) = recorder.latest_outcome() {
            state.search.status = outcome.err();
        }

        terminal
            .draw(|frame| ui::draw(frame, state))
            .context("failed to draw TUI")?;

        if !event::poll(Duration::ZERO).context("failed to poll events")? {
            tokio::time::sleep(TICK).await;
            continue;
        }
        if let Event::Key(key) = event::read().context("failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            let quit = match state.screen {
                Screen::Home => handle_home_input(state, key.code, key.modifiers),
                Screen::Search => handle_search_input(state, key.code, key.modifiers),
            };
            if quit {
                return Ok(());
            }
        }
    }
}

/// Records search hits on background tasks and collects the outcomes.
struct HitRecorder<S> {
    store: Arc<S>,
    tx: mpsc::UnboundedSender<Result<(), String>>,
    rx: mpsc::UnboundedReceiver<Result<(), String>>,
}

impl<S> HitRecorder<S>
where
    S: PopularityStore + Send + Sync + 'static,
{
    fn new(store: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { store, tx, rx }
    }

    /// Starts recording a hit. The outcome arrives via [`Self::latest_outcome`].
    fn record(&self, term: String, movie: Movie) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = record_hit(store.as_ref(), &term, &movie)
                .await
                .map_or(Ok(()), Err);
            if tx.send(outcome).is_err() {
                tracing::debug!(term, "screen closed before hit was recorded");
            }
        })
    }

    /// Drains finished writes and returns the newest outcome, if any
    /// finished since the last call. `Err` holds a status line.
    fn latest_outcome(&mut self) -> Option<Result<(), String>> {
        let mut latest = None;
        while let Ok(outcome) = self.rx.try_recv() {
            latest = Some(outcome);
        }
        latest
    }
}

/// Records a search hit. Returns a status message on failure.
async fn record_hit<S>(store: &S, term: &str, movie: &Movie) -> Option<String>
where
    S: PopularityStore + Sync,
{
    match store.record_search_hit(term, movie).await {
        Ok(()) => {
            tracing::debug!(term, movie_id = movie.id, "recorded search hit");
            None
        }
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "failed to record search hit");
            Some(format!("Failed to record search: {e:#}"))
        }
    }
}

/// Handles key input on the home screen. Returns `true` to quit.
fn handle_home_input<A>(state: &mut AppState<A>, key: KeyCode, modifiers: KeyModifiers) -> bool
where
    A: TmdbApi + Send + Sync + 'static,
{
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Up | KeyCode::Char('k') => state.home.move_up(),
        KeyCode::Down | KeyCode::Char('j') => state.home.move_down(),
        KeyCode::Enter | KeyCode::Char('o') => {
            open_movie_page(state.home.selected().map(|m| m.id));
        }
        KeyCode::Char('/' | 's') => state.show(Screen::Search),
        KeyCode::Char('r') => state.home.refresh(),
        _ => {}
    }
    false
}

/// Handles key input on the search screen. Returns `true` to quit.
fn handle_search_input<A>(state: &mut AppState<A>, key: KeyCode, modifiers: KeyModifiers) -> bool
where
    A: TmdbApi + Send + Sync + 'static,
{
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Esc => state.show(Screen::Home),
        KeyCode::Up => state.search.move_up(),
        KeyCode::Down => state.search.move_down(),
        KeyCode::Enter => open_movie_page(state.search.selected().map(|m| m.id)),
        KeyCode::Backspace => state.search.pop_char(),
        KeyCode::Char(c) => state.search.push_char(c),
        _ => {}
    }
    false
}

/// Opens the TMDB page of a movie in the browser.
fn open_movie_page(movie_id: Option<u64>) {
    let Some(movie_id) = movie_id else {
        return;
    };
    let url = movie_page_url(movie_id);
    if let Err(e) = open::that(&url) {
        tracing::debug!(url = %url, error = %e, "failed to open browser");
    }
}
