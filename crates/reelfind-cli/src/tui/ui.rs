//! TUI rendering for the home and search screens.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use reelfind_api::tmdb::{Movie, TmdbApi};
use reelfind_core::search::SearchPhase;

use super::state::{AppState, HomeState, ResultsView, Screen, SearchState};

/// Draws the active screen.
pub fn draw<A>(frame: &mut Frame, state: &AppState<A>)
where
    A: TmdbApi + Send + Sync + 'static,
{
    match state.screen {
        Screen::Home => draw_home(frame, &state.home),
        Screen::Search => draw_search(frame, &state.search),
    }
}

/// Draws the home screen.
#[allow(clippy::indexing_slicing)]
fn draw_home(frame: &mut Frame, state: &HomeState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search prompt
            Constraint::Length(3), // trending
            Constraint::Min(5),    // popular list
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    let prompt = Paragraph::new("Search for a movie")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" reelfind "));
    frame.render_widget(prompt, chunks[0]);

    draw_trending(frame, chunks[1], state);
    draw_results(frame, chunks[2], &state.view(), state.cursor);
    draw_footer(
        frame,
        chunks[3],
        "\u{2191}\u{2193}/j/k: move  Enter/o: open in browser  /: search  r: refresh  q: quit",
        None,
    );
}

/// Draws the trending row.
fn draw_trending(frame: &mut Frame, area: Rect, state: &HomeState) {
    let trending = state.trending();
    let mut spans = Vec::new();
    for (i, movie) in trending.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            format!("{}. ", i.saturating_add(1)),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(movie.title.clone()));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "No searches yet",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let row = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Trending Movies "),
    );
    frame.render_widget(row, area);
}

/// Draws the search screen.
#[allow(clippy::indexing_slicing)]
fn draw_search<A>(frame: &mut Frame, state: &SearchState<A>)
where
    A: TmdbApi + Send + Sync + 'static,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(5),    // results
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    let phase = state.phase();
    let title = match phase {
        SearchPhase::Pending => " Search for a movie (typing...) ",
        SearchPhase::Loading => " Search for a movie (searching...) ",
        SearchPhase::Idle | SearchPhase::Ready | SearchPhase::Failed => " Search for a movie ",
    };
    let input = Paragraph::new(state.session.text())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input, chunks[0]);

    draw_results(frame, chunks[1], &state.view(), state.cursor);
    draw_footer(
        frame,
        chunks[2],
        "Type to search  \u{2191}\u{2193}: move  Enter: open in browser  Esc: home  Ctrl-C: quit",
        state.status.as_deref(),
    );
}

/// Draws a results area: loading text, error text, or a movie list.
fn draw_results(frame: &mut Frame, area: Rect, view: &ResultsView, cursor: usize) {
    match view {
        ResultsView::Loading => {
            let text = Paragraph::new("Loading...")
                .style(Style::default().fg(Color::Magenta))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(text, area);
        }
        ResultsView::Error(message) => {
            let text = Paragraph::new(format!("Error: {message}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(text, area);
        }
        ResultsView::List {
            heading,
            movies,
            empty_text,
        } => {
            let block = heading.as_ref().map_or_else(
                || Block::default().borders(Borders::ALL),
                |h| Block::default().borders(Borders::ALL).title(format!(" {h} ")),
            );
            if movies.is_empty() {
                let text = Paragraph::new(*empty_text)
                    .style(Style::default().fg(Color::DarkGray))
                    .block(block);
                frame.render_widget(text, area);
                return;
            }

            let items: Vec<ListItem> = movies
                .iter()
                .enumerate()
                .map(|(i, movie)| movie_item(movie, i == cursor))
                .collect();
            frame.render_widget(List::new(items).block(block), area);
        }
    }
}

/// One list row: title, release year and star rating.
fn movie_item(movie: &Movie, selected: bool) -> ListItem<'static> {
    let marker = if selected { "\u{25b8} " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    ListItem::new(Line::from(vec![
        Span::raw(marker),
        Span::styled(movie.title.clone(), title_style),
        Span::styled(
            format!("  {}", movie.release_year().unwrap_or("-")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("  {}", stars(movie.star_rating())),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(format!(" {:.1}", movie.vote_average)),
    ]))
}

/// Renders a five-star rating as filled and empty stars.
fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    let mut out = "\u{2605}".repeat(filled);
    out.push_str(&"\u{2606}".repeat(5_usize.saturating_sub(filled)));
    out
}

/// Draws the footer with key hints and an optional status line.
fn draw_footer(frame: &mut Frame, area: Rect, help: &str, status: Option<&str>) {
    let line = status.map_or_else(
        || Line::from(String::from(help)),
        |s| {
            Line::from(vec![
                Span::styled(String::from(s), Style::default().fg(Color::Red)),
                Span::raw("  "),
                Span::raw(String::from(help)),
            ])
        },
    );
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        // Arrange & Act & Assert
        assert_eq!(stars(0), "\u{2606}\u{2606}\u{2606}\u{2606}\u{2606}");
        assert_eq!(stars(4), "\u{2605}\u{2605}\u{2605}\u{2605}\u{2606}");
        assert_eq!(stars(9), "\u{2605}\u{2605}\u{2605}\u{2605}\u{2605}");
    }
}
