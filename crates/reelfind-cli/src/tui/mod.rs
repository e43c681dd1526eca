//! TUI module for the interactive home and search screens.
//!
//! Uses `ratatui` + `crossterm` for rendering.

mod app;
/// Screen state types.
pub mod state;
mod ui;

pub use app::run_app;
pub use state::Screen;
