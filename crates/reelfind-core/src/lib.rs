//! Search-as-you-type building blocks for reelfind.
//!
//! A [`debounce::Debouncer`] collapses bursts of keystrokes, a
//! [`loader::ResourceLoader`] tracks one async fetch at a time, and
//! [`search::SearchSession`] wires both to the TMDB catalog.

/// Debounced value emitter.
pub mod debounce;
/// Async resource loader with loading/error/data state.
pub mod loader;
/// Search orchestration over the catalog.
pub mod search;
