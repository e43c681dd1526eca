//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 endpoints
//! and retrieves movie listings, search results, and details.

mod api;
mod catalog;
mod client;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
pub use catalog::fetch_movies;
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    DiscoverMovieParams, Movie, POSTER_BASE_URL, POSTER_PLACEHOLDER_URL, SearchMovieParams,
    TmdbGenre, TmdbMovieDetails, TmdbMovieListResponse,
};
