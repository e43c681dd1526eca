//! Catalog-level movie listing on top of `TmdbApi`.

use anyhow::{Context, Result};
use tracing::instrument;

use super::api::TmdbApi;
use super::types::{DiscoverMovieParams, Movie, SearchMovieParams};

/// Fetches a movie list from the catalog.
///
/// An absent or blank `query` lists popular movies (`discover/movie`
/// sorted by `popularity.desc`); anything else runs a text search
/// with the trimmed query.
///
/// # Errors
///
/// Returns an error if the underlying API request fails.
#[instrument(skip(api))]
pub async fn fetch_movies<A>(api: &A, query: Option<&str>, language: &str) -> Result<Vec<Movie>>
where
    A: TmdbApi + Sync,
{
    let term = query.map(str::trim).filter(|q| !q.is_empty());

    let response = if let Some(term) = term {
        let params = SearchMovieParams::new(term).language(language);
        api.search_movie(&params)
            .await
            .with_context(|| format!("failed to search movies for {term:?}"))?
    } else {
        let params = DiscoverMovieParams::default().language(language);
        api.discover_movies(&params)
            .await
            .context("failed to discover popular movies")?
    };

    tracing::debug!(count = response.results.len(), "fetched movies");
    Ok(response.results)
}
