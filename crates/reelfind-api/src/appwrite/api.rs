//! `PopularityStore` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::TrendingMovie;
use crate::tmdb::Movie;

/// Number of rows returned by `top_trending` when no limit is given.
pub const DEFAULT_TRENDING_LIMIT: u32 = 5;

/// Search popularity store.
///
/// Abstracts the hosted table store so it can be replaced by
/// `InMemoryPopularityStore` in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(PopularityStore: Send)]
pub trait LocalPopularityStore {
    /// Records that `term` was searched and led to `movie`.
    ///
    /// Increments the counter of the row whose `search_term` equals
    /// `term` exactly, or creates a row with `count = 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    async fn record_search_hit(&self, term: &str, movie: &Movie) -> Result<()>;

    /// Returns up to `limit` rows ordered by `count` descending.
    ///
    /// Read failures are logged and yield an empty list.
    async fn top_trending(&self, limit: u32) -> Vec<TrendingMovie>;
}
