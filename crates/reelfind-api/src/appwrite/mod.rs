//! Appwrite TablesDB popularity store module.
//!
//! Counts how often each search term led to a movie and lists the
//! most searched movies as "trending".

mod api;
mod client;
mod memory;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{DEFAULT_TRENDING_LIMIT, LocalPopularityStore, PopularityStore};
#[allow(clippy::module_name_repetitions)]
pub use client::{AppwriteClient, AppwriteClientBuilder, DEFAULT_ENDPOINT};
pub use memory::InMemoryPopularityStore;
pub use types::{Query, RowList, TrendingMovie};
