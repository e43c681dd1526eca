//! Popularity store selection.

use anyhow::{Context, Result};
use reelfind_api::appwrite::{
    AppwriteClient, InMemoryPopularityStore, PopularityStore, TrendingMovie,
};
use reelfind_api::tmdb::Movie;
use url::Url;

use crate::config::AppwriteSettings;

/// Backend behind the `PopularityStore` used by commands and screens.
#[derive(Debug)]
pub enum StoreBackend {
    /// Appwrite TablesDB.
    Appwrite(AppwriteClient),
    /// Process-local table, used when Appwrite is not configured.
    Memory(InMemoryPopularityStore),
}

impl StoreBackend {
    /// Connects to Appwrite when configured, otherwise falls back to memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the client fails to build.
    pub fn from_settings(settings: Option<&AppwriteSettings>, user_agent: &str) -> Result<Self> {
        let Some(aw) = settings else {
            tracing::debug!("Appwrite not configured, using in-memory popularity store");
            return Ok(Self::Memory(InMemoryPopularityStore::new()));
        };

        let endpoint = Url::parse(&aw.endpoint)
            .with_context(|| format!("invalid APPWRITE_ENDPOINT: {}", aw.endpoint))?;
        let mut builder = AppwriteClient::builder()
            .endpoint(endpoint)
            .project_id(&aw.project_id)
            .database_id(&aw.database_id)
            .table_id(&aw.table_id)
            .user_agent(user_agent);
        if let Some(key) = &aw.api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().context("failed to build Appwrite client")?;
        Ok(Self::Appwrite(client))
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Appwrite(_) => "appwrite",
            Self::Memory(_) => "memory",
        }
    }
}

impl PopularityStore for StoreBackend {
    async fn record_search_hit(&self, term: &str, movie: &Movie) -> Result<()> {
        match self {
            Self::Appwrite(client) => client.record_search_hit(term, movie).await,
            Self::Memory(store) => store.record_search_hit(term, movie).await,
        }
    }

    async fn top_trending(&self, limit: u32) -> Vec<TrendingMovie> {
        match self {
            Self::Appwrite(client) => client.top_trending(limit).await,
            Self::Memory(store) => store.top_trending(limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn settings(endpoint: &str) -> AppwriteSettings {
        AppwriteSettings {
            endpoint: String::from(endpoint),
            project_id: String::from("movies-app"),
            database_id: String::from("main"),
            table_id: String::from("metrics"),
            api_key: None,
        }
    }

    #[test]
    fn test_unconfigured_uses_memory() {
        // Arrange & Act
        let store = StoreBackend::from_settings(None, "reelfind-test").unwrap();

        // Assert
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_configured_uses_appwrite() {
        // Arrange
        let aw = settings("https://cloud.appwrite.io/v1");

        // Act
        let store = StoreBackend::from_settings(Some(&aw), "reelfind-test").unwrap();

        // Assert
        assert_eq!(store.name(), "appwrite");
    }

    #[test]
    fn test_invalid_endpoint_fails() {
        // Arrange
        let aw = settings("not a url");

        // Act
        let err = StoreBackend::from_settings(Some(&aw), "reelfind-test").unwrap_err();

        // Assert
        assert!(err.to_string().contains("invalid APPWRITE_ENDPOINT"));
    }

    #[tokio::test]
    async fn test_memory_backend_records_and_ranks() {
        // Arrange
        let store = StoreBackend::from_settings(None, "reelfind-test").unwrap();
        let movie = Movie {
            id: 438_631,
            title: String::from("Dune"),
            poster_path: None,
            vote_average: 7.8,
            release_date: None,
        };

        // Act
        store.record_search_hit("dune", &movie).await.unwrap();
        store.record_search_hit("dune", &movie).await.unwrap();
        let trending = store.top_trending(5).await;

        // Assert
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].count, 2);
        assert_eq!(trending[0].movie_id, 438_631);
    }
}
