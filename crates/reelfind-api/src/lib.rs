//! API client library for reelfind.
//!
//! Provides clients for the TMDB catalog API and the Appwrite
//! TablesDB service used as a search popularity store.

/// Appwrite TablesDB popularity store client.
pub mod appwrite;

/// TMDB API client.
pub mod tmdb;
