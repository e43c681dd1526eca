//! In-memory `PopularityStore` implementation.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Result, anyhow, bail};

use super::api::PopularityStore;
use super::types::TrendingMovie;
use crate::tmdb::Movie;

/// Popularity store kept in process memory.
///
/// Mirrors the hosted table semantics (exact term match, counter
/// increment, ordering by count) and can be told to fail reads or
/// writes to exercise degraded paths.
#[derive(Debug, Default)]
pub struct InMemoryPopularityStore {
    rows: Mutex<Vec<TrendingMovie>>,
    next_id: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryPopularityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent reads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of all rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> Vec<TrendingMovie> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn try_top_trending(&self, limit: u32) -> Result<Vec<TrendingMovie>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("simulated network error");
        }
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| anyhow!("popularity table lock poisoned"))?
            .clone();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

impl PopularityStore for InMemoryPopularityStore {
    async fn record_search_hit(&self, term: &str, movie: &Movie) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated write failure");
        }
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| anyhow!("popularity table lock poisoned"))?;

        if let Some(row) = rows.iter_mut().find(|r| r.search_term == term) {
            row.count = row.count.saturating_add(1);
            return Ok(());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        rows.push(TrendingMovie {
            row_id: format!("mem-{id}"),
            search_term: String::from(term),
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: movie.poster_url(),
            count: 1,
        });
        Ok(())
    }

    async fn top_trending(&self, limit: u32) -> Vec<TrendingMovie> {
        match self.try_top_trending(limit) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch trending movies");
                Vec::new()
            }
        }
    }
}
