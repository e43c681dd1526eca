//! `AppwriteClient` - Appwrite TablesDB REST client.

use anyhow::{Context, Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::json;
use tracing::instrument;
use url::Url;

use super::api::PopularityStore;
use super::types::{AppwriteErrorResponse, Query, RowList, TrendingMovie};
use crate::tmdb::Movie;

/// Default Appwrite Cloud endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Asks Appwrite to generate the row ID server side.
const UNIQUE_ROW_ID: &str = "unique()";

/// Appwrite TablesDB client bound to one database table.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AppwriteClient {
    /// HTTP client (project and key headers preset).
    http_client: Client,
    /// Rows collection URL: `{endpoint}/tablesdb/{db}/tables/{table}/rows/`.
    rows_url: Url,
}

/// Builder for `AppwriteClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AppwriteClientBuilder {
    endpoint: Option<Url>,
    project_id: Option<String>,
    database_id: Option<String>,
    table_id: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
}

impl AppwriteClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            endpoint: None,
            project_id: None,
            database_id: None,
            table_id: None,
            api_key: None,
            user_agent: None,
        }
    }

    /// Overrides the API endpoint (default: Appwrite Cloud).
    #[must_use]
    pub fn endpoint(mut self, url: Url) -> Self {
        self.endpoint = Some(url);
        self
    }

    /// Sets the project ID (required).
    #[must_use]
    pub fn project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Sets the database ID (required).
    #[must_use]
    pub fn database_id(mut self, id: impl Into<String>) -> Self {
        self.database_id = Some(id.into());
        self
    }

    /// Sets the table ID (required).
    #[must_use]
    pub fn table_id(mut self, id: impl Into<String>) -> Self {
        self.table_id = Some(id.into());
        self
    }

    /// Sets a server API key, sent as `X-Appwrite-Key`.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `project_id`, `database_id`, `table_id` or `user_agent` is not set.
    /// - A header value contains invalid characters.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<AppwriteClient> {
        let project_id = self.project_id.context("project_id is required")?;
        let database_id = self.database_id.context("database_id is required")?;
        let table_id = self.table_id.context("table_id is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let mut endpoint = if let Some(url) = self.endpoint {
            url
        } else {
            let result = Url::parse(DEFAULT_ENDPOINT);
            result.context("invalid default endpoint")?
        };
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let rows_url = endpoint
            .join(&format!("tablesdb/{database_id}/tables/{table_id}/rows/"))
            .context("failed to build rows URL")?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-appwrite-project",
            HeaderValue::from_str(&project_id).context("invalid project_id header value")?,
        );
        if let Some(key) = self.api_key {
            let mut value = HeaderValue::from_str(&key).context("invalid api_key header value")?;
            value.set_sensitive(true);
            headers.insert("x-appwrite-key", value);
        }

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(AppwriteClient {
            http_client,
            rows_url,
        })
    }
}

impl AppwriteClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> AppwriteClientBuilder {
        AppwriteClientBuilder::new()
    }

    /// Sends a request to the rows collection and decodes the JSON reply.
    ///
    /// `row_id` selects a single row; `None` targets the collection.
    #[instrument(skip_all)]
    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        row_id: Option<&str>,
        queries: &[Query],
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = match row_id {
            Some(id) => self
                .rows_url
                .join(id)
                .with_context(|| format!("failed to join row id: {id}"))?,
            None => {
                let mut url = self.rows_url.clone();
                let path = url.path().trim_end_matches('/').to_owned();
                url.set_path(&path);
                url
            }
        };

        let mut query: Vec<(&str, String)> = Vec::with_capacity(queries.len());
        for q in queries {
            let encoded = q.to_query_string().context("failed to encode query")?;
            query.push(("queries[]", encoded));
        }

        let mut builder = self.http_client.request(method.clone(), url).query(&query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let request = builder.build().context("failed to build request")?;

        tracing::debug!(%method, url = %request.url(), "Appwrite API request");

        let result = self.http_client.execute(request).await;
        let response = result.context("Appwrite request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(error_response) = serde_json::from_str::<AppwriteErrorResponse>(&body) {
                bail!(
                    "Appwrite API error (HTTP {}): type={}, message={}",
                    status,
                    error_response.error_type,
                    error_response.message,
                );
            }
            bail!("Appwrite API error (HTTP {status}): {body}");
        }

        let body = response
            .text()
            .await
            .context("failed to read response body")?;
        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        let parsed = raw_result.context("failed to decode JSON response")?;
        Ok(parsed)
    }

    /// Lists the most searched rows, propagating failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    pub async fn try_top_trending(&self, limit: u32) -> Result<Vec<TrendingMovie>> {
        let list: RowList<TrendingMovie> = self
            .request_json(
                Method::GET,
                None,
                &[Query::limit(limit), Query::order_desc("count")],
                None,
            )
            .await
            .context("failed to list trending rows")?;
        Ok(list.rows)
    }
}

impl PopularityStore for AppwriteClient {
    #[instrument(skip(self, movie), fields(movie_id = movie.id))]
    async fn record_search_hit(&self, term: &str, movie: &Movie) -> Result<()> {
        let existing: RowList<TrendingMovie> = self
            .request_json(
                Method::GET,
                None,
                &[Query::equal("search_term", &[term])],
                None,
            )
            .await
            .with_context(|| format!("failed to look up search term {term:?}"))?;

        if let Some(row) = existing.rows.first() {
            let count = row.count.saturating_add(1);
            let body = json!({ "data": { "count": count } });
            let _: TrendingMovie = self
                .request_json(Method::PATCH, Some(&row.row_id), &[], Some(&body))
                .await
                .with_context(|| format!("failed to update row {}", row.row_id))?;
            tracing::debug!(row_id = %row.row_id, count, "incremented search count");
        } else {
            let body = json!({
                "rowId": UNIQUE_ROW_ID,
                "data": {
                    "search_term": term,
                    "movie_id": movie.id,
                    "title": movie.title,
                    "count": 1,
                    "poster_url": movie.poster_url(),
                }
            });
            let created: TrendingMovie = self
                .request_json(Method::POST, None, &[], Some(&body))
                .await
                .with_context(|| format!("failed to create row for {term:?}"))?;
            tracing::debug!(row_id = %created.row_id, "created search count row");
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn top_trending(&self, limit: u32) -> Vec<TrendingMovie> {
        match self.try_top_trending(limit).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "failed to fetch trending movies");
                Vec::new()
            }
        }
    }
}
