//! Appwrite TablesDB row types and query builder.

use serde::{Deserialize, Serialize};

/// A search counter row, shown as a trending movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingMovie {
    /// Appwrite row ID.
    #[serde(rename = "$id")]
    pub row_id: String,
    /// Search term the counter belongs to.
    pub search_term: String,
    /// TMDB movie ID of the top result for the term.
    pub movie_id: u64,
    /// Movie title.
    pub title: String,
    /// Full poster URL.
    pub poster_url: String,
    /// Number of recorded searches.
    pub count: u64,
}

/// Response from the list rows endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RowList<T> {
    /// Total number of matching rows.
    pub total: u64,
    /// Rows on this page.
    pub rows: Vec<T>,
}

/// Appwrite error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteErrorResponse {
    /// Human readable message.
    pub message: String,
    /// HTTP status code echoed by Appwrite.
    #[serde(default)]
    pub code: u16,
    /// Error type (e.g. `general_unauthorized_scope`).
    #[serde(rename = "type", default)]
    pub error_type: String,
}

/// A TablesDB query, sent as a JSON string in `queries[]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<serde_json::Value>,
}

impl Query {
    /// Matches rows whose `attribute` equals one of `values`.
    pub fn equal(attribute: impl Into<String>, values: &[&str]) -> Self {
        Self {
            method: "equal",
            attribute: Some(attribute.into()),
            values: values
                .iter()
                .map(|v| serde_json::Value::from(*v))
                .collect(),
        }
    }

    /// Orders rows by `attribute`, largest first.
    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Self {
            method: "orderDesc",
            attribute: Some(attribute.into()),
            values: Vec::new(),
        }
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(limit: u32) -> Self {
        Self {
            method: "limit",
            attribute: None,
            values: vec![serde_json::Value::from(limit)],
        }
    }

    /// Serializes the query into its wire string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_query_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_equal_query_string() {
        // Arrange & Act
        let q = Query::equal("search_term", &["dune"]).to_query_string().unwrap();

        // Assert
        assert_eq!(
            q,
            r#"{"method":"equal","attribute":"search_term","values":["dune"]}"#
        );
    }

    #[test]
    fn test_order_desc_query_string() {
        // Arrange & Act
        let q = Query::order_desc("count").to_query_string().unwrap();

        // Assert
        assert_eq!(q, r#"{"method":"orderDesc","attribute":"count"}"#);
    }

    #[test]
    fn test_limit_query_string() {
        // Arrange & Act
        let q = Query::limit(5).to_query_string().unwrap();

        // Assert
        assert_eq!(q, r#"{"method":"limit","values":[5]}"#);
    }

    #[test]
    fn test_parse_row_list_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/appwrite/list_rows_trending.json");

        // Act
        let list: RowList<TrendingMovie> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(list.total, 2);
        assert_eq!(list.rows[0].row_id, "66f1a2b3c4d5e6f7a8b9");
        assert_eq!(list.rows[0].search_term, "dune");
        assert_eq!(list.rows[0].count, 12);
    }

    #[test]
    fn test_parse_error_response() {
        // Arrange
        let json = r#"{"message":"The current user is not authorized to perform the requested action.","code":401,"type":"user_unauthorized","version":"1.8.0"}"#;

        // Act
        let error: AppwriteErrorResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(error.code, 401);
        assert_eq!(error.error_type, "user_unauthorized");
    }
}
