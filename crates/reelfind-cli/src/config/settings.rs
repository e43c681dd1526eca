//! Effective settings: config file values overlaid with environment variables.

use std::time::Duration;

use reelfind_api::appwrite::DEFAULT_ENDPOINT;

use super::AppConfig;

/// Appwrite connection settings. Present only when the project,
/// database and table IDs are all known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppwriteSettings {
    /// API endpoint.
    pub endpoint: String,
    /// Project ID.
    pub project_id: String,
    /// Database ID.
    pub database_id: String,
    /// Table ID.
    pub table_id: String,
    /// Server API key.
    pub api_key: Option<String>,
}

/// Settings handed to client constructors and screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// TMDB bearer token (`TMDB_API_TOKEN`).
    pub tmdb_token: Option<String>,
    /// TMDB base URL override.
    pub tmdb_base_url: Option<String>,
    /// Catalog response language.
    pub language: String,
    /// Keystroke debounce.
    pub debounce: Duration,
    /// Trending list size.
    pub trending_limit: u32,
    /// Popularity store connection, if configured.
    pub appwrite: Option<AppwriteSettings>,
}

impl Settings {
    /// Overlays `env` onto `config`. Blank variables count as unset.
    pub fn resolve<F>(config: &AppConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let project_id = var("APPWRITE_PROJECT_ID").or_else(|| config.appwrite.project_id.clone());
        let database_id =
            var("APPWRITE_DATABASE_ID").or_else(|| config.appwrite.database_id.clone());
        let table_id = var("APPWRITE_TABLE_ID").or_else(|| config.appwrite.table_id.clone());

        let appwrite = match (project_id, database_id, table_id) {
            (Some(project_id), Some(database_id), Some(table_id)) => Some(AppwriteSettings {
                endpoint: var("APPWRITE_ENDPOINT")
                    .or_else(|| config.appwrite.endpoint.clone())
                    .unwrap_or_else(|| String::from(DEFAULT_ENDPOINT)),
                project_id,
                database_id,
                table_id,
                api_key: var("APPWRITE_API_KEY"),
            }),
            _ => None,
        };

        Self {
            tmdb_token: var("TMDB_API_TOKEN"),
            tmdb_base_url: var("TMDB_BASE_URL").or_else(|| config.tmdb.base_url.clone()),
            language: config.tmdb.language.clone(),
            debounce: Duration::from_millis(config.search.debounce_ms),
            trending_limit: config.trending.limit,
            appwrite,
        }
    }

    /// Key/value lines describing the effective settings, secrets masked.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("tmdb.token", mask(self.tmdb_token.as_deref())),
            (
                "tmdb.base_url",
                self.tmdb_base_url
                    .clone()
                    .unwrap_or_else(|| String::from("(default)")),
            ),
            ("tmdb.language", self.language.clone()),
            ("search.debounce_ms", self.debounce.as_millis().to_string()),
            ("trending.limit", self.trending_limit.to_string()),
        ];
        match &self.appwrite {
            Some(aw) => lines.extend([
                ("appwrite.endpoint", aw.endpoint.clone()),
                ("appwrite.project_id", aw.project_id.clone()),
                ("appwrite.database_id", aw.database_id.clone()),
                ("appwrite.table_id", aw.table_id.clone()),
                ("appwrite.api_key", mask(aw.api_key.as_deref())),
            ]),
            None => lines.push(("appwrite", String::from("(not configured, in-memory store)"))),
        }
        lines
    }
}

/// Masks a secret, keeping only the last four characters.
fn mask(secret: Option<&str>) -> String {
    let Some(secret) = secret else {
        return String::from("(not set)");
    };
    let count = secret.chars().count();
    if count <= 8 {
        return String::from("********");
    }
    let tail: String = secret.chars().skip(count.saturating_sub(4)).collect();
    format!("********{tail}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        // Arrange
        let config = AppConfig::default();

        // Act
        let settings = Settings::resolve(&config, env_from(&[]));

        // Assert
        assert_eq!(settings.tmdb_token, None);
        assert_eq!(settings.debounce, Duration::from_millis(500));
        assert_eq!(settings.trending_limit, 5);
        assert_eq!(settings.language, "en-US");
        assert_eq!(settings.appwrite, None);
    }

    #[test]
    fn test_env_overrides_file_values() {
        // Arrange
        let mut config = AppConfig::default();
        config.tmdb.base_url = Some(String::from("http://file.example/3"));
        config.appwrite.project_id = Some(String::from("from-file"));
        config.appwrite.database_id = Some(String::from("db"));
        config.appwrite.table_id = Some(String::from("metrics"));
        let env = env_from(&[
            ("TMDB_API_TOKEN", "tok"),
            ("TMDB_BASE_URL", "http://env.example/3"),
            ("APPWRITE_PROJECT_ID", "from-env"),
        ]);

        // Act
        let settings = Settings::resolve(&config, env);

        // Assert
        assert_eq!(settings.tmdb_token.as_deref(), Some("tok"));
        assert_eq!(
            settings.tmdb_base_url.as_deref(),
            Some("http://env.example/3")
        );
        let aw = settings.appwrite.unwrap();
        assert_eq!(aw.project_id, "from-env");
        assert_eq!(aw.database_id, "db");
        assert_eq!(aw.endpoint, "https://cloud.appwrite.io/v1");
    }

    #[test]
    fn test_appwrite_requires_all_ids() {
        // Arrange
        let env = env_from(&[("APPWRITE_PROJECT_ID", "p"), ("APPWRITE_DATABASE_ID", "d")]);

        // Act
        let settings = Settings::resolve(&AppConfig::default(), env);

        // Assert
        assert_eq!(settings.appwrite, None);
    }

    #[test]
    fn test_blank_env_counts_as_unset() {
        // Arrange
        let env = env_from(&[("TMDB_API_TOKEN", "  ")]);

        // Act
        let settings = Settings::resolve(&AppConfig::default(), env);

        // Assert
        assert_eq!(settings.tmdb_token, None);
    }

    #[test]
    fn test_describe_masks_secrets() {
        // Arrange
        let env = env_from(&[
            ("TMDB_API_TOKEN", "eyJhbGciOiJIUzI1NiJ9.secret-tail"),
            ("APPWRITE_PROJECT_ID", "p"),
            ("APPWRITE_DATABASE_ID", "d"),
            ("APPWRITE_TABLE_ID", "t"),
            ("APPWRITE_API_KEY", "short"),
        ]);
        let settings = Settings::resolve(&AppConfig::default(), env);

        // Act
        let lines: HashMap<&str, String> = settings.describe().into_iter().collect();

        // Assert
        assert_eq!(lines["tmdb.token"], "********tail");
        assert_eq!(lines["appwrite.api_key"], "********");
        assert_eq!(lines["appwrite.table_id"], "t");
    }

    #[test]
    fn test_describe_reports_missing_store() {
        // Arrange
        let settings = Settings::resolve(&AppConfig::default(), env_from(&[]));

        // Act
        let lines: HashMap<&str, String> = settings.describe().into_iter().collect();

        // Assert
        assert_eq!(lines["tmdb.token"], "(not set)");
        assert!(lines["appwrite"].contains("in-memory"));
    }
}
