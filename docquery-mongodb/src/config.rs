//! Connection settings for the MongoDB backend.

use std::time::Duration;

use mongodb::options::ClientOptions;
use serde::Deserialize;

use docquery_core::error::{DocQueryError, DocQueryResult};

/// Connection settings, typically deserialized from the application's configuration file.
///
/// ```ignore
/// let config: MongoConfig = serde_json::from_str(r#"{
///     "uri": "mongodb://localhost:27017",
///     "database": "app",
///     "max_pool_size": 20
/// }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MongoConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// Name of the database collections are resolved in.
    pub database: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub max_pool_size: Option<u32>,
    #[serde(default)]
    pub min_pool_size: Option<u32>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            app_name: None,
            max_pool_size: None,
            min_pool_size: None,
            connect_timeout_ms: None,
        }
    }

    /// Parses the connection string and applies the optional settings on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`DocQueryError::Initialization`] if the connection string is invalid.
    pub async fn client_options(&self) -> DocQueryResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| DocQueryError::Initialization(e.to_string()))?;

        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(max_pool_size) = self.max_pool_size {
            options.max_pool_size = Some(max_pool_size);
        }
        if let Some(min_pool_size) = self.min_pool_size {
            options.min_pool_size = Some(min_pool_size);
        }
        if let Some(timeout) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(timeout));
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{de::deserialize_from_document, doc};

    #[test]
    fn optional_settings_default_to_none() {
        let config: MongoConfig = deserialize_from_document(doc! {
            "uri": "mongodb://localhost:27017",
            "database": "app",
        })
        .unwrap();

        assert_eq!(config, MongoConfig::new("mongodb://localhost:27017", "app"));
    }

    #[test]
    fn uri_and_database_are_required() {
        let result = deserialize_from_document::<MongoConfig>(doc! { "uri": "mongodb://localhost:27017" });

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn settings_are_applied_to_client_options() {
        let config = MongoConfig {
            app_name: Some("people-service".to_string()),
            max_pool_size: Some(20),
            min_pool_size: Some(2),
            connect_timeout_ms: Some(1500),
            ..MongoConfig::new("mongodb://localhost:27017", "app")
        };

        let options = config.client_options().await.unwrap();

        assert_eq!(options.app_name.as_deref(), Some("people-service"));
        assert_eq!(options.max_pool_size, Some(20));
        assert_eq!(options.min_pool_size, Some(2));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn unset_settings_keep_connection_string_values() {
        let config = MongoConfig::new("mongodb://localhost:27017/?appname=from-uri&maxPoolSize=7", "app");

        let options = config.client_options().await.unwrap();

        assert_eq!(options.app_name.as_deref(), Some("from-uri"));
        assert_eq!(options.max_pool_size, Some(7));
        assert_eq!(options.min_pool_size, None);
    }

    #[tokio::test]
    async fn invalid_uri_is_an_initialization_error() {
        let err = MongoConfig::new("not-a-uri", "app").client_options().await.unwrap_err();

        assert!(matches!(err, DocQueryError::Initialization(_)));
    }
}
