use core_config::{env_first, env_or_default, env_parse, ConfigError, FromEnv};

/// Settings for the MongoDB-backed catalog store
///
/// Environment variables:
/// - `MONGODB_URL` or `MONGO_URL` (required) - connection string
/// - `MONGODB_DATABASE` or `MONGO_DATABASE` (default: `products`)
/// - `PRODUCTS_COLLECTION` (default: `products`)
/// - `MONGODB_APP_NAME` (optional) - application name for server logs
/// - `MONGODB_MAX_POOL_SIZE` (default: 100)
/// - `MONGODB_MIN_POOL_SIZE` (default: 5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    pub mongo_url: String,
    pub database: String,
    pub collection: String,
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl CatalogConfig {
    pub fn new(mongo_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            mongo_url: mongo_url.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mongo_url: "mongodb://localhost:27017".to_string(),
            database: "products".to_string(),
            collection: "products".to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

impl FromEnv for CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mongo_url = env_first(&["MONGODB_URL", "MONGO_URL"])
            .ok_or_else(|| ConfigError::MissingEnvVar("MONGODB_URL or MONGO_URL".to_string()))?;

        let database =
            env_first(&["MONGODB_DATABASE", "MONGO_DATABASE"]).unwrap_or_else(|| "products".to_string());

        let min_pool_size = env_parse("MONGODB_MIN_POOL_SIZE", 5)?;
        let max_pool_size = env_parse("MONGODB_MAX_POOL_SIZE", 100)?;
        if min_pool_size > max_pool_size {
            return Err(ConfigError::ParseError {
                key: "MONGODB_MIN_POOL_SIZE".to_string(),
                details: format!("{min_pool_size} exceeds MONGODB_MAX_POOL_SIZE {max_pool_size}"),
            });
        }

        Ok(Self {
            mongo_url,
            database,
            collection: env_or_default("PRODUCTS_COLLECTION", "products"),
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size,
            min_pool_size,
            connect_timeout_secs: env_parse("MONGODB_CONNECT_TIMEOUT_SECS", 10)?,
            server_selection_timeout_secs: env_parse("MONGODB_SERVER_SELECTION_TIMEOUT_SECS", 30)?,
        })
    }
}
