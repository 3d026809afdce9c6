use crate::backend::geolocation::Coordinates;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::{env, path::Path};

/// Main configuration for the lifeskills backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative content API
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Persistent key-value store
    #[serde(default)]
    pub storage: StorageConfig,
    /// Fallback coordinate when geolocation is denied or unavailable
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; usually supplied through GEMINI_API_KEY rather than the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used for stories, tasks, places and sentiment
    pub fast_model: String,
    /// Model used for the mood journey reflection
    pub reflective_model: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            fast_model: "gemini-2.5-flash".to_string(),
            reflective_model: "gemini-2.5-pro".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite file backing the key-value store
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "lifeskills.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub default_lat: f64,
    pub default_lng: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // San Francisco
        Self {
            default_lat: 37.7749,
            default_lng: -122.4194,
        }
    }
}

impl LocationConfig {
    pub fn default_coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.default_lat,
            lng: self.default_lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset
    pub filter: String,
    /// Directory for the rolling log file
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lifeskills_lib=info".to_string(),
            directory: "logs".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `LIFESKILLS_CONFIG` (default `lifeskills.toml`), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("LIFESKILLS_CONFIG").unwrap_or_else(|_| "lifeskills.toml".to_string());
        let config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::debug!("config file {} not found, using defaults", config_path);
            Self::default()
        };
        let config = config.override_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::ParseFailed { source: e })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gemini.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "gemini.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if !(-90.0..=90.0).contains(&self.location.default_lat)
            || !(-180.0..=180.0).contains(&self.location.default_lng)
        {
            return Err(ConfigError::Invalid {
                field: "location".to_string(),
                reason: "default coordinate out of range".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn override_from_env(mut self) -> Self {
        if let Ok(key) = env::var("GEMINI_API_KEY").or_else(|_| env::var("API_KEY")) {
            if !key.is_empty() {
                self.gemini.api_key = Some(key);
            }
        }
        if let Ok(url) = env::var("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Ok(path) = env::var("LIFESKILLS_DB_PATH") {
            self.storage.path = path;
        }
        if let Ok(filter) = env::var("LIFESKILLS_LOG") {
            self.logging.filter = filter;
        }
        self
    }
}

/// Load `.env` if present. Missing file is not an error.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env loaded: {}", e);
    }
}
