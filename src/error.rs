use miette::Diagnostic;
use thiserror::Error;

/// Main error type for lifeskills operations
#[derive(Error, Debug, Diagnostic)]
pub enum LifeSkillsError {
    #[error("Storage error")]
    #[diagnostic(help("Check the database path and that it is writable"))]
    Storage(#[from] StorageError),

    #[error("Content provider error")]
    #[diagnostic(help("Check the Gemini API key and network connectivity"))]
    Content(#[from] ContentError),

    #[error("Configuration error")]
    #[diagnostic(help("Check your lifeskills.toml and environment"))]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    #[diagnostic(code(lifeskills::validation))]
    Validation(String),
}

/// Key-value store errors
#[derive(Error, Debug, Diagnostic)]
pub enum StorageError {
    #[error("Failed to open store at {path}")]
    #[diagnostic(
        code(lifeskills::storage::open_failed),
        help("Ensure the directory exists and is writable")
    )]
    OpenFailed {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {context}")]
    #[diagnostic(code(lifeskills::storage::query_failed))]
    QueryFailed {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to encode value for key '{key}'")]
    #[diagnostic(code(lifeskills::storage::encode_failed))]
    EncodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while talking to the generative content API.
///
/// These never reach the UI: the content facade swaps in fallback content.
#[derive(Error, Debug, Diagnostic)]
pub enum ContentError {
    #[error("API key not configured")]
    #[diagnostic(
        code(lifeskills::content::missing_key),
        help("Set GEMINI_API_KEY or gemini.api_key in lifeskills.toml")
    )]
    MissingApiKey,

    #[error("HTTP transport failed")]
    #[diagnostic(code(lifeskills::content::transport))]
    Transport(#[from] reqwest::Error),

    #[error("Gemini API error: {status}: {body}")]
    #[diagnostic(code(lifeskills::content::status))]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    #[diagnostic(code(lifeskills::content::malformed))]
    Malformed(String),

    #[error("Response contained no text")]
    #[diagnostic(code(lifeskills::content::empty))]
    EmptyResponse,

    #[error("Request timed out after {0}s")]
    #[diagnostic(code(lifeskills::content::timeout))]
    Timeout(u64),

    #[error("Generated content rejected: {0}")]
    #[diagnostic(code(lifeskills::content::policy))]
    PolicyViolation(String),
}

impl From<serde_json::Error> for ContentError {
    fn from(e: serde_json::Error) -> Self {
        ContentError::Malformed(e.to_string())
    }
}

/// Configuration loading errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    #[diagnostic(code(lifeskills::config::read_failed))]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config")]
    #[diagnostic(
        code(lifeskills::config::parse_failed),
        help("Check TOML syntax")
    )]
    ParseFailed {
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lifeskills::config::invalid))]
    Invalid { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LifeSkillsError>;
