use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("An account with email '{0}' already exists")]
    DuplicateAccount(String),

    #[error("Identity check failed")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Failures the UI is expected to render inline rather than treat as a crash.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CatalogError::DuplicateAccount(_)
                | CatalogError::InvalidCredentials
                | CatalogError::NotFound(_)
                | CatalogError::ValidationFailure(_)
        )
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
