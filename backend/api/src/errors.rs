//! Application-wide error types.

use thiserror::Error;

use crate::models::CampaignStatus;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A field-level input failure; always recoverable by the caller.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("campaign {0} not found")]
    NotFound(i64),

    /// The operation is not permitted for the campaign's current status.
    #[error("campaign {id} is {status} and no longer accepts changes")]
    InvalidState { id: i64, status: CampaignStatus },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
