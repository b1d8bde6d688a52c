use thiserror::Error;

use crate::services::image_probe::ProbeError;

/// Unified error type for the plugin
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Image probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl AppError {
    /// Build a validation error for a form field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type used across the crate
pub type AppResult<T> = Result<T, AppError>;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caused by user input, fixable by the user
    UserError,
    /// Transient system failure, may be retried
    SystemError,
    /// Needs a configuration change
    ConfigError,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation { .. } => ErrorCategory::UserError,
            AppError::Pattern(_) => ErrorCategory::ConfigError,
            AppError::Database(_) => ErrorCategory::SystemError,
            AppError::Probe(_) => ErrorCategory::SystemError,
            AppError::Internal(_) => ErrorCategory::SystemError,
        }
    }

    /// Message suitable for showing to an administrator
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => {
                "A database error occurred. Check the plugin tables and try again.".to_string()
            }
            AppError::Pattern(err) => format!("Invalid relation tag pattern: {err}"),
            AppError::Probe(err) => format!("The image could not be inspected: {err}"),
            AppError::Internal(err) => format!("Internal error: {err}"),
            // Validation messages are shown verbatim, the form already names the field
            AppError::Validation { message, .. } => message.clone(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::SystemError)
    }
}
