use thiserror::Error;

use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("customer `{id}` not found")]
    NotFound { id: Uuid },
    #[error("validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
