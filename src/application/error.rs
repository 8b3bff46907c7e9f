use thiserror::Error;

use crate::application::repos::StoreError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
