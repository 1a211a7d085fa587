use crate::storage::StorageError;
use crate::traits::OrderError;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Duplicate command: {0}")]
    DuplicateCommand(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ManagerResult<T> = Result<T, ManagerError>;
