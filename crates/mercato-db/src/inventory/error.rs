//! # Inventory Service Errors
//!
//! Every service operation returns [`InventoryResult`]: either a business
//! failure from mercato-core or an infrastructure failure from SQLite.

use thiserror::Error;

use crate::error::DbError;
use mercato_core::{CoreError, ValidationError};

/// Error returned by [`crate::InventoryService`] operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Validation, not found, insufficient stock, invalid state, conflict or
    /// exhausted contention retries.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store itself failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl InventoryError {
    /// True only for `ConcurrentModification`: the same request may succeed
    /// if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Core(err) if err.is_retryable())
    }

    /// The business error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            InventoryError::Core(err) => Some(err),
            InventoryError::Db(_) => None,
        }
    }
}

impl From<ValidationError> for InventoryError {
    fn from(err: ValidationError) -> Self {
        InventoryError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        InventoryError::Db(DbError::from(err))
    }
}

/// Result type for inventory service operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_only_for_contention() {
        let contention: InventoryError = CoreError::ConcurrentModification {
            entity: "StockRecord".to_string(),
            id: "p@l".to_string(),
            attempts: 5,
        }
        .into();
        assert!(contention.is_retryable());

        let busy: InventoryError = DbError::Busy("database is locked".to_string()).into();
        assert!(!busy.is_retryable());

        let validation: InventoryError = ValidationError::MustBeNonZero {
            field: "delta".to_string(),
        }
        .into();
        assert!(matches!(
            validation.as_core(),
            Some(CoreError::Validation(ValidationError::MustBeNonZero { .. }))
        ));
    }
}
