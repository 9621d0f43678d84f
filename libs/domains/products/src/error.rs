use thiserror::Error;

use crate::models::ProductId;
use crate::storage::StorageError;

/// Caller-facing failures of catalog operations.
///
/// `NotFound`, `Conflict` and `InvalidArgument` are expected outcomes callers
/// branch on. `StorageFailure` carries the store error unchanged for the
/// transport layer to map.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("Product with SKU '{sku}' already exists")]
    Conflict { sku: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<validator::ValidationErrors> for CatalogError {
    fn from(err: validator::ValidationErrors) -> Self {
        CatalogError::InvalidArgument(err.to_string())
    }
}
