//! Storage port - the narrow capability the catalog needs from a store
//!
//! Any document or relational backend can sit behind [`ProductStore`]. The
//! catalog never queries a backend directly; it only calls these methods.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewProduct, Product, ProductChanges, ProductId, ProductQuery};

/// Failure surfaced by a store
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique constraint rejected the write
    #[error("Duplicate value '{value}' for unique key '{key}'")]
    DuplicateKey { key: &'static str, value: String },

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Conjunctive filter over product fields.
///
/// Absent fields impose no constraint; an all-`None` predicate matches
/// every product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPredicate {
    pub sku: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductPredicate {
    pub fn by_sku(sku: impl Into<String>) -> Self {
        Self {
            sku: Some(sku.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate in process, for stores without a query engine
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ref sku) = self.sku {
            if &product.sku != sku {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(ref brand) = self.brand {
            if &product.brand != brand {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

impl From<&ProductQuery> for ProductPredicate {
    fn from(query: &ProductQuery) -> Self {
        Self {
            sku: None,
            category: query.category.clone(),
            brand: query.brand.clone(),
            min_price: query.min_price,
            max_price: query.max_price,
        }
    }
}

/// Storage capability required by the catalog repository.
///
/// Implementations must enforce SKU uniqueness in `insert` themselves and
/// report a collision as [`StorageError::DuplicateKey`]; the service-level
/// pre-check is only a fast path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching `predicate`, in the store's natural order
    async fn find_many(
        &self,
        predicate: &ProductPredicate,
        skip: u64,
        limit: u64,
    ) -> StorageResult<Vec<Product>>;

    /// Number of products matching `predicate`
    async fn count(&self, predicate: &ProductPredicate) -> StorageResult<u64>;

    /// First product matching `predicate`
    async fn find_one(&self, predicate: &ProductPredicate) -> StorageResult<Option<Product>>;

    async fn find_by_id(&self, id: &ProductId) -> StorageResult<Option<Product>>;

    /// Persist a new product; the store assigns id and timestamps
    async fn insert(&self, input: NewProduct) -> StorageResult<Product>;

    /// Apply `changes` and return the post-update record, or `None` if absent
    async fn update_by_id(
        &self,
        id: &ProductId,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>>;

    /// Remove a product; `true` if one existed
    async fn delete_by_id(&self, id: &ProductId) -> StorageResult<bool>;

    /// Full-text match on name and description; ranking is store-defined
    async fn text_search(&self, query: &str, skip: u64, limit: u64)
        -> StorageResult<Vec<Product>>;

    async fn text_search_count(&self, query: &str) -> StorageResult<u64>;
}
