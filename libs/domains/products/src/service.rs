//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{NewProduct, PageRequest, Product, ProductId, ProductPage, ProductPatch, ProductQuery};
use crate::repository::ProductRepository;
use crate::storage::StorageError;

/// Product service enforcing catalog invariants on top of a repository
///
/// Holds no mutable state; clones share the same repository.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List products; page/limit bounds are the caller's concern
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> CatalogResult<ProductPage> {
        Ok(self.repository.list_page(query).await?)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> CatalogResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Full-text search; an empty or whitespace-only query is rejected
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> CatalogResult<ProductPage> {
        if query.trim().is_empty() {
            return Err(CatalogError::InvalidArgument(
                "Search query is required".to_string(),
            ));
        }

        Ok(self
            .repository
            .search_page(query, PageRequest::new(page, limit))
            .await?)
    }

    /// Create a new product.
    ///
    /// The SKU lookup fails fast with `Conflict`; the store's unique
    /// constraint decides concurrent creates, and its rejection is reported
    /// as the same `Conflict`.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: NewProduct) -> CatalogResult<Product> {
        input.validate()?;

        if self.repository.get_by_sku(&input.sku).await?.is_some() {
            tracing::warn!("Rejected create, SKU already in use");
            return Err(CatalogError::Conflict { sku: input.sku });
        }

        match self.repository.insert(input).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(StorageError::DuplicateKey { key: "sku", value }) => {
                tracing::warn!("SKU claimed by a concurrent create");
                Err(CatalogError::Conflict { sku: value })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Update an existing product. A `sku` in the patch is ignored.
    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> CatalogResult<Product> {
        patch.validate()?;

        let product = self
            .repository
            .update_by_id(id, patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &ProductId) -> CatalogResult<()> {
        if !self.repository.delete_by_id(id).await? {
            return Err(CatalogError::NotFound(id.clone()));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
