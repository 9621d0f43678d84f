use async_trait::async_trait;
use tracing::instrument;

use crate::models::{NewProduct, PageRequest, Product, ProductId, ProductPage, ProductPatch, ProductQuery};
use crate::storage::{ProductPredicate, ProductStore, StorageResult};

/// Repository trait for catalog data access
///
/// Pure translation between request shapes and store calls. Absence is a
/// value here (`Option` / `bool`), never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of products matching the query's filters, plus the total
    async fn list_page(&self, query: ProductQuery) -> StorageResult<ProductPage>;

    async fn get_by_id(&self, id: &ProductId) -> StorageResult<Option<Product>>;

    /// Exact SKU lookup, used for the uniqueness pre-check
    async fn get_by_sku(&self, sku: &str) -> StorageResult<Option<Product>>;

    async fn insert(&self, input: NewProduct) -> StorageResult<Product>;

    /// Apply the present fields of `patch`; `sku` is never written
    async fn update_by_id(&self, id: &ProductId, patch: ProductPatch)
        -> StorageResult<Option<Product>>;

    async fn delete_by_id(&self, id: &ProductId) -> StorageResult<bool>;

    /// Full-text search over name and description
    async fn search_page(&self, query: &str, page: PageRequest) -> StorageResult<ProductPage>;
}

/// ProductRepository backed by any [`ProductStore`]
#[derive(Debug, Clone)]
pub struct StoreProductRepository<S: ProductStore> {
    store: S,
}

impl<S: ProductStore> StoreProductRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ProductStore> ProductRepository for StoreProductRepository<S> {
    #[instrument(skip(self))]
    async fn list_page(&self, query: ProductQuery) -> StorageResult<ProductPage> {
        let predicate = ProductPredicate::from(&query);
        let request = query.page_request();

        // Page and count are independent reads; they may straddle a write.
        let (products, total) = tokio::try_join!(
            self.store.find_many(&predicate, request.skip(), request.limit),
            self.store.count(&predicate),
        )?;

        Ok(ProductPage::new(products, total, request))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &ProductId) -> StorageResult<Option<Product>> {
        self.store.find_by_id(id).await
    }

    #[instrument(skip(self))]
    async fn get_by_sku(&self, sku: &str) -> StorageResult<Option<Product>> {
        self.store.find_one(&ProductPredicate::by_sku(sku)).await
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    async fn insert(&self, input: NewProduct) -> StorageResult<Product> {
        self.store.insert(input).await
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> StorageResult<Option<Product>> {
        let (changes, dropped_sku) = patch.into_changes();
        if let Some(sku) = dropped_sku {
            tracing::debug!(product_id = %id, %sku, "Ignoring sku in update, it is immutable");
        }
        self.store.update_by_id(id, changes).await
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &ProductId) -> StorageResult<bool> {
        self.store.delete_by_id(id).await
    }

    #[instrument(skip(self))]
    async fn search_page(&self, query: &str, page: PageRequest) -> StorageResult<ProductPage> {
        let (products, total) = tokio::try_join!(
            self.store.text_search(query, page.skip(), page.limit),
            self.store.text_search_count(query),
        )?;

        Ok(ProductPage::new(products, total, page))
    }
}
