//! In-memory implementation of ProductStore (for development/testing)

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::models::{NewProduct, Product, ProductChanges, ProductId};
use crate::storage::{ProductPredicate, ProductStore, StorageError, StorageResult};

/// Products kept in insertion order, which is this store's natural order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

/// Lowercased alphanumeric words, the unit `$text` matches on
fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Any query term appears as a whole word in name or description
fn text_matches(query_terms: &HashSet<String>, product: &Product) -> bool {
    terms(&product.name)
        .chain(terms(&product.description))
        .any(|word| query_terms.contains(&word))
}

fn page<T: Clone>(items: impl Iterator<Item = T>, skip: u64, limit: u64) -> Vec<T> {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.skip(skip).take(limit).collect()
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    #[instrument(skip(self))]
    async fn find_many(
        &self,
        predicate: &ProductPredicate,
        skip: u64,
        limit: u64,
    ) -> StorageResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(page(
            products.iter().filter(|p| predicate.matches(p)).cloned(),
            skip,
            limit,
        ))
    }

    #[instrument(skip(self))]
    async fn count(&self, predicate: &ProductPredicate) -> StorageResult<u64> {
        let products = self.products.read().await;
        Ok(products.iter().filter(|p| predicate.matches(p)).count() as u64)
    }

    #[instrument(skip(self))]
    async fn find_one(&self, predicate: &ProductPredicate) -> StorageResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| predicate.matches(p)).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &ProductId) -> StorageResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| &p.id == id).cloned())
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    async fn insert(&self, input: NewProduct) -> StorageResult<Product> {
        // Uniqueness check and insert share one write lock.
        let mut products = self.products.write().await;

        if products.iter().any(|p| p.sku == input.sku) {
            return Err(StorageError::DuplicateKey {
                key: "sku",
                value: input.sku,
            });
        }

        let product = Product::new(input);
        products.push(product.clone());

        tracing::info!(product_id = %product.id, "Product stored");
        Ok(product)
    }

    #[instrument(skip(self, changes))]
    async fn update_by_id(
        &self,
        id: &ProductId,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>> {
        let mut products = self.products.write().await;

        let Some(product) = products.iter_mut().find(|p| &p.id == id) else {
            return Ok(None);
        };
        product.apply_changes(changes);
        Ok(Some(product.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &ProductId) -> StorageResult<bool> {
        let mut products = self.products.write().await;

        match products.iter().position(|p| &p.id == id) {
            Some(index) => {
                products.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn text_search(
        &self,
        query: &str,
        skip: u64,
        limit: u64,
    ) -> StorageResult<Vec<Product>> {
        let query_terms: HashSet<String> = terms(query).collect();
        let products = self.products.read().await;
        Ok(page(
            products
                .iter()
                .filter(|p| text_matches(&query_terms, p))
                .cloned(),
            skip,
            limit,
        ))
    }

    #[instrument(skip(self))]
    async fn text_search_count(&self, query: &str) -> StorageResult<u64> {
        let query_terms: HashSet<String> = terms(query).collect();
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| text_matches(&query_terms, p))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(sku: &str, name: &str, description: &str) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: "Electronics".to_string(),
            subcategory: "Computers".to_string(),
            price: 10.0,
            brand: "Acme".to_string(),
            image_url: "https://img.example.com/p.png".to_string(),
            features: vec![],
            specifications: Default::default(),
            stock: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let store = InMemoryProductStore::new();

        let product = store.insert(input("SKU1", "Laptop", "Fast")).await.unwrap();
        let fetched = store.find_by_id(&product.id).await.unwrap();

        assert_eq!(fetched, Some(product));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let store = InMemoryProductStore::new();
        store.insert(input("SKU1", "Laptop", "Fast")).await.unwrap();

        let result = store.insert(input("SKU1", "Other", "Other")).await;

        assert!(matches!(
            result,
            Err(StorageError::DuplicateKey { key: "sku", ref value }) if value == "SKU1"
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_admit_one_sku() {
        let store = InMemoryProductStore::new();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.spawn(async move { store.insert(input("RACE", "Item", "Item")).await });
        }

        let mut inserted = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => inserted += 1,
                Err(StorageError::DuplicateKey { key, .. }) => assert_eq!(key, "sku"),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_limit_returns_empty_page() {
        let store = InMemoryProductStore::new();
        store.insert(input("A", "Laptop", "Fast")).await.unwrap();

        assert!(store
            .find_many(&ProductPredicate::default(), 0, 0)
            .await
            .unwrap()
            .is_empty());
        assert!(store.text_search("laptop", 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_many_keeps_insertion_order() {
        let store = InMemoryProductStore::new();
        for sku in ["A", "B", "C", "D"] {
            store.insert(input(sku, "Item", "Item")).await.unwrap();
        }

        let page = store
            .find_many(&ProductPredicate::default(), 1, 2)
            .await
            .unwrap();

        let skus: Vec<_> = page.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, ["B", "C"]);
    }

    #[tokio::test]
    async fn test_text_search_matches_whole_words_case_insensitively() {
        let store = InMemoryProductStore::new();
        store
            .insert(input("A", "Gaming Laptop", "Portable"))
            .await
            .unwrap();
        store
            .insert(input("B", "Desk", "Fits any LAPTOP"))
            .await
            .unwrap();
        store
            .insert(input("C", "Laptops bag", "Padded"))
            .await
            .unwrap();

        let found = store.text_search("laptop", 0, 10).await.unwrap();
        let skus: Vec<_> = found.iter().map(|p| p.sku.as_str()).collect();

        assert_eq!(skus, ["A", "B"]);
        assert_eq!(store.text_search_count("laptop").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_text_search_any_term_matches() {
        let store = InMemoryProductStore::new();
        store.insert(input("A", "Kettle", "Steel")).await.unwrap();
        store.insert(input("B", "Toaster", "Chrome")).await.unwrap();

        assert_eq!(store.text_search_count("kettle toaster").await.unwrap(), 2);
        assert_eq!(store.text_search_count("blender").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = InMemoryProductStore::new();
        let result = store
            .update_by_id(&ProductId::from("missing"), ProductChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = InMemoryProductStore::new();
        let product = store.insert(input("A", "Item", "Item")).await.unwrap();

        assert!(store.delete_by_id(&product.id).await.unwrap());
        assert!(!store.delete_by_id(&product.id).await.unwrap());
        assert!(store.is_empty().await);
    }
}
