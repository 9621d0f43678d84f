//! MongoDB implementation of ProductStore

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, to_document, Document},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::CatalogConfig;
use crate::models::{NewProduct, Product, ProductChanges, ProductId};
use crate::storage::{ProductPredicate, ProductStore, StorageError, StorageResult};

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB implementation of the ProductStore
#[derive(Debug, Clone)]
pub struct MongoProductStore {
    collection: Collection<Product>,
}

impl MongoProductStore {
    /// Use the `products` collection of `db`
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, "products")
    }

    /// Use a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Connect using a [`CatalogConfig`] and verify the server answers
    pub async fn connect(config: &CatalogConfig) -> StorageResult<Self> {
        info!(database = %config.database, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(&config.mongo_url).await?;
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_secs));
        if let Some(ref app_name) = config.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options)?;
        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 }).await?;

        info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );
        Ok(Self::with_collection(&db, &config.collection))
    }

    /// Create the indexes the catalog relies on.
    ///
    /// The unique `sku` index is the authoritative uniqueness guard; the
    /// text index backs `text_search`.
    pub async fn init_indexes(&self) -> StorageResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "sku": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_sku_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "name": "text", "description": "text" })
                .options(
                    IndexOptions::builder()
                        .name("idx_text_search".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "price": 1 })
                .options(IndexOptions::builder().name("idx_price".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "brand": 1 })
                .options(IndexOptions::builder().name("idx_brand".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1, "price": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category_price".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        info!("Product indexes created successfully");
        Ok(())
    }

    /// Build a MongoDB filter document from a ProductPredicate
    fn build_filter(predicate: &ProductPredicate) -> Document {
        let mut doc = doc! {};

        if let Some(ref sku) = predicate.sku {
            doc.insert("sku", sku);
        }

        if let Some(ref category) = predicate.category {
            doc.insert("category", category);
        }

        if let Some(ref brand) = predicate.brand {
            doc.insert("brand", brand);
        }

        if predicate.min_price.is_some() || predicate.max_price.is_some() {
            let mut price_filter = doc! {};
            if let Some(min) = predicate.min_price {
                price_filter.insert("$gte", min);
            }
            if let Some(max) = predicate.max_price {
                price_filter.insert("$lte", max);
            }
            doc.insert("price", price_filter);
        }

        doc
    }

    fn id_filter(id: &ProductId) -> Document {
        doc! { "_id": id.as_str() }
    }

    fn text_filter(query: &str) -> Document {
        doc! { "$text": { "$search": query } }
    }

    /// `$set` document for the present fields plus a fresh `updatedAt`
    fn build_update(changes: &ProductChanges) -> StorageResult<Document> {
        let mut set = to_document(changes).map_err(|e| StorageError::Backend(e.to_string()))?;
        let now = to_bson(&chrono::Utc::now()).map_err(|e| StorageError::Backend(e.to_string()))?;
        set.insert("updatedAt", now);
        Ok(doc! { "$set": set })
    }

    fn find_options(skip: u64, limit: u64) -> FindOptions {
        FindOptions::builder()
            .skip(skip)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build()
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    #[instrument(skip(self))]
    async fn find_many(
        &self,
        predicate: &ProductPredicate,
        skip: u64,
        limit: u64,
    ) -> StorageResult<Vec<Product>> {
        // The server reads a zero limit as "no limit".
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(Self::build_filter(predicate))
            .with_options(Self::find_options(skip, limit))
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, predicate: &ProductPredicate) -> StorageResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(predicate))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_one(&self, predicate: &ProductPredicate) -> StorageResult<Option<Product>> {
        let product = self
            .collection
            .find_one(Self::build_filter(predicate))
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &ProductId) -> StorageResult<Option<Product>> {
        let product = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    async fn insert(&self, input: NewProduct) -> StorageResult<Product> {
        let product = Product::new(input);

        if let Err(err) = self.collection.insert_one(&product).await {
            if is_duplicate_key(&err) {
                return Err(StorageError::DuplicateKey {
                    key: "sku",
                    value: product.sku,
                });
            }
            return Err(err.into());
        }

        info!(product_id = %product.id, "Product stored");
        Ok(product)
    }

    #[instrument(skip(self, changes))]
    async fn update_by_id(
        &self,
        id: &ProductId,
        changes: ProductChanges,
    ) -> StorageResult<Option<Product>> {
        let update = Self::build_update(&changes)?;
        let product = self
            .collection
            .find_one_and_update(Self::id_filter(id), update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &ProductId) -> StorageResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn text_search(
        &self,
        query: &str,
        skip: u64,
        limit: u64,
    ) -> StorageResult<Vec<Product>> {
        // The server reads a zero limit as "no limit".
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(Self::text_filter(query))
            .with_options(Self::find_options(skip, limit))
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn text_search_count(&self, query: &str) -> StorageResult<u64> {
        let count = self
            .collection
            .count_documents(Self::text_filter(query))
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn test_build_filter_empty() {
        let doc = MongoProductStore::build_filter(&ProductPredicate::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_with_category_and_brand() {
        let predicate = ProductPredicate {
            category: Some("Electronics".to_string()),
            brand: Some("Apple".to_string()),
            ..Default::default()
        };
        let doc = MongoProductStore::build_filter(&predicate);
        assert_eq!(doc, doc! { "category": "Electronics", "brand": "Apple" });
    }

    #[test]
    fn test_build_filter_with_price_range() {
        let predicate = ProductPredicate {
            min_price: Some(100.0),
            max_price: Some(500.0),
            ..Default::default()
        };
        let doc = MongoProductStore::build_filter(&predicate);
        assert_eq!(doc, doc! { "price": { "$gte": 100.0, "$lte": 500.0 } });
    }

    #[test]
    fn test_build_filter_with_only_min_price() {
        let predicate = ProductPredicate {
            min_price: Some(120.0),
            ..Default::default()
        };
        let doc = MongoProductStore::build_filter(&predicate);
        assert_eq!(doc, doc! { "price": { "$gte": 120.0 } });
    }

    #[test]
    fn test_build_filter_by_sku() {
        let doc = MongoProductStore::build_filter(&ProductPredicate::by_sku("TEST-SKU"));
        assert_eq!(doc, doc! { "sku": "TEST-SKU" });
    }

    #[test]
    fn test_build_update_sets_present_fields_and_timestamp() {
        let changes = ProductChanges {
            name: Some("Updated".to_string()),
            stock: Some(0),
            ..Default::default()
        };
        let update = MongoProductStore::build_update(&changes).unwrap();
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("name").unwrap(), "Updated");
        assert!(set.contains_key("stock"));
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("sku"));
        assert!(!set.contains_key("price"));
    }

    #[test]
    fn test_find_options_clamps_limit() {
        let options = MongoProductStore::find_options(40, u64::MAX);
        assert_eq!(options.skip, Some(40));
        assert_eq!(options.limit, Some(i64::MAX));
    }

    #[test]
    fn test_id_filter_uses_string_id() {
        let doc = MongoProductStore::id_filter(&ProductId::from("abc"));
        assert_eq!(doc.get("_id"), Some(&Bson::String("abc".to_string())));
    }
}
