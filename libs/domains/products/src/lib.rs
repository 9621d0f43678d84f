//! Products Domain
//!
//! Catalog access layer for product records: paginated listing with
//! filters, full-text search and single-record CRUD, with SKU uniqueness and
//! a typed not-found / conflict contract.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Invariants, error taxonomy
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Filters, pagination envelopes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │Storage port │  ← ProductStore trait (MongoDB, in-memory)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_products::{
//!     CatalogConfig, MongoProductStore, ProductQuery, ProductService, StoreProductRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CatalogConfig::from_env()?;
//! let store = MongoProductStore::connect(&config).await?;
//! store.init_indexes().await?;
//!
//! let service = ProductService::new(StoreProductRepository::new(store));
//! let page = service.list_products(ProductQuery::default()).await?;
//! println!("{} products", page.total);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use memory::InMemoryProductStore;
pub use models::{
    NewProduct, PageRequest, Product, ProductChanges, ProductId, ProductPage, ProductPatch,
    ProductQuery,
};
pub use crate::mongodb::MongoProductStore;
pub use repository::{ProductRepository, StoreProductRepository};
pub use service::ProductService;
pub use storage::{ProductPredicate, ProductStore, StorageError, StorageResult};
