//! Shared test utilities for domain testing
//!
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongodb")
//! - `TestDataBuilder`: deterministic names and SKUs (always available)
//! - `assertions`: custom assertion helpers (always available)
//!
//! # Usage
//!
//! Add `features = ["mongodb"]` to your dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["mongodb"] }
//! ```
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_mongo_test");
//!     let db = mongo.database(&builder.database_name());
//!     let sku = builder.sku("main");
//! }
//! ```

#[cfg(feature = "mongodb")]
mod mongodb;

#[cfg(feature = "mongodb")]
pub use crate::mongodb::TestMongo;

/// Builder for test data with deterministic values
///
/// Values derive from a seed so that a test produces the same data on every
/// run, while different tests do not collide on unique keys.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_product");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// A SKU unique to this builder
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.sku("a"), "SKU-7-A");
    /// ```
    pub fn sku(&self, suffix: &str) -> String {
        format!("SKU-{}-{}", self.seed, suffix.to_uppercase())
    }

    /// A human-readable name unique to this builder
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Database name for isolating one test's data on a shared server
    pub fn database_name(&self) -> String {
        format!("test_{:x}", self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that `items` projected through `key` equals `expected`, in any order
    pub fn assert_same_members<T, K, F>(items: &[T], key: F, expected: &[K], context: &str)
    where
        K: Ord + Clone + std::fmt::Debug,
        F: Fn(&T) -> K,
    {
        let mut actual: Vec<K> = items.iter().map(key).collect();
        let mut expected = expected.to_vec();
        actual.sort();
        expected.sort();
        assert_eq!(actual, expected, "{}", context);
    }
}
