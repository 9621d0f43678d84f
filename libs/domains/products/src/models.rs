use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Opaque product identifier.
///
/// Assigned by the store on insert and never reassigned. Callers treat it as
/// an opaque string; lookups with an unknown value are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Generate a fresh, time-ordered identifier
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Product entity - a catalog record as persisted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    /// Stock keeping unit, unique and immutable
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub brand: String,
    pub image_url: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Price must be a finite, non-negative number
fn validate_price(price: f64) -> Result<(), validator::ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(validator::ValidationError::new("invalid_price"));
    }
    Ok(())
}

/// DTO for creating a new product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub subcategory: String,
    #[validate(custom(function = "validate_price"))]
    pub price: f64,
    #[validate(length(min = 1))]
    pub brand: String,
    #[validate(url)]
    pub image_url: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub stock: u32,
}

/// Partial update as supplied by a caller.
///
/// `None` leaves the stored value untouched; `Some` replaces it, including
/// with zero or an empty list. Present fields obey the same rules as
/// [`NewProduct`]. A `sku` may be present on the wire but is
/// never applied (see [`ProductPatch::into_changes`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub subcategory: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<f64>,
    #[validate(length(min = 1))]
    pub brand: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub stock: Option<u32>,
}

impl ProductPatch {
    /// Drop the immutable `sku` and return the fields a store may write.
    ///
    /// The discarded SKU, if any, is returned alongside so callers can log it.
    pub fn into_changes(self) -> (ProductChanges, Option<String>) {
        let changes = ProductChanges {
            name: self.name,
            description: self.description,
            category: self.category,
            subcategory: self.subcategory,
            price: self.price,
            brand: self.brand,
            image_url: self.image_url,
            features: self.features,
            specifications: self.specifications,
            stock: self.stock,
        };
        (changes, self.sku)
    }
}

/// Storage-facing update set. Has no `sku` field by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// Criteria for a paginated catalog listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
        }
    }
}

impl ProductQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// One-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Records to skip before this page starts
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`; zero when there is nothing to page through
    pub fn total_pages(&self, total: u64) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        total.div_ceil(self.limit)
    }
}

/// Pagination envelope shared by listing and search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl ProductPage {
    pub fn new(products: Vec<Product>, total: u64, request: PageRequest) -> Self {
        Self {
            products,
            total,
            page: request.page,
            total_pages: request.total_pages(total),
        }
    }
}

impl Product {
    /// Materialize a new record with a fresh id and timestamps
    pub fn new(input: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            sku: input.sku,
            name: input.name,
            description: input.description,
            category: input.category,
            subcategory: input.subcategory,
            price: input.price,
            brand: input.brand,
            image_url: input.image_url,
            features: input.features,
            specifications: input.specifications,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the present fields of `changes` and refresh `updated_at`
    pub fn apply_changes(&mut self, changes: ProductChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(subcategory) = changes.subcategory {
            self.subcategory = subcategory;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(brand) = changes.brand {
            self.brand = brand;
        }
        if let Some(image_url) = changes.image_url {
            self.image_url = image_url;
        }
        if let Some(features) = changes.features {
            self.features = features;
        }
        if let Some(specifications) = changes.specifications {
            self.specifications = specifications;
        }
        if let Some(stock) = changes.stock {
            self.stock = stock;
        }
        self.updated_at = Utc::now().max(self.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            sku: "SKU-1".to_string(),
            name: "Laptop".to_string(),
            description: "A light laptop".to_string(),
            category: "Electronics".to_string(),
            subcategory: "Computers".to_string(),
            price: 999.0,
            brand: "Acme".to_string(),
            image_url: "https://img.example.com/laptop.png".to_string(),
            features: vec!["16GB RAM".to_string()],
            specifications: BTreeMap::from([("cpu".to_string(), "8 cores".to_string())]),
            stock: 3,
        }
    }

    #[test]
    fn test_page_request_skip() {
        assert_eq!(PageRequest::new(1, 10).skip(), 0);
        assert_eq!(PageRequest::new(3, 10).skip(), 20);
        assert_eq!(PageRequest::new(0, 10).skip(), 0);
        assert_eq!(PageRequest::new(u64::MAX, u64::MAX).skip(), u64::MAX);
    }

    #[test]
    fn test_page_request_total_pages() {
        let request = PageRequest::new(1, 10);
        assert_eq!(request.total_pages(0), 0);
        assert_eq!(request.total_pages(1), 1);
        assert_eq!(request.total_pages(10), 1);
        assert_eq!(request.total_pages(11), 2);
        assert_eq!(PageRequest::new(1, 0).total_pages(5), 0);
    }

    #[test]
    fn test_product_query_defaults() {
        let query: ProductQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, ProductQuery::default());
        assert_eq!(query.page_request(), PageRequest::new(1, 20));
    }

    #[test]
    fn test_new_product_validation() {
        assert!(new_product().validate().is_ok());

        let negative_price = NewProduct {
            price: -1.0,
            ..new_product()
        };
        assert!(negative_price.validate().is_err());

        let bad_url = NewProduct {
            image_url: "not a url".to_string(),
            ..new_product()
        };
        assert!(bad_url.validate().is_err());

        let blank_sku = NewProduct {
            sku: String::new(),
            ..new_product()
        };
        assert!(blank_sku.validate().is_err());
    }

    #[test]
    fn test_price_must_be_finite() {
        for price in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let input = NewProduct {
                price,
                ..new_product()
            };
            assert!(input.validate().is_err(), "price {price} should be rejected");

            let patch = ProductPatch {
                price: Some(price),
                ..Default::default()
            };
            assert!(patch.validate().is_err(), "patch price {price} should be rejected");
        }
        assert!(ProductPatch {
            price: Some(0.0),
            ..Default::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_patch_rejects_blank_required_fields() {
        let blank: [fn(&mut ProductPatch); 5] = [
            |p| p.name = Some(String::new()),
            |p| p.description = Some(String::new()),
            |p| p.category = Some(String::new()),
            |p| p.subcategory = Some(String::new()),
            |p| p.brand = Some(String::new()),
        ];
        for set_blank in blank {
            let mut patch = ProductPatch::default();
            set_blank(&mut patch);
            assert!(patch.validate().is_err(), "{patch:?} should be rejected");
        }

        let zeroes = ProductPatch {
            stock: Some(0),
            features: Some(vec![]),
            specifications: Some(BTreeMap::new()),
            ..Default::default()
        };
        assert!(zeroes.validate().is_ok());
        assert!(ProductPatch::default().validate().is_ok());
    }

    #[test]
    fn test_new_product_stock_defaults_to_zero() {
        let json = serde_json::json!({
            "sku": "SKU-2",
            "name": "Mug",
            "description": "Ceramic mug",
            "category": "Home",
            "subcategory": "Kitchen",
            "price": 9.5,
            "brand": "Acme",
            "imageUrl": "https://img.example.com/mug.png"
        });
        let input: NewProduct = serde_json::from_value(json).unwrap();
        assert_eq!(input.stock, 0);
        assert!(input.features.is_empty());
        assert!(input.specifications.is_empty());
    }

    #[test]
    fn test_patch_into_changes_strips_sku() {
        let patch = ProductPatch {
            sku: Some("NEW".to_string()),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let (changes, dropped) = patch.into_changes();
        assert_eq!(dropped.as_deref(), Some("NEW"));
        assert_eq!(changes.name.as_deref(), Some("Renamed"));
        assert!(changes.price.is_none());
    }

    #[test]
    fn test_changes_serialize_only_present_fields() {
        let changes = ProductChanges {
            description: Some("A".to_string()),
            stock: Some(0),
            ..Default::default()
        };
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value, serde_json::json!({ "description": "A", "stock": 0 }));
    }

    #[test]
    fn test_apply_changes_keeps_absent_fields() {
        let mut product = Product::new(new_product());
        let created_at = product.created_at;

        product.apply_changes(ProductChanges {
            price: Some(0.0),
            features: Some(vec![]),
            ..Default::default()
        });

        assert_eq!(product.price, 0.0);
        assert!(product.features.is_empty());
        assert_eq!(product.name, "Laptop");
        assert_eq!(product.sku, "SKU-1");
        assert_eq!(product.created_at, created_at);
        assert!(product.updated_at >= product.created_at);
    }

    #[test]
    fn test_page_envelope_shape() {
        let page = ProductPage::new(vec![], 0, PageRequest::new(2, 10));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "products": [], "total": 0, "page": 2, "totalPages": 0 })
        );
    }

    #[test]
    fn test_product_id_roundtrips_as_mongo_id() {
        let product = Product::new(new_product());
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["_id"], serde_json::json!(product.id.as_str()));
        assert!(value.get("imageUrl").is_some());
    }
}
