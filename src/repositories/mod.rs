//! Data access layer.
//!
//! Each contract is a trait with two implementations: a Cypher one running
//! against any [`CypherExecutor`](crate::graph::CypherExecutor), and
//! [`MemoryStore`], an in-process arena used for tests and local runs. The
//! [`Context`](crate::context::Context) holds them as trait objects.

mod catalog;
mod relation;
mod schema;
mod user;

pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    Category, Product, ProductList, ProductSeed, PurchaseReceipt, PurchaseRecord, Quantity, User,
};

pub use catalog::CypherCatalogRepository;
pub use memory::MemoryStore;
pub use relation::CypherRelationRepository;
pub use schema::AgeSchemaRepository;
pub use user::CypherUserRepository;

/// How many recommendations are returned when the caller does not say.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// Products, categories and the edges between them.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All products sorted by name, optionally restricted to one category.
    async fn list_all(&self, category: Option<&str>) -> Result<Vec<Product>, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Product, AppError>;

    /// Products linked to `category` by a BELONGS_TO edge, sorted by name.
    async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, AppError>;

    /// Case-insensitive substring match on name, description or category.
    async fn search(&self, term: &str) -> Result<Vec<Product>, AppError>;

    /// Products sharing a category with `id`.
    ///
    /// Ranked by shared categories, then by the number of distinct users who
    /// bought or liked the candidate, then by id. Never includes `id` itself.
    async fn recommend(&self, id: &str, limit: usize) -> Result<Vec<Product>, AppError>;

    /// Products joined to `id` by SIMILAR_TO in either direction.
    async fn similar(&self, id: &str) -> Result<Vec<Product>, AppError>;

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;

    /// Replaces the whole graph with `products`; returns the product count.
    async fn seed(&self, products: &[ProductSeed]) -> Result<usize, AppError>;
}

/// Per-user edges to products.
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// Idempotent; fails with `ProductNotFound` for unknown products.
    async fn add_to_list(
        &self,
        list: ProductList,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), AppError>;

    async fn remove_from_list(
        &self,
        list: ProductList,
        user_id: &str,
        product_id: &str,
    ) -> Result<(), AppError>;

    async fn clear_list(&self, list: ProductList, user_id: &str) -> Result<(), AppError>;

    /// Products on the list, sorted by name.
    async fn list_products(&self, list: ProductList, user_id: &str)
        -> Result<Vec<Product>, AppError>;

    /// Appends a PURCHASED edge priced at the product's current price.
    async fn record_purchase(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: Quantity,
    ) -> Result<PurchaseReceipt, AppError>;

    /// Newest first.
    async fn purchase_history(&self, user_id: &str) -> Result<Vec<PurchaseRecord>, AppError>;

    async fn add_to_cart(&self, user_id: &str, product_id: &str) -> Result<(), AppError> {
        self.add_to_list(ProductList::Cart, user_id, product_id).await
    }

    async fn remove_from_cart(&self, user_id: &str, product_id: &str) -> Result<(), AppError> {
        self.remove_from_list(ProductList::Cart, user_id, product_id)
            .await
    }

    async fn clear_cart(&self, user_id: &str) -> Result<(), AppError> {
        self.clear_list(ProductList::Cart, user_id).await
    }

    async fn list_cart(&self, user_id: &str) -> Result<Vec<Product>, AppError> {
        self.list_products(ProductList::Cart, user_id).await
    }

    async fn add_to_wishlist(&self, user_id: &str, product_id: &str) -> Result<(), AppError> {
        self.add_to_list(ProductList::Wishlist, user_id, product_id)
            .await
    }

    async fn remove_from_wishlist(&self, user_id: &str, product_id: &str) -> Result<(), AppError> {
        self.remove_from_list(ProductList::Wishlist, user_id, product_id)
            .await
    }

    async fn clear_wishlist(&self, user_id: &str) -> Result<(), AppError> {
        self.clear_list(ProductList::Wishlist, user_id).await
    }

    async fn list_wishlist(&self, user_id: &str) -> Result<Vec<Product>, AppError> {
        self.list_products(ProductList::Wishlist, user_id).await
    }
}

/// Registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `EmailTaken` when the email is already registered.
    async fn create(&self, user: &User) -> Result<(), AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

/// Uniqueness constraints and indexes.
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Idempotent; safe on every start.
    async fn ensure_schema(&self) -> Result<(), AppError>;
}

/// Rejects catalogs with invalid entries or repeated ids.
pub(crate) fn validate_seeds(products: &[ProductSeed]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for seed in products {
        seed.validate()?;
        if !seen.insert(seed.id.as_str()) {
            return Err(AppError::Validation(format!(
                "product id {} appears more than once",
                seed.id
            )));
        }
    }
    Ok(())
}
