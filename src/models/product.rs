//! Catalog models: products and the categories they belong to.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// Products are created by catalog seeding and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier, assigned by the catalog source.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price; never negative.
    pub price: Decimal,
    /// Category name, mirrored by the BELONGS_TO edge.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Informational only; purchases do not decrement it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One entry of a catalog load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ProductSeed {
    /// Rejects seeds that would break catalog invariants.
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.id.trim().is_empty() {
            return Err(AppError::Validation("product id must not be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "product {} has no category",
                self.id
            )));
        }
        if self.price.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "product {} has a negative price",
                self.id
            )));
        }
        Ok(())
    }

    /// The product this seed creates; tags start as `[category]`.
    pub fn to_product(&self) -> Product {
        Product {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            category: self.category.clone(),
            image_url: self.image_url.clone(),
            stock: self.stock,
            tags: vec![self.category.clone()],
        }
    }
}

/// A product category with the number of products filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub product_count: i64,
}

/// The catalog bundled with the binary.
const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Parses the bundled sample catalog.
pub fn bundled_catalog() -> Result<Vec<ProductSeed>, crate::error::AppError> {
    serde_json::from_str(BUNDLED_CATALOG).map_err(|e| {
        crate::error::AppError::Internal(format!("bundled catalog is malformed: {}", e))
    })
}
