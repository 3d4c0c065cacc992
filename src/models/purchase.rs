//! User-to-product relationships: cart and wishlist membership, purchases.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;
use crate::error::AppError;

/// A per-user set of products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductList {
    Cart,
    Wishlist,
}

impl ProductList {
    /// Edge type linking a user to the products on this list.
    pub fn edge_type(&self) -> &'static str {
        match self {
            ProductList::Cart => "ADDED_TO_CART",
            ProductList::Wishlist => "LIKES",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProductList::Cart => "cart",
            ProductList::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for ProductList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A purchase quantity; always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, AppError> {
        if value < 1 {
            return Err(AppError::Validation(format!(
                "quantity must be at least 1, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Total for this many units at `unit_price`.
    pub fn total(self, unit_price: Decimal) -> Result<Decimal, AppError> {
        unit_price
            .checked_mul(Decimal::from(self.0))
            .ok_or_else(|| AppError::Validation("purchase total out of range".into()))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// Properties of a PURCHASED edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetails {
    pub quantity: i64,
    /// Unit price at purchase time times quantity; never recomputed.
    pub total_amount: Decimal,
    pub purchase_date: DateTime<Utc>,
}

/// One entry of a user's purchase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub product: Product,
    pub purchase_details: PurchaseDetails,
}

/// Result of recording a purchase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub product: Product,
    pub quantity: Quantity,
    pub total_amount: Decimal,
    pub purchase_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quantity_rejects_non_positive() {
        assert!(matches!(Quantity::new(0), Err(AppError::Validation(_))));
        assert!(matches!(Quantity::new(-3), Err(AppError::Validation(_))));
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_quantity_deserialize_validates() {
        assert!(serde_json::from_value::<Quantity>(json!(0)).is_err());
        assert_eq!(
            serde_json::from_value::<Quantity>(json!(2)).unwrap(),
            Quantity::new(2).unwrap()
        );
    }

    #[test]
    fn test_quantity_total() {
        let total = Quantity::new(3).unwrap().total(Decimal::new(1000, 2)).unwrap();
        assert_eq!(total, Decimal::new(3000, 2));
    }

    #[test]
    fn test_quantity_total_overflow_is_validation_error() {
        let quantity = Quantity::new(i64::MAX).unwrap();
        assert!(matches!(
            quantity.total(Decimal::from(100_000_000_000i64)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_list_edge_types() {
        assert_eq!(ProductList::Cart.edge_type(), "ADDED_TO_CART");
        assert_eq!(ProductList::Wishlist.edge_type(), "LIKES");
    }
}
