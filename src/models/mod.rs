//! Domain models for the storefront graph.

mod product;
mod purchase;
mod user;

pub use product::{bundled_catalog, Category, Product, ProductSeed};
pub use purchase::{ProductList, PurchaseDetails, PurchaseReceipt, PurchaseRecord, Quantity};
pub use user::{normalize_email, PublicUser, User};
