//! graphmart - graph-backed e-commerce storefront
//!
//! Products, categories and per-user cart, wishlist and purchase edges live
//! in a property graph (PostgreSQL + Apache AGE, or an in-memory arena),
//! served over a small REST API.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod graph;
pub mod http;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
