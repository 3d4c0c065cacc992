//! Route handlers, one module per resource.

pub mod auth;
pub mod health;
pub mod lists;
pub mod products;
pub mod purchases;
