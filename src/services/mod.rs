//! Business logic services.
//!
//! Services orchestrate repositories and handle business rules,
//! using the `FromContext` derive macro for dependency injection.

mod auth;
mod token;

pub use auth::{AuthService, AuthSession};
pub use token::{Claims, TokenService};
