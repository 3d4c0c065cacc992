//! Dependency injection infrastructure.
//!
//! Resolution is plain trait dispatch: no registry and no runtime lookup.
//!
//! - `FromRef<T>`: extract a value from a reference to `T`
//! - `#[derive(Context)]`: makes each field of the root context extractable
//! - `#[derive(FromContext)]`: builds a struct by resolving every field
//!
//! # Example
//!
//! ```ignore
//! use crate::di::{Context, FromContext};
//!
//! #[derive(Context, Clone)]
//! pub struct Context {
//!     pub users: AppUsers,
//!     pub tokens: TokenService,
//! }
//!
//! #[derive(FromContext, Clone)]
//! pub struct AuthService {
//!     users: AppUsers,       // resolved via FromRef<Context>
//!     tokens: TokenService,
//! }
//!
//! let auth: AuthService = ctx.resolve();
//! ```

/// Extracts a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any `Clone` type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};
