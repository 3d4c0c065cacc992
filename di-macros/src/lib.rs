//! Compile-time dependency injection macros for graphmart.
//!
//! - `#[derive(Context)]` makes each field of a root context extractable
//! - `#[derive(FromContext)]` builds a struct by resolving its fields from a context
//!
//! Generated code references `crate::FromRef`, so the consuming crate must
//! define or re-export that trait at its root.

use proc_macro::TokenStream;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Field, Fields, Token};

mod context;
mod from_context;

/// Derive macro for the root DI context.
///
/// Generates one `FromRef<Self>` implementation per field, returning a clone
/// of that field. Field types must be `Clone` and pairwise distinct.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub users: AppUsers,
///     pub tokens: TokenService,
/// }
///
/// // impl FromRef<Context> for AppUsers { ... }
/// // impl FromRef<Context> for TokenService { ... }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Derive macro for types that can be constructed from a context.
///
/// Each field is resolved with `FromRef::from_ref(ctx)`. The context type
/// defaults to `Context`; override it with
/// `#[from_context(Context = "OtherContext")]`.
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct AuthService {
///     users: AppUsers,
///     tokens: TokenService,
/// }
///
/// let auth: AuthService = ctx.resolve();
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}

/// Named fields of a struct, or a spanned error naming the derive.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Token![,]>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{} can only be derived for structs with named fields", derive),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{} can only be derived for structs", derive),
        )),
    }
}
