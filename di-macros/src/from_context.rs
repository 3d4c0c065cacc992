//! `#[derive(FromContext)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::named_fields;

pub fn derive_from_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let context_type = match parse_context_type(&input) {
        Ok(ty) => ty,
        Err(e) => return e.to_compile_error().into(),
    };

    let fields = match named_fields(&input, "FromContext") {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_inits = fields.iter().filter_map(|field| {
        let field_name = field.ident.as_ref()?;
        let field_type = &field.ty;

        Some(quote! {
            #field_name: <#field_type as crate::FromRef<#context_type>>::from_ref(ctx)
        })
    });

    TokenStream::from(quote! {
        impl #impl_generics crate::FromRef<#context_type> for #name #ty_generics #where_clause {
            fn from_ref(ctx: &#context_type) -> Self {
                Self {
                    #(#field_inits),*
                }
            }
        }
    })
}

/// Reads `#[from_context(Context = "Type")]`, defaulting to `Context`.
fn parse_context_type(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let mut context_ty: Option<syn::Type> = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("from_context") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("Context") {
                let value: syn::LitStr = meta.value()?.parse()?;
                context_ty = Some(value.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `Context = \"Type\"`"))
            }
        })?;
    }

    Ok(match context_ty {
        Some(ty) => quote! { #ty },
        None => quote! { Context },
    })
}
