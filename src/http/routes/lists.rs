//! Cart and wishlist handlers.
//!
//! Both lists share the same four operations; the public handlers only pick
//! which [`ProductList`] they act on.

use axum::extract::State;
use axum::Json;

use crate::context::Context;
use crate::error::AppError;
use crate::http::{ApiPath, AuthenticatedUser, MessageResponse};
use crate::models::{Product, ProductList};

pub async fn show_cart(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Product>>, AppError> {
    show(&ctx, ProductList::Cart, &user).await
}

pub async fn add_to_cart(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
    ApiPath(product_id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    add(&ctx, ProductList::Cart, &user, &product_id).await
}

pub async fn remove_from_cart(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
    ApiPath(product_id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    remove(&ctx, ProductList::Cart, &user, &product_id).await
}

pub async fn clear_cart(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
) -> Result<Json<MessageResponse>, AppError> {
    clear(&ctx, ProductList::Cart, &user).await
}

pub async fn show_wishlist(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Product>>, AppError> {
    show(&ctx, ProductList::Wishlist, &user).await
}

pub async fn add_to_wishlist(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
    ApiPath(product_id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    add(&ctx, ProductList::Wishlist, &user, &product_id).await
}

pub async fn remove_from_wishlist(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
    ApiPath(product_id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    remove(&ctx, ProductList::Wishlist, &user, &product_id).await
}

pub async fn clear_wishlist(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
) -> Result<Json<MessageResponse>, AppError> {
    clear(&ctx, ProductList::Wishlist, &user).await
}

async fn show(
    ctx: &Context,
    list: ProductList,
    user: &AuthenticatedUser,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(ctx.relations.list_products(list, user.id()).await?))
}

async fn add(
    ctx: &Context,
    list: ProductList,
    user: &AuthenticatedUser,
    product_id: &str,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.relations
        .add_to_list(list, user.id(), product_id)
        .await?;
    Ok(Json(MessageResponse::new(format!("Product added to {}", list))))
}

async fn remove(
    ctx: &Context,
    list: ProductList,
    user: &AuthenticatedUser,
    product_id: &str,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.relations
        .remove_from_list(list, user.id(), product_id)
        .await?;
    Ok(Json(MessageResponse::new(format!(
        "Product removed from {}",
        list
    ))))
}

async fn clear(
    ctx: &Context,
    list: ProductList,
    user: &AuthenticatedUser,
) -> Result<Json<MessageResponse>, AppError> {
    ctx.relations.clear_list(list, user.id()).await?;
    let message = match list {
        ProductList::Cart => "Cart cleared",
        ProductList::Wishlist => "Wishlist cleared",
    };
    Ok(Json(MessageResponse::new(message)))
}
