//! Catalog route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::AppError;
use crate::http::{ApiPath, ApiQuery};
use crate::models::{bundled_catalog, Category, Product, ProductSeed};
use crate::repositories::DEFAULT_RECOMMENDATION_LIMIT;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: &'static str,
    pub count: usize,
}

pub async fn list(
    State(ctx): State<Context>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let category = params.category.as_deref().filter(|c| !c.is_empty());
    Ok(Json(ctx.catalog.list_all(category).await?))
}

pub async fn categories(State(ctx): State<Context>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(ctx.catalog.list_categories().await?))
}

pub async fn get(
    State(ctx): State<Context>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(ctx.catalog.get_by_id(&id).await?))
}

pub async fn by_category(
    State(ctx): State<Context>,
    ApiPath(name): ApiPath<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(ctx.catalog.get_by_category(&name).await?))
}

pub async fn search(
    State(ctx): State<Context>,
    ApiPath(term): ApiPath<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(ctx.catalog.search(&term).await?))
}

pub async fn recommendations(
    State(ctx): State<Context>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<RecommendParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".into()));
    }
    Ok(Json(ctx.catalog.recommend(&id, limit).await?))
}

pub async fn similar(
    State(ctx): State<Context>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(ctx.catalog.similar(&id).await?))
}

/// Replaces the catalog with the posted products, or the bundled catalog
/// when the body is empty.
pub async fn init(State(ctx): State<Context>, body: Bytes) -> Result<Json<SeedResponse>, AppError> {
    let seeds: Vec<ProductSeed> = if body.iter().all(u8::is_ascii_whitespace) {
        bundled_catalog()?
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid catalog: {}", e)))?
    };

    let _guard = ctx.seed_lock.acquire().await;
    let count = ctx.catalog.seed(&seeds).await?;
    tracing::info!(count, "Catalog seeded");

    Ok(Json(SeedResponse {
        message: "Products initialized successfully",
        count,
    }))
}
