//! Purchase handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::AppError;
use crate::http::{ApiJson, AuthenticatedUser};
use crate::models::{PurchaseReceipt, PurchaseRecord, Quantity};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub receipt: PurchaseReceipt,
}

pub async fn create(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<PurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let quantity = Quantity::new(req.quantity)?;
    let receipt = ctx
        .relations
        .record_purchase(user.id(), &req.product_id, quantity)
        .await?;

    tracing::info!(
        user_id = user.id(),
        product_id = %req.product_id,
        quantity = quantity.get(),
        total = %receipt.total_amount,
        "Purchase recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            message: "Purchase successful",
            receipt,
        }),
    ))
}

pub async fn history(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PurchaseRecord>>, AppError> {
    Ok(Json(ctx.relations.purchase_history(user.id()).await?))
}
