//! Registration, login and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::context::Context;
use crate::error::AppError;
use crate::http::{ApiJson, AuthenticatedUser, MessageResponse};
use crate::models::PublicUser;
use crate::services::{AuthService, AuthSession};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(ctx): State<Context>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthSession>), AppError> {
    let auth: AuthService = ctx.resolve();
    let session = auth.register(&req.name, &req.email, &req.password).await?;
    tracing::info!(user_id = %session.user.id, "User registered");
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(ctx): State<Context>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let auth: AuthService = ctx.resolve();
    Ok(Json(auth.authenticate(&req.email, &req.password).await?))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}

/// The signed-in user's account.
pub async fn me(
    State(ctx): State<Context>,
    user: AuthenticatedUser,
) -> Result<Json<PublicUser>, AppError> {
    let auth: AuthService = ctx.resolve();
    Ok(Json(auth.current_user(user.id()).await?))
}
