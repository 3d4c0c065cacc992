//! REST façade over the repositories and the auth service.
//!
//! | Prefix        | Auth   | Handlers                  |
//! |---------------|--------|---------------------------|
//! | `/products`   | none   | [`routes::products`]      |
//! | `/auth`       | none   | [`routes::auth`]          |
//! | `/auth/me`    | bearer | [`routes::auth`]          |
//! | `/cart`       | bearer | [`routes::lists`]         |
//! | `/wishlist`   | bearer | [`routes::lists`]         |
//! | `/purchases`  | bearer | [`routes::purchases`]     |
//! | `/health`     | none   | [`routes::health`]        |

pub mod extract;
pub mod routes;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::Context;

pub use extract::{require_auth, ApiJson, ApiPath, ApiQuery, AuthenticatedUser};

/// Body of responses that only carry a confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the application router.
pub fn router(ctx: Context) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let products = Router::new()
        .route("/", get(routes::products::list))
        .route("/categories", get(routes::products::categories))
        .route("/init", post(routes::products::init))
        .route("/category/{name}", get(routes::products::by_category))
        .route("/search/{term}", get(routes::products::search))
        .route("/{id}", get(routes::products::get))
        .route("/{id}/recommendations", get(routes::products::recommendations))
        .route("/{id}/similar", get(routes::products::similar));

    let auth = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    // route_layer keeps unknown paths at 404 instead of 401
    let protected = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/cart",
            get(routes::lists::show_cart).delete(routes::lists::clear_cart),
        )
        .route(
            "/cart/{product_id}",
            post(routes::lists::add_to_cart).delete(routes::lists::remove_from_cart),
        )
        .route(
            "/wishlist",
            get(routes::lists::show_wishlist).delete(routes::lists::clear_wishlist),
        )
        .route(
            "/wishlist/{product_id}",
            post(routes::lists::add_to_wishlist).delete(routes::lists::remove_from_wishlist),
        )
        .route("/purchases", post(routes::purchases::create))
        .route("/purchases/history", get(routes::purchases::history))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), require_auth));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/products", products)
        .nest("/auth", auth)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}
