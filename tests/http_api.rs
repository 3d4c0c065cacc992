//! End-to-end tests of the REST API over the in-memory store.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use graphmart::config::Config;
use graphmart::context::Context;
use graphmart::http::router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    router(Context::in_memory(Config::default()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn small_catalog() -> Value {
    json!([
        {"id": "A", "name": "Alpha Jacket", "description": "Warm", "price": 10, "category": "Men"},
        {"id": "B", "name": "Bravo Shirt", "description": "Cotton", "price": 20, "category": "Men"},
        {"id": "C", "name": "Charlie Dress", "description": "Summer", "price": 5, "category": "Women"}
    ])
}

async fn seeded_app() -> Router {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/products/init", None, Some(small_catalog())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    app
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Asha", "email": email, "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_init_without_body_loads_bundled_catalog() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/products/init", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 50);
    assert_eq!(body["message"], "Products initialized successfully");

    let (_, products) = send(&app, Method::GET, "/products", None, None).await;
    assert_eq!(products.as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_catalog_reads() {
    let app = seeded_app().await;

    let (status, products) = send(&app, Method::GET, "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Alpha Jacket", "Bravo Shirt", "Charlie Dress"]);

    let (_, product) = send(&app, Method::GET, "/products/A", None, None).await;
    assert_eq!(product["price"], 10.0);
    assert_eq!(product["category"], "Men");

    let (_, men) = send(&app, Method::GET, "/products/category/Men", None, None).await;
    assert_eq!(men.as_array().unwrap().len(), 2);

    let (_, filtered) = send(&app, Method::GET, "/products?category=Women", None, None).await;
    assert_eq!(filtered[0]["id"], "C");

    let (_, found) = send(&app, Method::GET, "/products/search/COTTON", None, None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], "B");

    let (_, similar) = send(&app, Method::GET, "/products/A/similar", None, None).await;
    let bravo = product_json(&app, "B").await;
    assert_eq!(similar, Value::Array(vec![bravo]));

    let (_, categories) = send(&app, Method::GET, "/products/categories", None, None).await;
    assert_eq!(categories[0]["name"], "Men");
    assert_eq!(categories[0]["productCount"], 2);
}

async fn product_json(app: &Router, id: &str) -> Value {
    send(app, Method::GET, &format!("/products/{}", id), None, None)
        .await
        .1
}

#[tokio::test]
async fn test_recommendations_exclude_source() {
    let app = seeded_app().await;

    let (status, recs) = send(&app, Method::GET, "/products/A/recommendations", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = recs
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["B"]);

    let (status, _) = send(
        &app,
        Method::GET,
        "/products/A/recommendations?limit=0",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = seeded_app().await;

    let (status, body) = send(&app, Method::GET, "/products/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "PRODUCT_NOT_FOUND");

    let (status, _) = send(&app, Method::GET, "/products/missing/recommendations", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = app();
    register(&app, "asha@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ASHA@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert!(body["user"].get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "asha@example.com", "password": "wrong-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_CREDENTIALS");

    let (status, body) = send(&app, Method::POST, "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_register_errors() {
    let app = app();
    register(&app, "asha@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Other", "email": "asha@example.com", "password": "hunter22"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "EMAIL_TAKEN");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Other", "email": "other@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = seeded_app().await;

    for (method, uri) in [
        (Method::GET, "/cart"),
        (Method::POST, "/cart/A"),
        (Method::DELETE, "/wishlist"),
        (Method::GET, "/purchases/history"),
    ] {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    let (status, _) = send(&app, Method::GET, "/cart", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_is_a_set() {
    let app = seeded_app().await;
    let token = register(&app, "asha@example.com").await;

    for _ in 0..2 {
        let (status, body) = send(&app, Method::POST, "/cart/A", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product added to cart");
    }

    let (_, cart) = send(&app, Method::GET, "/cart", Some(&token), None).await;
    assert_eq!(cart.as_array().unwrap().len(), 1);
    assert_eq!(cart[0]["id"], "A");

    let (status, body) = send(&app, Method::POST, "/cart/missing", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "PRODUCT_NOT_FOUND");

    send(&app, Method::DELETE, "/cart/A", Some(&token), None).await;
    let (_, cart) = send(&app, Method::GET, "/cart", Some(&token), None).await;
    assert_eq!(cart, json!([]));
}

#[tokio::test]
async fn test_wishlist_is_per_user() {
    let app = seeded_app().await;
    let asha = register(&app, "asha@example.com").await;
    let ben = register(&app, "ben@example.com").await;

    send(&app, Method::POST, "/wishlist/B", Some(&asha), None).await;
    send(&app, Method::POST, "/wishlist/C", Some(&asha), None).await;

    let (_, wishlist) = send(&app, Method::GET, "/wishlist", Some(&asha), None).await;
    assert_eq!(wishlist.as_array().unwrap().len(), 2);

    let (_, other) = send(&app, Method::GET, "/wishlist", Some(&ben), None).await;
    assert_eq!(other, json!([]));

    let (_, body) = send(&app, Method::DELETE, "/wishlist", Some(&asha), None).await;
    assert_eq!(body["message"], "Wishlist cleared");
    let (_, wishlist) = send(&app, Method::GET, "/wishlist", Some(&asha), None).await;
    assert_eq!(wishlist, json!([]));
}

#[tokio::test]
async fn test_purchase_and_history() {
    let app = seeded_app().await;
    let token = register(&app, "asha@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/purchases",
        Some(&token),
        Some(json!({"productId": "A", "quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Purchase successful");
    assert_eq!(body["totalAmount"], 30.0);
    assert_eq!(body["product"]["id"], "A");

    let (_, history) = send(&app, Method::GET, "/purchases/history", Some(&token), None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["product"]["id"], "A");
    assert_eq!(history[0]["purchaseDetails"]["quantity"], 3);
    assert_eq!(history[0]["purchaseDetails"]["totalAmount"], 30.0);
}

#[tokio::test]
async fn test_purchase_rejects_bad_quantity() {
    let app = seeded_app().await;
    let token = register(&app, "asha@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/purchases",
        Some(&token),
        Some(json!({"productId": "A", "quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (_, history) = send(&app, Method::GET, "/purchases/history", Some(&token), None).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_init_rejects_malformed_catalog() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/products/init",
        None,
        Some(json!([{"id": "A", "name": "No price"}])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_query_is_json_validation_error() {
    let app = seeded_app().await;

    for uri in [
        "/products/A/recommendations?limit=-1",
        "/products/A/recommendations?limit=abc",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "VALIDATION_ERROR", "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_purchase_total_out_of_range() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/products/init",
        None,
        Some(json!([
            {"id": "X", "name": "Yacht", "price": 100_000_000_000i64, "category": "Luxury"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = register(&app, "asha@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/purchases",
        Some(&token),
        Some(json!({"productId": "X", "quantity": i64::MAX})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (_, history) = send(&app, Method::GET, "/purchases/history", Some(&token), None).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_me_returns_account_until_reseed() {
    let app = seeded_app().await;
    let token = register(&app, "asha@example.com").await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "asha@example.com");
    assert!(body.get("password").is_none());

    let (status, _) = send(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Seeding wipes the whole graph, users included
    send(&app, Method::POST, "/products/init", None, Some(small_catalog())).await;
    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "USER_NOT_FOUND");
}
