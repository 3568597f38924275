use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use storefront_store::api::{self, AppState, ACTOR_HEADER};
use storefront_store::{ProductInput, ProductStatus, Role, ShopStore, Store, UserInput};
use tower::ServiceExt;

struct Harness {
    app: Router,
    admin_id: String,
    editor_id: String,
}

fn harness() -> Harness {
    let mut store = Store::new();
    let user = |email: &str, role| UserInput { email: email.into(), name: "Staff".into(), role, active: true, password_hash: None };
    let admin_id = store.create_user(user("admin@shop.test", Role::Admin)).unwrap().id;
    let editor_id = store.create_user(user("editor@shop.test", Role::Editor)).unwrap().id;
    store.create_product(ProductInput {
        name: "Desk Lamp".into(),
        price: Decimal::new(3000, 2),
        sale_price: Some(Decimal::new(2400, 2)),
        stock: 5,
        status: ProductStatus::Active,
        ..Default::default()
    }).unwrap();
    store.create_product(ProductInput { name: "Prototype".into(), price: Decimal::ONE, ..Default::default() }).unwrap();
    store.take_events();

    let app = api::router(AppState::new(ShopStore::from_store(store)));
    Harness { app, admin_id, editor_id }
}

async fn send(app: &Router, method: &str, uri: &str, actor: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        request = request.header(ACTOR_HEADER, actor);
    }
    let request = match body {
        Some(body) => request.header("content-type", "application/json").body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }.unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn huge_page_number_returns_empty_page() {
    let h = harness();
    let uri = format!("/api/v1/products?page={}", u64::MAX);
    let (status, body) = send(&h.app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn storefront_lists_only_active_products() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/api/v1/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["slug"], "desk-lamp");
    assert_eq!(body["items"][0]["on_sale"], true);
    assert_eq!(body["items"][0]["discount_percent"], 20);

    let (status, _) = send(&h.app, "GET", "/api/v1/products/prototype", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&h.app, "GET", "/api/v1/products/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Desk Lamp");
}

#[tokio::test]
async fn admin_routes_require_actor_and_permission() {
    let h = harness();
    let product = json!({ "name": "Chair", "price": "80.00", "status": "active" });

    let (status, body) = send(&h.app, "POST", "/api/v1/admin/products", None, Some(product.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&h.app, "GET", "/api/v1/admin/orders", Some(&h.editor_id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&h.app, "POST", "/api/v1/admin/products", Some(&h.editor_id), Some(product)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "0003");
    assert_eq!(body["sku"], "SKU-0003");
}

#[tokio::test]
async fn checkout_places_order_and_takes_stock() {
    let h = harness();
    let checkout = json!({
        "email": "buyer@example.com",
        "customer_name": "Buyer",
        "items": [{ "product_id": "1", "quantity": 2 }],
        "shipping_address": { "name": "Buyer", "street1": "1 Main St", "city": "Springfield", "zip": "12345", "country": "US" }
    });

    let (status, quote) = send(&h.app, "POST", "/api/v1/checkout/quote", None, Some(checkout.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["subtotal"], "48.00");

    let (status, order) = send(&h.app, "POST", "/api/v1/checkout", None, Some(checkout.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["id"], "0001");
    assert_eq!(order["status"], "pending");

    let (_, product) = send(&h.app, "GET", "/api/v1/admin/products/0001", Some(&h.admin_id), None).await;
    assert_eq!(product["stock"], 3);

    let mut greedy = checkout;
    greedy["items"][0]["quantity"] = json!(10);
    let (status, body) = send(&h.app, "POST", "/api/v1/checkout", None, Some(greedy)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");

    let (status, cancelled) = send(&h.app, "PUT", "/api/v1/admin/orders/1/status", Some(&h.admin_id), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    let (_, product) = send(&h.app, "GET", "/api/v1/admin/products/0001", Some(&h.admin_id), None).await;
    assert_eq!(product["stock"], 5);

    let (status, body) = send(&h.app, "PUT", "/api/v1/admin/orders/1/status", Some(&h.admin_id), Some(json!({ "status": "shipped" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn review_moderation_flow() {
    let h = harness();
    let review = json!({ "author_name": "Ann", "rating": 4, "body": "Bright enough" });
    let (status, created) = send(&h.app, "POST", "/api/v1/products/desk-lamp/reviews", None, Some(review)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");

    let (_, listed) = send(&h.app, "GET", "/api/v1/products/desk-lamp/reviews", None, None).await;
    assert_eq!(listed["reviews"].as_array().unwrap().len(), 0);

    let uri = format!("/api/v1/admin/reviews/{}/status", created["id"].as_str().unwrap());
    let (status, _) = send(&h.app, "PUT", &uri, Some(&h.editor_id), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&h.app, "GET", "/api/v1/products/desk-lamp/reviews", None, None).await;
    assert_eq!(listed["rating"]["count"], 1);
    assert_eq!(listed["rating"]["average"], 4.0);
}

#[tokio::test]
async fn dashboard_is_served_to_staff() {
    let h = harness();
    let (status, stats) = send(&h.app, "GET", "/api/v1/admin/dashboard", Some(&h.admin_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["product_count"], 2);
    assert_eq!(stats["orders_by_status"]["pending"], 0);
}
