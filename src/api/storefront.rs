//! Public storefront routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::aggregates::*;
use crate::store::{Paginated, ProductQuery, Store};
use crate::{Result, StoreError};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:key", get(get_product))
        .route("/products/:key/reviews", get(list_reviews).post(submit_review))
        .route("/categories", get(list_categories))
        .route("/tags", get(list_tags))
        .route("/pages", get(list_pages))
        .route("/pages/:slug", get(get_page))
        .route("/settings", get(get_settings))
        .route("/coupons/validate", post(validate_coupon))
        .route("/checkout/quote", post(quote_checkout))
        .route("/checkout", post(checkout))
        .route("/tickets", post(open_ticket))
}

/// A product as shown to shoppers: current price and rating included.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: Decimal,
    pub on_sale: bool,
    pub discount_percent: Option<u32>,
    pub rating: RatingSummary,
}

impl ProductView {
    fn build(store: &Store, product: &Product) -> Self {
        let now = Utc::now();
        Self {
            product: product.clone(),
            effective_price: product.effective_price(now),
            on_sale: product.on_sale(now),
            discount_percent: product.discount_percent(now),
            rating: store.product_rating(&product.id),
        }
    }
}

/// Active product by id or slug.
fn active_product<'a>(store: &'a Store, key: &str) -> Option<&'a Product> {
    store.product(key).or_else(|| store.product_by_slug(key)).filter(|p| p.is_active())
}

async fn list_products(State(s): State<AppState>, Query(mut q): Query<ProductQuery>) -> Json<Paginated<ProductView>> {
    q.status = Some(ProductStatus::Active);
    Json(s.store.read(|store| {
        let page = store.list_products(&q, Utc::now());
        let items = page.items.iter().map(|p| ProductView::build(store, p)).collect();
        Paginated { items, total: page.total, page: page.page, per_page: page.per_page }
    }).await)
}

async fn get_product(State(s): State<AppState>, Path(key): Path<String>) -> Result<Json<ProductView>> {
    s.store.read(|store| {
        active_product(store, &key).map(|p| Json(ProductView::build(store, p)))
    }).await.ok_or_else(|| StoreError::not_found(Product::KIND, key))
}

#[derive(Debug, Serialize)]
struct ProductReviews {
    rating: RatingSummary,
    reviews: Vec<Review>,
}

async fn list_reviews(State(s): State<AppState>, Path(key): Path<String>) -> Result<Json<ProductReviews>> {
    s.store.read(|store| {
        let product = active_product(store, &key).ok_or_else(|| StoreError::not_found(Product::KIND, &key))?;
        Ok(Json(ProductReviews {
            rating: store.product_rating(&product.id),
            reviews: store.product_reviews(&product.id, true).into_iter().cloned().collect(),
        }))
    }).await
}

async fn submit_review(State(s): State<AppState>, Path(key): Path<String>, Json(r): Json<ReviewInput>) -> Result<(StatusCode, Json<Review>)> {
    let review = s.store.mutate(|store| {
        let id = active_product(store, &key).ok_or_else(|| StoreError::not_found(Product::KIND, &key))?.id.clone();
        store.submit_review(&id, r)
    }).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_categories(State(s): State<AppState>) -> Json<Vec<Category>> {
    Json(s.store.read(|store| store.categories().to_vec()).await)
}

async fn list_tags(State(s): State<AppState>) -> Json<Vec<Tag>> {
    Json(s.store.read(|store| store.tags().to_vec()).await)
}

async fn list_pages(State(s): State<AppState>) -> Json<Vec<Page>> {
    Json(s.store.read(|store| store.published_pages().into_iter().cloned().collect()).await)
}

async fn get_page(State(s): State<AppState>, Path(slug): Path<String>) -> Result<Json<Page>> {
    s.store.read(|store| store.published_page(&slug).cloned()).await
        .map(Json)
        .ok_or_else(|| StoreError::not_found(Page::KIND, slug))
}

async fn get_settings(State(s): State<AppState>) -> Json<SiteSettings> {
    Json(s.store.read(|store| store.settings().clone()).await)
}

#[derive(Debug, Deserialize)]
struct CouponCheck {
    code: String,
    subtotal: Decimal,
}

#[derive(Debug, Serialize)]
struct CouponResult {
    code: String,
    kind: CouponKind,
    discount: Decimal,
    free_shipping: bool,
}

async fn validate_coupon(State(s): State<AppState>, Json(r): Json<CouponCheck>) -> Result<Json<CouponResult>> {
    let (coupon, discount) = s.store.read(|store| store.validate_coupon(&r.code, r.subtotal, Utc::now())).await?;
    Ok(Json(CouponResult { free_shipping: coupon.waives_shipping(), code: coupon.code, kind: coupon.kind, discount }))
}

async fn quote_checkout(State(s): State<AppState>, Json(r): Json<CheckoutRequest>) -> Result<Json<CheckoutQuote>> {
    s.store.read(|store| store.quote_checkout(&r, Utc::now())).await.map(Json)
}

async fn checkout(State(s): State<AppState>, Json(r): Json<CheckoutRequest>) -> Result<(StatusCode, Json<Order>)> {
    let order = s.store.mutate(|store| store.place_order(r, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn open_ticket(State(s): State<AppState>, Json(r): Json<TicketInput>) -> Result<(StatusCode, Json<SupportTicket>)> {
    let ticket = s.store.mutate(|store| store.open_ticket(r)).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}
