//! Back-office routes. Every handler authorizes the [`Actor`] first.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, StatusChange};
use crate::domain::aggregates::*;
use crate::store::{DashboardStats, OrderQuery, Paginated, ProductQuery};
use crate::{Result, StoreError};

use crate::domain::aggregates::Permission::*;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/settings", put(update_settings))
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/products/:id/stock", post(adjust_stock))
        .route("/products/:id/reviews", get(product_reviews))
        .route("/categories", post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
        .route("/tags", post(create_tag))
        .route("/tags/prune", post(prune_tags))
        .route("/tags/:id", delete(delete_tag))
        .route("/media", get(list_media).post(register_media))
        .route("/media/:id", put(update_media).delete(delete_media))
        .route("/coupons", get(list_coupons).post(create_coupon))
        .route("/coupons/:id", get(get_coupon).put(update_coupon).delete(delete_coupon))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(update_order_status))
        .route("/reviews", get(pending_reviews))
        .route("/reviews/:id", delete(delete_review))
        .route("/reviews/:id/status", put(moderate_review))
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/:id", get(get_page).put(update_page).delete(delete_page))
        .route("/tickets", get(list_tickets))
        .route("/tickets/:id", get(get_ticket))
        .route("/tickets/:id/replies", post(reply_ticket))
        .route("/tickets/:id/status", put(set_ticket_status))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
}

fn found<T: Record + Clone>(record: Option<&T>, id: &str) -> Result<Json<T>> {
    record.cloned().map(Json).ok_or_else(|| StoreError::not_found(T::KIND, id))
}

// =============================================================================
// Dashboard & settings
// =============================================================================

async fn dashboard(State(s): State<AppState>, actor: Actor) -> Result<Json<DashboardStats>> {
    s.admin_read(&actor, ViewDashboard, |store| Json(store.dashboard_stats())).await
}

async fn update_settings(State(s): State<AppState>, actor: Actor, Json(r): Json<SiteSettings>) -> Result<Json<SiteSettings>> {
    s.admin(&actor, ManageSettings, |store| Ok(Json(store.update_settings(r)))).await
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(State(s): State<AppState>, actor: Actor, Query(q): Query<ProductQuery>) -> Result<Json<Paginated<Product>>> {
    s.admin_read(&actor, ManageProducts, |store| Json(store.list_products(&q, Utc::now()))).await
}

async fn get_product(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Product>> {
    s.admin_read(&actor, ManageProducts, |store| found(store.product(&id), &id)).await?
}

async fn create_product(State(s): State<AppState>, actor: Actor, Json(r): Json<ProductInput>) -> Result<(StatusCode, Json<Product>)> {
    let product = s.admin(&actor, ManageProducts, |store| store.create_product(r)).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<ProductInput>) -> Result<Json<Product>> {
    s.admin(&actor, ManageProducts, |store| store.update_product(&id, r)).await.map(Json)
}

async fn delete_product(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageProducts, |store| store.delete_product(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct StockAdjustment {
    delta: i64,
}

async fn adjust_stock(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<StockAdjustment>) -> Result<Json<Product>> {
    s.admin(&actor, ManageProducts, |store| store.adjust_stock(&id, r.delta)).await.map(Json)
}

async fn product_reviews(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Vec<Review>>> {
    s.admin_read(&actor, ManageReviews, |store| {
        Json(store.product_reviews(&id, false).into_iter().cloned().collect())
    }).await
}

async fn create_category(State(s): State<AppState>, actor: Actor, Json(r): Json<CategoryInput>) -> Result<(StatusCode, Json<Category>)> {
    let category = s.admin(&actor, ManageProducts, |store| store.create_category(r)).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<CategoryInput>) -> Result<Json<Category>> {
    s.admin(&actor, ManageProducts, |store| store.update_category(&id, r)).await.map(Json)
}

async fn delete_category(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageProducts, |store| store.delete_category(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct NewTag {
    name: String,
}

async fn create_tag(State(s): State<AppState>, actor: Actor, Json(r): Json<NewTag>) -> Result<(StatusCode, Json<Tag>)> {
    let tag = s.admin(&actor, ManageProducts, |store| store.create_tag(&r.name)).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn delete_tag(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageProducts, |store| store.delete_tag(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct Pruned {
    removed: usize,
}

async fn prune_tags(State(s): State<AppState>, actor: Actor) -> Result<Json<Pruned>> {
    s.admin(&actor, ManageProducts, |store| Ok(Json(Pruned { removed: store.prune_unused_tags() }))).await
}

async fn list_media(State(s): State<AppState>, actor: Actor) -> Result<Json<Vec<MediaAsset>>> {
    s.admin_read(&actor, ManageMedia, |store| Json(store.media().to_vec())).await
}

async fn register_media(State(s): State<AppState>, actor: Actor, Json(r): Json<MediaInput>) -> Result<(StatusCode, Json<MediaAsset>)> {
    let asset = s.admin(&actor, ManageMedia, |store| store.register_media(r)).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

async fn update_media(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<MediaInput>) -> Result<Json<MediaAsset>> {
    s.admin(&actor, ManageMedia, |store| store.update_media(&id, r)).await.map(Json)
}

async fn delete_media(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageMedia, |store| store.delete_media(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Commerce
// =============================================================================

async fn list_coupons(State(s): State<AppState>, actor: Actor) -> Result<Json<Vec<Coupon>>> {
    s.admin_read(&actor, ManageCoupons, |store| Json(store.coupons().to_vec())).await
}

async fn get_coupon(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Coupon>> {
    s.admin_read(&actor, ManageCoupons, |store| found(store.coupon(&id), &id)).await?
}

async fn create_coupon(State(s): State<AppState>, actor: Actor, Json(r): Json<CouponInput>) -> Result<(StatusCode, Json<Coupon>)> {
    let coupon = s.admin(&actor, ManageCoupons, |store| store.create_coupon(r)).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

async fn update_coupon(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<CouponInput>) -> Result<Json<Coupon>> {
    s.admin(&actor, ManageCoupons, |store| store.update_coupon(&id, r)).await.map(Json)
}

async fn delete_coupon(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageCoupons, |store| store.delete_coupon(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_orders(State(s): State<AppState>, actor: Actor, Query(q): Query<OrderQuery>) -> Result<Json<Paginated<Order>>> {
    s.admin_read(&actor, ManageOrders, |store| Json(store.list_orders(&q))).await
}

async fn get_order(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Order>> {
    s.admin_read(&actor, ManageOrders, |store| found(store.order(&id), &id)).await?
}

async fn update_order_status(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<StatusChange<OrderStatus>>) -> Result<Json<Order>> {
    s.admin(&actor, ManageOrders, |store| store.update_order_status(&id, r.status)).await.map(Json)
}

// =============================================================================
// Content
// =============================================================================

async fn pending_reviews(State(s): State<AppState>, actor: Actor) -> Result<Json<Vec<Review>>> {
    s.admin_read(&actor, ManageReviews, |store| Json(store.pending_reviews().into_iter().cloned().collect())).await
}

async fn moderate_review(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<StatusChange<ReviewStatus>>) -> Result<Json<Review>> {
    s.admin(&actor, ManageReviews, |store| store.moderate_review(&id, r.status)).await.map(Json)
}

async fn delete_review(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageReviews, |store| store.delete_review(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_pages(State(s): State<AppState>, actor: Actor) -> Result<Json<Vec<Page>>> {
    s.admin_read(&actor, ManagePages, |store| Json(store.pages().to_vec())).await
}

async fn get_page(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Page>> {
    s.admin_read(&actor, ManagePages, |store| found(store.page(&id), &id)).await?
}

async fn create_page(State(s): State<AppState>, actor: Actor, Json(r): Json<PageInput>) -> Result<(StatusCode, Json<Page>)> {
    let page = s.admin(&actor, ManagePages, |store| store.create_page(r)).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<PageInput>) -> Result<Json<Page>> {
    s.admin(&actor, ManagePages, |store| store.update_page(&id, r)).await.map(Json)
}

async fn delete_page(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManagePages, |store| store.delete_page(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TicketFilter {
    open_only: bool,
}

async fn list_tickets(State(s): State<AppState>, actor: Actor, Query(q): Query<TicketFilter>) -> Result<Json<Vec<SupportTicket>>> {
    s.admin_read(&actor, ManageSupport, |store| Json(store.list_tickets(q.open_only).into_iter().cloned().collect())).await
}

async fn get_ticket(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<SupportTicket>> {
    s.admin_read(&actor, ManageSupport, |store| found(store.ticket(&id), &id)).await?
}

/// Staff reply; the author defaults to the acting user's name.
#[derive(Debug, Deserialize)]
struct StaffReply {
    #[serde(default)]
    author: Option<String>,
    body: String,
}

async fn reply_ticket(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<StaffReply>) -> Result<Json<SupportTicket>> {
    s.store.mutate(|store| {
        let name = store.authorize(&actor.0, ManageSupport)?.name.clone();
        let reply = TicketReply { author: r.author.unwrap_or(name), body: r.body, staff: true };
        store.reply_ticket(&id, reply)
    }).await.map(Json)
}

async fn set_ticket_status(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<StatusChange<TicketStatus>>) -> Result<Json<SupportTicket>> {
    s.admin(&actor, ManageSupport, |store| store.set_ticket_status(&id, r.status)).await.map(Json)
}

// =============================================================================
// Users
// =============================================================================

async fn list_users(State(s): State<AppState>, actor: Actor) -> Result<Json<Vec<User>>> {
    s.admin_read(&actor, ManageUsers, |store| Json(store.users().to_vec())).await
}

async fn get_user(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<User>> {
    s.admin_read(&actor, ManageUsers, |store| found(store.user(&id), &id)).await?
}

async fn create_user(State(s): State<AppState>, actor: Actor, Json(r): Json<UserInput>) -> Result<(StatusCode, Json<User>)> {
    let user = s.admin(&actor, ManageUsers, |store| store.create_user(r)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, Json(r): Json<UserInput>) -> Result<Json<User>> {
    s.admin(&actor, ManageUsers, |store| store.update_user(&id, r)).await.map(Json)
}

async fn delete_user(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<StatusCode> {
    s.admin(&actor, ManageUsers, |store| store.delete_user(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
