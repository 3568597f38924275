//! JSON HTTP surface over the store.
//!
//! Storefront routes are public. Routes under `/api/v1/admin` act on behalf of
//! the user named by the `x-actor-id` header, who must hold the permission the
//! route needs. Identity itself is established upstream.

mod admin;
mod error;
mod storefront;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::aggregates::Permission;
use crate::store::{ShopStore, Store};
use crate::{Result, StoreError};

pub const ACTOR_HEADER: &str = "x-actor-id";

#[derive(Clone)]
pub struct AppState {
    pub store: ShopStore,
}

impl AppState {
    pub fn new(store: ShopStore) -> Self { Self { store } }

    /// Authorizes `actor` and applies `f` in the same critical section.
    async fn admin<R>(&self, actor: &Actor, permission: Permission, f: impl FnOnce(&mut Store) -> Result<R>) -> Result<R> {
        self.store.mutate(|s| {
            s.authorize(&actor.0, permission)?;
            f(s)
        }).await
    }

    async fn admin_read<R>(&self, actor: &Actor, permission: Permission, f: impl FnOnce(&Store) -> R) -> Result<R> {
        self.store.read(|s| {
            s.authorize(&actor.0, permission)?;
            Ok(f(s))
        }).await
    }
}

/// The user id from the `x-actor-id` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        parts.headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Actor(v.to_string()))
            .ok_or(StoreError::Unauthorized)
    }
}

/// Body of the status-change routes.
#[derive(Debug, Deserialize)]
struct StatusChange<T> {
    status: T,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", storefront::routes().nest("/admin", admin::routes()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "storefront-store" }))
}
