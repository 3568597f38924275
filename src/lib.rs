//! Storefront Store
//!
//! Embedded data store behind a storefront and its back office.
//!
//! ## Features
//! - Product catalog with categories, tags and a media library
//! - Coupons, checkout quotes and order management
//! - CMS pages, product reviews and support tickets
//! - Users with role based permissions
//! - Site settings
//! - JSON file persistence with debounced atomic writes

pub mod api;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod store;

pub use config::StoreConfig;
pub use domain::aggregates::*;
pub use domain::events::DomainEvent;
pub use publisher::EventPublisher;
pub use store::{Paginated, ShopStore, Store};

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: String,
        available: u32,
        requested: u32,
    },

    #[error("Coupon rejected: {0}")]
    CouponRejected(#[from] CouponRejection),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Actor required")]
    Unauthorized,

    #[error("Missing permission: {0}")]
    Forbidden(Permission),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
