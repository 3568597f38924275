//! HTTP mapping for [`StoreError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{OrderError, StoreError};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl StoreError {
    fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::Validation(_) | StoreError::InvalidInput(_) => "VALIDATION_ERROR",
            StoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            StoreError::CouponRejected(_) => "COUPON_REJECTED",
            StoreError::Order(OrderError::NoItems) => "EMPTY_ORDER",
            StoreError::Order(OrderError::InvalidTransition { .. }) => "INVALID_TRANSITION",
            StoreError::Order(OrderError::AmountOutOfRange) => "AMOUNT_OUT_OF_RANGE",
            StoreError::Unauthorized => "UNAUTHORIZED",
            StoreError::Forbidden(_) => "FORBIDDEN",
            StoreError::Config(_) | StoreError::Io(_) | StoreError::Json(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Conflict(_)
            | StoreError::InsufficientStock { .. }
            | StoreError::Order(OrderError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            StoreError::Validation(_)
            | StoreError::InvalidInput(_)
            | StoreError::CouponRejected(_)
            | StoreError::Order(OrderError::NoItems | OrderError::AmountOutOfRange) => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::Unauthorized => StatusCode::UNAUTHORIZED,
            StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            StoreError::Config(_) | StoreError::Io(_) | StoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client errors carry their message; internal details are logged, not returned.
    fn user_message(&self) -> String {
        match self {
            StoreError::Config(_) | StoreError::Io(_) | StoreError::Json(_) => {
                tracing::error!(error = %self, "internal error");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody { code: self.code(), message: self.user_message() },
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CouponRejection, OrderStatus, Permission};

    #[test]
    fn test_status_codes() {
        assert_eq!(StoreError::not_found("product", "0001").status(), StatusCode::NOT_FOUND);
        assert_eq!(StoreError::Conflict("taken".into()).status(), StatusCode::CONFLICT);
        assert_eq!(StoreError::CouponRejected(CouponRejection::Expired).status(), StatusCode::UNPROCESSABLE_ENTITY);
        let transition = OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Pending };
        assert_eq!(StoreError::Order(transition).status(), StatusCode::CONFLICT);
        assert_eq!(StoreError::Order(OrderError::AmountOutOfRange).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(StoreError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(StoreError::Forbidden(Permission::ManageUsers).status(), StatusCode::FORBIDDEN);
        assert_eq!(StoreError::Config("bad".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        assert_eq!(err.user_message(), "An internal error occurred");
    }
}
