//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

use crate::domain::value_objects::round_money;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub shipping_address: Address,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a purchased product; survives product edits and deletion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub line_total: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Address {
    #[validate(length(max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub street1: String,
    pub street2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip: String,
    #[validate(length(min = 2, max = 56))]
    pub country: String,
    pub phone: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Paid, Processing, Shipped, Delivered, Cancelled, Refunded }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Refunded, Voided }

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending, Self::Paid, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled, Self::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Cancelled)
                | (Paid, Processing) | (Paid, Cancelled) | (Paid, Refunded)
                | (Processing, Shipped) | (Processing, Cancelled) | (Processing, Refunded)
                | (Shipped, Delivered) | (Shipped, Refunded)
                | (Delivered, Refunded)
        )
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Cancelled | Self::Refunded) }

    /// Orders whose money counts as revenue.
    pub fn counts_as_revenue(&self) -> bool {
        matches!(self, Self::Paid | Self::Processing | Self::Shipped | Self::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl OrderItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, sku: impl Into<String>, unit_price: Decimal, quantity: u32) -> Result<Self, OrderError> {
        let unit_price = round_money(unit_price);
        let line_total = unit_price.checked_mul(Decimal::from(quantity)).ok_or(OrderError::AmountOutOfRange)?;
        Ok(Self {
            product_id: product_id.into(), name: name.into(), sku: sku.into(), unit_price, quantity,
            line_total: round_money(line_total),
        })
    }
}

impl Order {
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Moves the order to `next`, keeping the payment status in step.
    ///
    /// Returns the previous status.
    pub fn transition(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: previous, to: next });
        }
        self.status = next;
        self.payment_status = match next {
            OrderStatus::Paid | OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Delivered => PaymentStatus::Paid,
            OrderStatus::Refunded => PaymentStatus::Refunded,
            OrderStatus::Cancelled if previous == OrderStatus::Pending => PaymentStatus::Voided,
            OrderStatus::Cancelled => PaymentStatus::Refunded,
            OrderStatus::Pending => self.payment_status,
        };
        self.touch();
        Ok(previous)
    }

    /// Whether leaving `previous` for the current status returns goods to stock.
    pub fn restocks_from(&self, previous: OrderStatus) -> bool {
        self.status.is_terminal() && !previous.is_terminal()
    }

    pub fn normalize_amounts(&mut self) {
        for item in &mut self.items {
            item.unit_price = round_money(item.unit_price);
            if let Some(total) = item.unit_price.checked_mul(Decimal::from(item.quantity)) {
                item.line_total = round_money(total);
            }
        }
        self.subtotal = round_money(self.subtotal);
        self.discount = round_money(self.discount);
        self.shipping = round_money(self.shipping);
        self.tax = round_money(self.tax);
        self.total = round_money(self.total);
        self.email = self.email.trim().to_lowercase();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order amount out of range")]
    AmountOutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            id: "0001".into(), user_id: None, email: "test@example.com".into(), customer_name: "Test".into(),
            items: vec![OrderItem::new("0001", "Widget", "W001", Decimal::new(10, 0), 2).unwrap()],
            coupon_code: None, subtotal: Decimal::new(20, 0), discount: Decimal::ZERO, shipping: Decimal::ZERO,
            tax: Decimal::ZERO, total: Decimal::new(20, 0), status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending, shipping_address: Address::default(), notes: None,
            created_at: Utc::now(), updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_workflow() {
        let mut order = order();
        assert_eq!(order.items[0].line_total, Decimal::new(20, 0));
        order.transition(OrderStatus::Paid).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        order.transition(OrderStatus::Processing).unwrap();
        order.transition(OrderStatus::Shipped).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        order.transition(OrderStatus::Delivered).unwrap();
        assert!(order.transition(OrderStatus::Cancelled).is_err());
    }

    #[test]
    fn test_cancel_pending_voids_payment() {
        let mut order = order();
        let previous = order.transition(OrderStatus::Cancelled).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Voided);
        assert!(order.restocks_from(previous));
        assert_eq!(
            order.transition(OrderStatus::Paid),
            Err(OrderError::InvalidTransition { from: OrderStatus::Cancelled, to: OrderStatus::Paid })
        );
    }

    #[test]
    fn test_line_total_overflow_is_rejected() {
        let huge = Decimal::from_i128_with_scale(10i128.pow(28), 0);
        assert_eq!(OrderItem::new("0001", "Yacht", "Y1", huge, 4_000_000_000), Err(OrderError::AmountOutOfRange));
    }

    #[test]
    fn test_pending_cannot_ship() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
    }
}
