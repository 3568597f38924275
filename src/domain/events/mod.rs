//! Domain events raised by store mutations
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{OrderStatus, TicketPriority};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    Coupon(CouponEvent),
    Review(ReviewEvent),
    Ticket(TicketEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: String, slug: String },
    Updated { product_id: String },
    Deleted { product_id: String },
    StockLow { product_id: String, stock: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, email: String, total: Decimal },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponEvent {
    Redeemed { code: String, order_id: String, usage_count: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    Submitted { review_id: String, product_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    Opened { ticket_id: String, priority: TicketPriority },
    Replied { ticket_id: String, staff: bool },
}

impl DomainEvent {
    /// NATS subject suffix, e.g. `order.placed`.
    pub fn subject(&self) -> String {
        let (domain, kind) = match self {
            Self::Product(e) => ("product", match e {
                ProductEvent::Created { .. } => "created",
                ProductEvent::Updated { .. } => "updated",
                ProductEvent::Deleted { .. } => "deleted",
                ProductEvent::StockLow { .. } => "stock_low",
            }),
            Self::Order(e) => ("order", match e {
                OrderEvent::Placed { .. } => "placed",
                OrderEvent::StatusChanged { .. } => "status_changed",
            }),
            Self::Coupon(CouponEvent::Redeemed { .. }) => ("coupon", "redeemed"),
            Self::Review(ReviewEvent::Submitted { .. }) => ("review", "submitted"),
            Self::Ticket(e) => ("ticket", match e {
                TicketEvent::Opened { .. } => "opened",
                TicketEvent::Replied { .. } => "replied",
            }),
        };
        format!("{domain}.{kind}")
    }
}
