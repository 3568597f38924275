//! Coupons, checkout and orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::{find, ids, require, Paginated, Store};
use crate::domain::aggregates::coupon::normalize_code;
use crate::domain::aggregates::*;
use crate::domain::events::{CouponEvent, DomainEvent, OrderEvent};
use crate::domain::value_objects::{non_blank, round_money, Email};
use crate::{Result, StoreError};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Exact customer email, case-insensitive.
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl Store {
    // =========================================================================
    // Coupons
    // =========================================================================

    pub fn coupon(&self, id: &str) -> Option<&Coupon> { find(&self.coupons, id) }

    pub fn coupon_by_code(&self, code: &str) -> Option<&Coupon> {
        let code = normalize_code(code);
        self.coupons.iter().find(|c| c.code == code)
    }

    pub fn create_coupon(&mut self, input: CouponInput) -> Result<Coupon> {
        input.validate()?;
        self.check_coupon(&input, None)?;
        let coupon = Coupon::from_input(ids::next_record_id(&self.coupons), &input);
        info!(coupon_id = %coupon.id, code = %coupon.code, "coupon created");
        self.coupons.push(coupon.clone());
        Ok(coupon)
    }

    /// Updates a coupon; its usage count is kept.
    pub fn update_coupon(&mut self, id: &str, input: CouponInput) -> Result<Coupon> {
        input.validate()?;
        let index = require(&self.coupons, id)?;
        self.check_coupon(&input, Some(index))?;
        let coupon = &mut self.coupons[index];
        coupon.apply_input(&input);
        Ok(coupon.clone())
    }

    pub fn delete_coupon(&mut self, id: &str) -> Result<Coupon> {
        let index = require(&self.coupons, id)?;
        let coupon = self.coupons.remove(index);
        info!(coupon_id = %coupon.id, code = %coupon.code, "coupon deleted");
        Ok(coupon)
    }

    /// Looks up `code` and checks it against `subtotal`, returning the discount.
    pub fn validate_coupon(&self, code: &str, subtotal: Decimal, now: DateTime<Utc>) -> Result<(Coupon, Decimal)> {
        let coupon = self.coupon_by_code(code)
            .ok_or_else(|| CouponRejection::Unknown(normalize_code(code)))?;
        coupon.check(subtotal, now)?;
        Ok((coupon.clone(), coupon.discount_for(subtotal)))
    }

    fn check_coupon(&self, input: &CouponInput, index: Option<usize>) -> Result<()> {
        let code = normalize_code(&input.code);
        if code.chars().any(char::is_whitespace) {
            return Err(StoreError::Validation("coupon code cannot contain spaces".into()));
        }
        if input.kind == CouponKind::Percentage && input.value <= Decimal::ZERO {
            return Err(StoreError::Validation("percentage coupon must discount more than 0%".into()));
        }
        let clash = self.coupons.iter().enumerate().any(|(i, c)| Some(i) != index && c.code == code);
        if clash {
            return Err(StoreError::Conflict(format!("coupon code {code} already exists")));
        }
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Prices a checkout without reserving stock or redeeming the coupon.
    pub fn quote_checkout(&self, request: &CheckoutRequest, now: DateTime<Utc>) -> Result<CheckoutQuote> {
        let cart = Cart::from_items(request.items.iter().map(|line| CartItem {
            product_id: ids::canonical(&line.product_id),
            quantity: line.quantity,
        }));
        let mut items = Vec::with_capacity(cart.item_count());
        for line in cart.items() {
            let product = find(&self.products, &line.product_id)
                .filter(|p| p.is_active())
                .ok_or_else(|| StoreError::not_found(Product::KIND, &line.product_id))?;
            if product.track_stock && line.quantity > product.stock {
                return Err(StoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }
            items.push(OrderItem::new(&product.id, &product.name, &product.sku, product.effective_price(now), line.quantity)?);
        }

        let subtotal = items.iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total))
            .map(round_money)
            .ok_or(OrderError::AmountOutOfRange)?;
        let coupon = match non_blank(request.coupon_code.clone()) {
            Some(code) => Some(self.validate_coupon(&code, subtotal, now)?),
            None => None,
        };
        let discount = coupon.as_ref().map_or(Decimal::ZERO, |(_, d)| *d);
        let free_shipping = coupon.as_ref().is_some_and(|(c, _)| c.waives_shipping());

        let settings = &self.settings;
        let discounted = subtotal - discount;
        let shipping = if items.is_empty()
            || free_shipping
            || settings.free_shipping_threshold.is_some_and(|t| discounted >= t)
        {
            Decimal::ZERO
        } else {
            settings.flat_shipping_rate
        };
        let tax = discounted.checked_mul(settings.tax_rate)
            .map(|t| round_money(t / Decimal::ONE_HUNDRED))
            .ok_or(OrderError::AmountOutOfRange)?;
        let total = discounted.checked_add(shipping)
            .and_then(|t| t.checked_add(tax))
            .map(round_money)
            .ok_or(OrderError::AmountOutOfRange)?;

        Ok(CheckoutQuote {
            items,
            coupon_code: coupon.map(|(c, _)| c.code),
            subtotal,
            discount,
            shipping,
            tax,
            total,
            currency: settings.currency.clone(),
        })
    }

    /// Places an order: prices it, takes stock and redeems the coupon.
    pub fn place_order(&mut self, request: CheckoutRequest, now: DateTime<Utc>) -> Result<Order> {
        request.validate()?;
        request.shipping_address.validate()?;
        let email = Email::parse(&request.email).map_err(|e| StoreError::Validation(e.to_string()))?;
        let user_id = match non_blank(request.user_id.clone()) {
            Some(id) => Some(find(&self.users, &id).ok_or_else(|| StoreError::not_found(User::KIND, &id))?.id.clone()),
            None => None,
        };
        let quote = self.quote_checkout(&request, now)?;
        if quote.items.is_empty() {
            return Err(OrderError::NoItems.into());
        }

        for item in &quote.items {
            let index = require(&self.products, &item.product_id)?;
            if self.products[index].track_stock {
                let stock = self.products[index].stock - item.quantity;
                self.set_stock(index, stock);
            }
        }

        let id = ids::next_record_id(&self.orders);
        if let Some(code) = &quote.coupon_code {
            if let Some(coupon) = self.coupons.iter_mut().find(|c| &c.code == code) {
                coupon.usage_count += 1;
                let event = CouponEvent::Redeemed { code: code.clone(), order_id: id.clone(), usage_count: coupon.usage_count };
                self.raise_event(DomainEvent::Coupon(event));
            }
        }

        let order = Order {
            id: id.clone(),
            user_id,
            email: email.into_string(),
            customer_name: request.customer_name.trim().to_string(),
            items: quote.items,
            coupon_code: quote.coupon_code,
            subtotal: quote.subtotal,
            discount: quote.discount,
            shipping: quote.shipping,
            tax: quote.tax,
            total: quote.total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: request.shipping_address,
            notes: non_blank(request.notes),
            created_at: now,
            updated_at: now,
        };
        info!(order_id = %id, total = %order.total, items = order.item_count(), "order placed");
        self.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, email: order.email.clone(), total: order.total }));
        self.orders.push(order.clone());
        Ok(order)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub fn order(&self, id: &str) -> Option<&Order> { find(&self.orders, id) }

    /// Newest first.
    pub fn list_orders(&self, query: &OrderQuery) -> Paginated<Order> {
        let email = non_blank(query.email.clone()).map(|e| e.to_lowercase());
        let user_id = non_blank(query.user_id.clone()).map(|id| ids::canonical(&id));
        let mut items: Vec<Order> = self.orders.iter()
            .filter(|o| query.status.map_or(true, |s| o.status == s))
            .filter(|o| email.as_ref().map_or(true, |e| &o.email == e))
            .filter(|o| user_id.as_ref().map_or(true, |u| o.user_id.as_ref() == Some(u)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Paginated::from_vec(items, query.page, query.per_page)
    }

    /// Moves an order along its lifecycle; cancelling or refunding restocks.
    pub fn update_order_status(&mut self, id: &str, status: OrderStatus) -> Result<Order> {
        let index = require(&self.orders, id)?;
        let previous = self.orders[index].transition(status)?;
        let order = self.orders[index].clone();

        if order.restocks_from(previous) {
            for item in &order.items {
                match super::position(&self.products, &item.product_id) {
                    Some(p) if self.products[p].track_stock => {
                        let stock = self.products[p].stock.saturating_add(item.quantity);
                        self.set_stock(p, stock);
                    }
                    Some(_) => {}
                    None => warn!(order_id = %order.id, product_id = %item.product_id, "cannot restock deleted product"),
                }
            }
        }

        info!(order_id = %order.id, from = %previous, to = %status, "order status changed");
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: order.id.clone(), from: previous, to: status }));
        Ok(order)
    }
}
