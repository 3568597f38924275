//! Cart and checkout payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::aggregates::order::{Address, OrderItem};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Lines of a checkout with repeated products merged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items { cart.add_item(item); }
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn add_item(&mut self, item: CartItem) {
        if item.quantity == 0 { return; }
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub shipping_address: Address,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Priced checkout, computed without touching stock or coupons.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutQuote {
    pub items: Vec<OrderItem>,
    pub coupon_code: Option<String>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, quantity: u32) -> CartItem { CartItem { product_id: product_id.into(), quantity } }

    #[test]
    fn test_cart_merges_lines() {
        let cart = Cart::from_items([item("0001", 2), item("0002", 1), item("0001", 1)]);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_cart_skips_zero_quantity() {
        let cart = Cart::from_items([item("0001", 0)]);
        assert!(cart.is_empty());
    }
}
