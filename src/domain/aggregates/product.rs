//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::value_objects::{non_blank, non_negative_money, round_money};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub sale_starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sale_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub track_stock: bool,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub media_ids: Vec<String>,
    /// Category names or ids from older files, folded into `category_ids` on load.
    #[serde(default, rename = "categories", skip_serializing)]
    pub legacy_categories: Vec<String>,
    #[serde(default, rename = "tags", skip_serializing)]
    pub legacy_tags: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

fn default_true() -> bool { true }

/// Create/update payload. Categories and tags are given by name or id.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub short_description: String,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub sale_starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sale_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub track_stock: bool,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media_ids: Vec<String>,
}

impl Product {
    pub fn is_active(&self) -> bool { self.status == ProductStatus::Active }

    pub fn is_in_stock(&self) -> bool { !self.track_stock || self.stock > 0 }

    /// Whether the sale price applies at `now`.
    pub fn on_sale(&self, now: DateTime<Utc>) -> bool {
        if self.sale_price.is_none() { return false; }
        let started = self.sale_starts_at.map_or(true, |start| start <= now);
        let not_ended = self.sale_ends_at.map_or(true, |end| now < end);
        started && not_ended
    }

    pub fn effective_price(&self, now: DateTime<Utc>) -> Decimal {
        match self.sale_price {
            Some(sale) if self.on_sale(now) => sale,
            _ => self.price,
        }
    }

    /// Whole percent saved while on sale, for badges.
    pub fn discount_percent(&self, now: DateTime<Utc>) -> Option<u32> {
        if !self.on_sale(now) || self.price.is_zero() { return None; }
        let saved = (self.price - self.effective_price(now)) / self.price * Decimal::ONE_HUNDRED;
        saved.round().to_u32()
    }

    /// Rounds prices and drops a sale price or schedule that cannot apply.
    pub fn normalize_pricing(&mut self) {
        self.price = non_negative_money(self.price);
        self.sale_price = self.sale_price
            .map(round_money)
            .filter(|sale| *sale > Decimal::ZERO && *sale < self.price);
        if self.sale_price.is_none() {
            self.sale_starts_at = None;
            self.sale_ends_at = None;
        }
        if let (Some(start), Some(end)) = (self.sale_starts_at, self.sale_ends_at) {
            if end <= start {
                self.sale_starts_at = None;
                self.sale_ends_at = None;
            }
        }
    }

    pub fn normalize_text(&mut self) {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_uppercase();
        self.description = self.description.trim().to_string();
        self.short_description = self.short_description.trim().to_string();
    }

    /// Applies the scalar fields of an input; references are resolved by the store.
    pub fn apply_input(&mut self, input: &ProductInput) {
        self.name = input.name.clone();
        self.description = input.description.clone();
        self.short_description = input.short_description.clone();
        self.price = input.price;
        self.sale_price = input.sale_price;
        self.sale_starts_at = input.sale_starts_at;
        self.sale_ends_at = input.sale_ends_at;
        self.stock = input.stock;
        self.track_stock = input.track_stock;
        self.status = input.status;
        self.featured = input.featured;
        if let Some(sku) = non_blank(input.sku.clone()) { self.sku = sku; }
        self.normalize_text();
        self.normalize_pricing();
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Default for ProductInput {
    fn default() -> Self {
        Self {
            name: String::new(), slug: None, sku: None, description: String::new(), short_description: String::new(),
            price: Decimal::ZERO, sale_price: None, sale_starts_at: None, sale_ends_at: None,
            stock: 0, track_stock: true, status: ProductStatus::Draft, featured: false,
            categories: vec![], tags: vec![], media_ids: vec![],
        }
    }
}

impl Default for Product {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(), name: String::new(), slug: String::new(), sku: String::new(),
            description: String::new(), short_description: String::new(),
            price: Decimal::ZERO, sale_price: None, sale_starts_at: None, sale_ends_at: None,
            stock: 0, track_stock: true, status: ProductStatus::Draft, featured: false,
            category_ids: vec![], tag_ids: vec![], media_ids: vec![],
            legacy_categories: vec![], legacy_tags: vec![], created_at: now, updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn priced(price: i64, sale: Option<i64>) -> Product {
        let mut p = Product { price: Decimal::new(price, 2), sale_price: sale.map(|s| Decimal::new(s, 2)), ..Product::default() };
        p.normalize_pricing();
        p
    }

    #[test]
    fn test_sale_price_must_undercut_price() {
        assert_eq!(priced(1000, Some(1200)).sale_price, None);
        assert_eq!(priced(1000, Some(0)).sale_price, None);
        assert_eq!(priced(1000, Some(800)).sale_price, Some(Decimal::new(800, 2)));
    }

    #[test]
    fn test_effective_price_respects_schedule() {
        let now = Utc::now();
        let mut p = priced(2000, Some(1500));
        assert_eq!(p.effective_price(now), Decimal::new(1500, 2));
        p.sale_starts_at = Some(now + Duration::days(1));
        assert_eq!(p.effective_price(now), Decimal::new(2000, 2));
        p.sale_starts_at = Some(now - Duration::days(2));
        p.sale_ends_at = Some(now - Duration::days(1));
        assert!(!p.on_sale(now));
    }

    #[test]
    fn test_inverted_schedule_is_cleared() {
        let now = Utc::now();
        let mut p = priced(2000, Some(1500));
        p.sale_starts_at = Some(now);
        p.sale_ends_at = Some(now - Duration::hours(1));
        p.normalize_pricing();
        assert_eq!(p.sale_starts_at, None);
        assert_eq!(p.sale_ends_at, None);
        assert!(p.on_sale(now));
    }

    #[test]
    fn test_discount_percent() {
        let p = priced(2000, Some(1500));
        assert_eq!(p.discount_percent(Utc::now()), Some(25));
        assert_eq!(priced(2000, None).discount_percent(Utc::now()), None);
    }
}
