//! Site-wide settings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::non_negative_money;

pub const DEFAULT_STORE_NAME: &str = "My Store";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub store_name: String,
    pub tagline: String,
    pub contact_email: String,
    pub currency: String,
    /// Percent applied to the discounted subtotal.
    pub tax_rate: Decimal,
    pub flat_shipping_rate: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub low_stock_threshold: u32,
    pub maintenance_mode: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            tagline: String::new(),
            contact_email: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            tax_rate: Decimal::ZERO,
            flat_shipping_rate: Decimal::ZERO,
            free_shipping_threshold: None,
            low_stock_threshold: 5,
            maintenance_mode: false,
        }
    }
}

impl SiteSettings {
    pub fn normalize(&mut self) {
        self.store_name = self.store_name.trim().to_string();
        if self.store_name.is_empty() { self.store_name = DEFAULT_STORE_NAME.to_string(); }
        self.tagline = self.tagline.trim().to_string();
        self.contact_email = self.contact_email.trim().to_lowercase();
        let currency = self.currency.trim().to_uppercase();
        self.currency = if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
            currency
        } else {
            DEFAULT_CURRENCY.to_string()
        };
        self.tax_rate = self.tax_rate.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).round_dp(4);
        self.flat_shipping_rate = non_negative_money(self.flat_shipping_rate);
        self.free_shipping_threshold = self.free_shipping_threshold
            .map(non_negative_money)
            .filter(|t| *t > Decimal::ZERO);
    }
}
