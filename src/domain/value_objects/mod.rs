//! Value Objects for the store records

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rounds an amount to cents, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest price a product may carry.
pub fn max_price() -> Decimal {
    Decimal::new(1_000_000_000, 0)
}

/// Rounds to cents and floors at zero.
pub fn non_negative_money(amount: Decimal) -> Decimal {
    round_money(amount.max(Decimal::ZERO))
}

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 50;

    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }

    /// SKU derived from a product id, used when none is supplied.
    pub fn for_product(product_id: &str) -> Self { Self(format!("SKU-{product_id}")) }

    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
}

/// Lowercased, validated email address
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn parse(value: &str) -> Result<Self, EmailError> {
        let value = value.trim().to_lowercase();
        if value.is_empty() { return Err(EmailError::Empty); }
        if !validator::validate_email(value.as_str()) { return Err(EmailError::Invalid(value)); }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("email is empty")]
    Empty,
    #[error("invalid email: {0}")]
    Invalid(String),
}

/// Star rating between 1 and 5
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn clamped(value: i64) -> Self { Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8) }
    pub fn value(&self) -> u8 { self.0 }
}

impl Default for Rating { fn default() -> Self { Self(Self::MAX) } }

// Out of range values found on disk are clamped instead of rejected.
impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::clamped)
    }
}

/// Trims a string, mapping blank to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_sku() { let sku = Sku::new(" prod-001 ").unwrap(); assert_eq!(sku.as_str(), "PROD-001"); }
    #[test]
    fn test_sku_rejects_blank() { assert_eq!(Sku::new("   "), Err(SkuError::Empty)); }
    #[test]
    fn test_email_lowercased() {
        assert_eq!(Email::parse("  Jane@Example.COM ").unwrap().as_str(), "jane@example.com");
        assert!(Email::parse("not-an-email").is_err());
    }
    #[test]
    fn test_rating_clamped() {
        assert_eq!(Rating::clamped(0).value(), 1);
        assert_eq!(Rating::clamped(9).value(), 5);
        assert_eq!(Rating::clamped(3).value(), 3);
    }
    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(10005, 3)), Decimal::new(1001, 2));
        assert_eq!(non_negative_money(Decimal::new(-5, 0)), Decimal::ZERO);
    }
}
