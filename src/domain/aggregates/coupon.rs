//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::domain::value_objects::{non_negative_money, round_money};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub kind: CouponKind,
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
    pub min_subtotal: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    #[default]
    Percentage,
    FixedAmount,
    FreeShipping,
}

fn default_true() -> bool { true }

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct CouponInput {
    #[validate(length(min = 2, max = 40))]
    pub code: String,
    pub kind: CouponKind,
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
    pub min_subtotal: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("coupon {0} does not exist")]
    Unknown(String),
    #[error("coupon is inactive")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotStarted,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("order subtotal must be at least {0}")]
    MinimumNotMet(Decimal),
}

/// Canonical form of a coupon code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    pub fn from_input(id: String, input: &CouponInput) -> Self {
        let mut coupon = Self {
            id, code: String::new(), kind: CouponKind::Percentage, value: Decimal::ZERO,
            min_subtotal: None, max_discount: None, starts_at: None, expires_at: None,
            usage_limit: None, usage_count: 0, active: true, created_at: Utc::now(),
        };
        coupon.apply_input(input);
        coupon
    }

    pub fn apply_input(&mut self, input: &CouponInput) {
        self.code = normalize_code(&input.code);
        self.kind = input.kind;
        self.value = input.value;
        self.min_subtotal = input.min_subtotal;
        self.max_discount = input.max_discount;
        self.starts_at = input.starts_at;
        self.expires_at = input.expires_at;
        self.usage_limit = input.usage_limit;
        self.active = input.active;
        self.normalize();
    }

    /// Clamps the value to its kind and rounds money fields.
    pub fn normalize(&mut self) {
        self.code = normalize_code(&self.code);
        self.value = match self.kind {
            CouponKind::Percentage => self.value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            CouponKind::FixedAmount => non_negative_money(self.value),
            CouponKind::FreeShipping => Decimal::ZERO,
        };
        self.min_subtotal = self.min_subtotal.map(non_negative_money).filter(|m| !m.is_zero());
        self.max_discount = self.max_discount.map(non_negative_money).filter(|m| !m.is_zero());
    }

    pub fn waives_shipping(&self) -> bool { self.kind == CouponKind::FreeShipping }

    /// Checks that the coupon can be applied to `subtotal` at `now`.
    pub fn check(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.active { return Err(CouponRejection::Inactive); }
        if self.starts_at.is_some_and(|start| now < start) { return Err(CouponRejection::NotStarted); }
        if self.expires_at.is_some_and(|end| now >= end) { return Err(CouponRejection::Expired); }
        if self.usage_limit.is_some_and(|limit| self.usage_count >= limit) {
            return Err(CouponRejection::UsageLimitReached);
        }
        if let Some(min) = self.min_subtotal {
            if subtotal < min { return Err(CouponRejection::MinimumNotMet(min)); }
        }
        Ok(())
    }

    /// Discount for `subtotal`, capped by `max_discount` and by the subtotal itself.
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        let subtotal = subtotal.max(Decimal::ZERO);
        let raw = match self.kind {
            CouponKind::Percentage => match subtotal.checked_mul(self.value) {
                Some(scaled) => scaled / Decimal::ONE_HUNDRED,
                None => subtotal / Decimal::ONE_HUNDRED * self.value,
            },
            CouponKind::FixedAmount => self.value,
            CouponKind::FreeShipping => Decimal::ZERO,
        };
        let capped = match self.max_discount {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        round_money(capped.min(subtotal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(kind: CouponKind, value: i64) -> Coupon {
        Coupon::from_input("0001".into(), &CouponInput { code: " save10 ".into(), kind, value: Decimal::new(value, 0), active: true, ..Default::default() })
    }

    #[test]
    fn test_code_is_uppercased() { assert_eq!(coupon(CouponKind::Percentage, 10).code, "SAVE10"); }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(CouponKind::Percentage, 15);
        assert_eq!(c.discount_for(Decimal::new(3333, 2)), Decimal::new(500, 2));
    }

    #[test]
    fn test_percentage_is_clamped() {
        let c = coupon(CouponKind::Percentage, 150);
        assert_eq!(c.value, Decimal::ONE_HUNDRED);
        assert_eq!(c.discount_for(Decimal::new(40, 0)), Decimal::new(40, 0));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let c = coupon(CouponKind::FixedAmount, 25);
        assert_eq!(c.discount_for(Decimal::new(10, 0)), Decimal::new(10, 0));
        assert_eq!(c.discount_for(Decimal::new(100, 0)), Decimal::new(25, 0));
    }

    #[test]
    fn test_percentage_of_huge_subtotal() {
        let c = coupon(CouponKind::Percentage, 50);
        let subtotal = Decimal::from_i128_with_scale(7 * 10i128.pow(27), 0);
        assert_eq!(c.discount_for(subtotal), subtotal / Decimal::TWO);
    }

    #[test]
    fn test_max_discount_cap() {
        let mut c = coupon(CouponKind::Percentage, 50);
        c.max_discount = Some(Decimal::new(20, 0));
        assert_eq!(c.discount_for(Decimal::new(100, 0)), Decimal::new(20, 0));
    }

    #[test]
    fn test_free_shipping_has_no_discount() {
        let c = coupon(CouponKind::FreeShipping, 99);
        assert!(c.waives_shipping());
        assert_eq!(c.discount_for(Decimal::new(100, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_rejections() {
        let now = Utc::now();
        let mut c = coupon(CouponKind::Percentage, 10);
        assert_eq!(c.check(Decimal::ONE, now), Ok(()));
        c.min_subtotal = Some(Decimal::new(50, 0));
        assert_eq!(c.check(Decimal::new(49, 0), now), Err(CouponRejection::MinimumNotMet(Decimal::new(50, 0))));
        c.min_subtotal = None;
        c.expires_at = Some(now - Duration::minutes(1));
        assert_eq!(c.check(Decimal::ONE, now), Err(CouponRejection::Expired));
        c.expires_at = None;
        c.starts_at = Some(now + Duration::minutes(1));
        assert_eq!(c.check(Decimal::ONE, now), Err(CouponRejection::NotStarted));
        c.starts_at = None;
        c.usage_limit = Some(2);
        c.usage_count = 2;
        assert_eq!(c.check(Decimal::ONE, now), Err(CouponRejection::UsageLimitReached));
        c.usage_limit = None;
        c.active = false;
        assert_eq!(c.check(Decimal::ONE, now), Err(CouponRejection::Inactive));
    }
}
