//! Users, site settings and the back-office dashboard.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use super::{find, ids, require, Store};
use crate::domain::aggregates::*;
use crate::domain::value_objects::{non_blank, round_money, Email};
use crate::{Result, StoreError};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub revenue: Decimal,
    pub orders_by_status: BTreeMap<OrderStatus, usize>,
    pub low_stock: Vec<LowStockItem>,
    pub pending_reviews: usize,
    pub open_tickets: usize,
    pub product_count: usize,
    pub customer_count: usize,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub product_id: String,
    pub name: String,
    pub stock: u32,
}

impl Store {
    // =========================================================================
    // Users
    // =========================================================================

    pub fn user(&self, id: &str) -> Option<&User> { find(&self.users, id) }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim().to_lowercase();
        self.users.iter().find(|u| u.email == email)
    }

    pub fn create_user(&mut self, input: UserInput) -> Result<User> {
        input.validate()?;
        let email = self.check_email(&input.email, None)?;
        let user = User {
            id: ids::next_record_id(&self.users),
            email,
            name: input.name.trim().to_string(),
            role: input.role,
            password_hash: non_blank(input.password_hash),
            active: input.active,
            created_at: Utc::now(),
        };
        info!(user_id = %user.id, role = ?user.role, "user created");
        self.users.push(user.clone());
        Ok(user)
    }

    /// Updates a user. A missing password hash keeps the current one.
    pub fn update_user(&mut self, id: &str, input: UserInput) -> Result<User> {
        input.validate()?;
        let index = require(&self.users, id)?;
        let email = self.check_email(&input.email, Some(index))?;
        let loses_admin = self.users[index].is_active_admin() && (input.role != Role::Admin || !input.active);
        if loses_admin && self.active_admin_count() == 1 {
            return Err(StoreError::Conflict("cannot demote or deactivate the last admin".into()));
        }
        let user = &mut self.users[index];
        user.email = email;
        user.name = input.name.trim().to_string();
        user.role = input.role;
        user.active = input.active;
        if let Some(hash) = non_blank(input.password_hash) { user.password_hash = Some(hash); }
        Ok(user.clone())
    }

    /// Deletes a user and detaches them from orders, reviews and tickets.
    pub fn delete_user(&mut self, id: &str) -> Result<User> {
        let index = require(&self.users, id)?;
        if self.users[index].is_active_admin() && self.active_admin_count() == 1 {
            return Err(StoreError::Conflict("cannot delete the last admin".into()));
        }
        let user = self.users.remove(index);
        let owned = Some(user.id.clone());
        self.orders.iter_mut().filter(|o| o.user_id == owned).for_each(|o| o.user_id = None);
        self.reviews.iter_mut().filter(|r| r.user_id == owned).for_each(|r| r.user_id = None);
        self.tickets.iter_mut().filter(|t| t.user_id == owned).for_each(|t| t.user_id = None);
        info!(user_id = %user.id, "user deleted");
        Ok(user)
    }

    /// Returns the user if they exist, are active and hold `permission`.
    pub fn authorize(&self, user_id: &str, permission: Permission) -> Result<&User> {
        let user = find(&self.users, user_id).ok_or(StoreError::Unauthorized)?;
        if !user.can(permission) {
            warn!(user_id = %user.id, %permission, "permission denied");
            return Err(StoreError::Forbidden(permission));
        }
        Ok(user)
    }

    fn active_admin_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_active_admin()).count()
    }

    fn check_email(&self, email: &str, index: Option<usize>) -> Result<String> {
        let email = Email::parse(email).map_err(|e| StoreError::Validation(e.to_string()))?.into_string();
        let clash = self.users.iter().enumerate().any(|(i, u)| Some(i) != index && u.email == email);
        if clash {
            return Err(StoreError::Conflict(format!("email {email} is already registered")));
        }
        Ok(email)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn update_settings(&mut self, mut settings: SiteSettings) -> SiteSettings {
        settings.normalize();
        info!(store_name = %settings.store_name, currency = %settings.currency, "settings updated");
        self.settings = settings.clone();
        settings
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub fn dashboard_stats(&self) -> DashboardStats {
        let mut orders_by_status: BTreeMap<OrderStatus, usize> = OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        let mut revenue = Decimal::ZERO;
        for order in &self.orders {
            *orders_by_status.entry(order.status).or_default() += 1;
            if order.status.counts_as_revenue() {
                revenue = revenue.checked_add(order.total).unwrap_or(Decimal::MAX);
            }
        }
        let threshold = self.settings.low_stock_threshold;
        let mut low_stock: Vec<LowStockItem> = self.products.iter()
            .filter(|p| p.track_stock && p.status != ProductStatus::Archived && p.stock <= threshold)
            .map(|p| LowStockItem { product_id: p.id.clone(), name: p.name.clone(), stock: p.stock })
            .collect();
        low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.product_id.cmp(&b.product_id)));

        DashboardStats {
            revenue: round_money(revenue),
            orders_by_status,
            low_stock,
            pending_reviews: self.pending_reviews().len(),
            open_tickets: self.tickets.iter().filter(|t| t.is_open()).count(),
            product_count: self.products.len(),
            customer_count: self.users.iter().filter(|u| u.role == Role::Customer).count(),
            currency: self.settings.currency.clone(),
        }
    }
}
