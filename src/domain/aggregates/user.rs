//! Users, roles and permissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Opaque credential hash owned by the auth layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool { true }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role { Admin, Manager, Editor, Support, #[default] Customer }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageProducts,
    ManageOrders,
    ManageCoupons,
    ManagePages,
    ManageMedia,
    ManageReviews,
    ManageSupport,
    ManageUsers,
    ManageSettings,
    ViewDashboard,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Self::ManageProducts, Self::ManageOrders, Self::ManageCoupons, Self::ManagePages, Self::ManageMedia,
        Self::ManageReviews, Self::ManageSupport, Self::ManageUsers, Self::ManageSettings, Self::ViewDashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageProducts => "manage_products",
            Self::ManageOrders => "manage_orders",
            Self::ManageCoupons => "manage_coupons",
            Self::ManagePages => "manage_pages",
            Self::ManageMedia => "manage_media",
            Self::ManageReviews => "manage_reviews",
            Self::ManageSupport => "manage_support",
            Self::ManageUsers => "manage_users",
            Self::ManageSettings => "manage_settings",
            Self::ViewDashboard => "view_dashboard",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Role {
    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Role::Admin => true,
            Role::Manager => !matches!(permission, ManageUsers | ManageSettings),
            Role::Editor => matches!(permission, ManageProducts | ManagePages | ManageMedia | ManageReviews | ViewDashboard),
            Role::Support => matches!(permission, ManageOrders | ManageSupport | ManageReviews | ViewDashboard),
            Role::Customer => false,
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL.into_iter().filter(|p| self.allows(*p)).collect()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct UserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl User {
    pub fn can(&self, permission: Permission) -> bool { self.active && self.role.allows(permission) }

    pub fn is_active_admin(&self) -> bool { self.active && self.role == Role::Admin }
}
