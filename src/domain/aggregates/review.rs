//! Product reviews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::value_objects::Rating;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus { #[default] Pending, Approved, Rejected }

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct ReviewInput {
    #[serde(default)]
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    /// Clamped into 1..=5 on submit.
    pub rating: i64,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

/// Average of approved ratings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings.into_iter().fold((0u64, 0usize), |(sum, count), r| (sum + r.value() as u64, count + 1));
        if count == 0 { return Self::default(); }
        let average = (sum as f64 / count as f64 * 10.0).round() / 10.0;
        Self { average, count }
    }
}
