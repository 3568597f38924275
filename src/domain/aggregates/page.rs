//! CMS pages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: PageStatus,
    #[serde(default)]
    pub show_in_nav: bool,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus { #[default] Draft, Published }

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct PageInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: PageStatus,
    #[serde(default)]
    pub show_in_nav: bool,
    #[serde(default)]
    #[validate(length(max = 70))]
    pub seo_title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 320))]
    pub seo_description: Option<String>,
}

impl Page {
    pub fn is_published(&self) -> bool { self.status == PageStatus::Published }
}
