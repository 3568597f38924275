//! Categories and tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Category {
    pub fn new(id: String, name: &str, slug: String) -> Self {
        Self { id, name: name.trim().to_string(), slug, description: None, parent_id: None, created_at: Utc::now() }
    }
}

impl Tag {
    pub fn new(id: String, name: &str, slug: String) -> Self {
        Self { id, name: name.trim().to_string(), slug }
    }
}
