//! JSON file persistence.
//!
//! The whole store is one pretty-printed JSON document. Loading is lenient:
//! a bad record costs only that record, and an unreadable document is moved
//! aside instead of blocking startup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use super::Store;
use crate::domain::aggregates::SiteSettings;
use crate::Result;

#[derive(Clone, Debug)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    /// Reads and normalizes the store. A missing or empty file yields a fresh store.
    pub async fn load(&self) -> Result<Store> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no data file yet, starting empty");
                return Ok(fresh());
            }
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(fresh());
        }

        let value = match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                self.quarantine("top level is not an object").await?;
                return Ok(fresh());
            }
            Err(err) => {
                self.quarantine(&err.to_string()).await?;
                return Ok(fresh());
            }
        };

        let mut store = decode_lenient(value);
        store.normalize();
        info!(
            path = %self.path.display(),
            products = store.products.len(),
            orders = store.orders.len(),
            users = store.users.len(),
            "store loaded"
        );
        Ok(store)
    }

    pub async fn save(&self, store: &Store) -> Result<()> {
        let contents = serde_json::to_string_pretty(store)?;
        self.write(&contents).await
    }

    /// Replaces the file atomically: write a sibling temp file, then rename it over.
    pub async fn write(&self, contents: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let tmp = self.sibling("tmp");
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), bytes = contents.len(), "store written");
        Ok(())
    }

    async fn quarantine(&self, reason: &str) -> Result<()> {
        let target = self.sibling(&format!("corrupt-{}", Utc::now().timestamp()));
        warn!(path = %self.path.display(), moved_to = %target.display(), reason, "data file unreadable, starting empty");
        fs::rename(&self.path, &target).await?;
        Ok(())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "store.json".into());
        name.push(format!(".{suffix}"));
        self.path.with_file_name(name)
    }
}

fn fresh() -> Store {
    let mut store = Store::new();
    store.normalize();
    store
}

/// Decodes each collection record by record, skipping records that do not fit.
pub fn decode_lenient(value: Value) -> Store {
    let Value::Object(mut root) = value else { return Store::new() };
    let mut take = |key: &str| root.remove(key).unwrap_or(Value::Null);

    let settings: SiteSettings = match take("settings") {
        Value::Null => Default::default(),
        value => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(%err, "settings unreadable, using defaults");
            Default::default()
        }),
    };

    Store {
        settings,
        products: records(take("products"), "products"),
        categories: records(take("categories"), "categories"),
        tags: records(take("tags"), "tags"),
        media: records(take("media"), "media"),
        coupons: records(take("coupons"), "coupons"),
        orders: records(take("orders"), "orders"),
        reviews: records(take("reviews"), "reviews"),
        users: records(take("users"), "users"),
        pages: records(take("pages"), "pages"),
        tickets: records(take("tickets"), "tickets"),
        ..Store::default()
    }
}

fn records<T: DeserializeOwned>(value: Value, collection: &str) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        _ => {
            warn!(collection, "collection is not an array, ignoring");
            return Vec::new();
        }
    };
    items.into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(collection, index, %err, "dropping unreadable record");
                None
            }
        })
        .collect()
}
