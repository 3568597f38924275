//! Process configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Result, StoreError};

pub const DEFAULT_DATA_FILE: &str = "data/store.json";
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_PORT: u16 = 8083;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// `None` keeps the store in memory only.
    pub data_file: Option<PathBuf>,
    pub persist_debounce: Duration,
    pub port: u16,
    pub nats_url: Option<String>,
    /// Seed a demo catalog into an empty store.
    pub seed_demo: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: Some(PathBuf::from(DEFAULT_DATA_FILE)),
            persist_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            port: DEFAULT_PORT,
            nats_url: None,
            seed_demo: false,
        }
    }
}

impl StoreConfig {
    /// Reads `STORE_DATA_FILE`, `STORE_PERSIST_DEBOUNCE_MS`, `PORT`, `NATS_URL`
    /// and `STORE_SEED_DEMO`. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn in_memory() -> Self {
        Self { data_file: None, ..Self::default() }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let data_file = match lookup("STORE_DATA_FILE") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path.trim())),
            None => defaults.data_file,
        };
        let persist_debounce = match lookup("STORE_PERSIST_DEBOUNCE_MS") {
            Some(ms) => Duration::from_millis(parse("STORE_PERSIST_DEBOUNCE_MS", &ms)?),
            None => defaults.persist_debounce,
        };
        let port = match lookup("PORT") {
            Some(port) => parse("PORT", &port)?,
            None => defaults.port,
        };
        let seed_demo = match lookup("STORE_SEED_DEMO") {
            Some(flag) => parse_bool("STORE_SEED_DEMO", &flag)?,
            None => defaults.seed_demo,
        };
        Ok(Self {
            data_file,
            persist_debounce,
            port,
            nats_url: lookup("NATS_URL").filter(|u| !u.trim().is_empty()),
            seed_demo,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| StoreError::Config(format!("{key} has invalid value {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(StoreError::Config(format!("{key} must be a boolean, got {value:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<StoreConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        StoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), StoreConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("STORE_DATA_FILE", ""), ("STORE_PERSIST_DEBOUNCE_MS", "50"), ("PORT", "9000"),
            ("NATS_URL", "nats://localhost:4222"), ("STORE_SEED_DEMO", "yes"),
        ]).unwrap();
        assert_eq!(cfg.data_file, None);
        assert_eq!(cfg.persist_debounce, Duration::from_millis(50));
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.nats_url.as_deref(), Some("nats://localhost:4222"));
        assert!(cfg.seed_demo);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(StoreError::Config(_))));
        assert!(matches!(config(&[("STORE_SEED_DEMO", "maybe")]), Err(StoreError::Config(_))));
    }
}
