use std::{collections::HashMap, fs, io, path::Path};

use anyhow::Context;
use inventory_core::{
    Grouping, MoneyFormat, StorageKeys, DEFAULT_PRODUCTS_KEY, DEFAULT_SESSION_KEY,
    DEFAULT_USERS_KEY,
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "inventory.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/inventory.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub users_key: String,
    pub session_key: String,
    pub products_key: String,
    pub currency_symbol: String,
    pub money_grouping: Grouping,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            users_key: DEFAULT_USERS_KEY.into(),
            session_key: DEFAULT_SESSION_KEY.into(),
            products_key: DEFAULT_PRODUCTS_KEY.into(),
            currency_symbol: "₹".into(),
            money_grouping: Grouping::Indian,
        }
    }
}

impl Settings {
    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            users: self.users_key.clone(),
            session: self.session_key.clone(),
            products: self.products_key.clone(),
        }
    }

    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat {
            symbol: self.currency_symbol.clone(),
            grouping: self.money_grouping,
        }
    }
}

/// Defaults, then the config file, then `APP__*` environment variables.
///
/// A missing file is fine unless it was named explicitly.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    match fs::read_to_string(path) {
        Ok(raw) => {
            let table = toml::from_str::<HashMap<String, String>>(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            apply_file(&mut settings, &table);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound && config_path.is_none() => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings.database_url = normalize_database_url(&settings.database_url);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, table: &HashMap<String, String>) {
    if let Some(v) = table.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = table.get("users_key") {
        settings.users_key = v.clone();
    }
    if let Some(v) = table.get("session_key") {
        settings.session_key = v.clone();
    }
    if let Some(v) = table.get("products_key") {
        settings.products_key = v.clone();
    }
    if let Some(v) = table.get("currency_symbol") {
        settings.currency_symbol = v.clone();
    }
    if let Some(v) = table.get("money_grouping") {
        set_grouping(settings, v);
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("INVENTORY_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__USERS_KEY") {
        settings.users_key = v;
    }
    if let Some(v) = lookup("APP__SESSION_KEY") {
        settings.session_key = v;
    }
    if let Some(v) = lookup("APP__PRODUCTS_KEY") {
        settings.products_key = v;
    }

    if let Some(v) = lookup("APP__CURRENCY_SYMBOL") {
        settings.currency_symbol = v;
    }
    if let Some(v) = lookup("APP__MONEY_GROUPING") {
        set_grouping(settings, &v);
    }
}

fn set_grouping(settings: &mut Settings, raw: &str) {
    match raw.parse() {
        Ok(grouping) => settings.money_grouping = grouping,
        Err(err) => warn!(error = %err, "keeping money grouping {}", settings.money_grouping),
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.into();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
