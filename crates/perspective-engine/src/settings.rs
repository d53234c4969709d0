//! Persisted user settings
//!
//! The record is flat and keyed the way the settings surface stores it.
//! Absent keys fall back to defaults; a present key with the wrong shape is an
//! error naming the key.

use crate::error::StoreError;
use crate::store::{ConfigStore, SettingsMap};
use indexmap::IndexMap;
use perspective_core::{ConversionMode, ValuationConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Monthly income
pub const KEY_SALARY: &str = "salary";
/// Item name for item equivalence
pub const KEY_ITEM_NAME: &str = "itemName";
/// Item unit cost
pub const KEY_ITEM_COST: &str = "itemCost";
/// Selected conversion mode
pub const KEY_CONVERSION_MODE: &str = "conversionMode";
/// Annotate on page load
pub const KEY_AUTO_CONVERT: &str = "autoConvert";
/// Per-host enablement map
pub const KEY_ENABLED_SITES: &str = "enabledSites";

/// Every key the settings record uses
pub const SETTINGS_KEYS: [&str; 6] = [
    KEY_SALARY,
    KEY_ITEM_NAME,
    KEY_ITEM_COST,
    KEY_CONVERSION_MODE,
    KEY_AUTO_CONVERT,
    KEY_ENABLED_SITES,
];

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Monthly income; zero until the user sets it
    pub salary: f64,
    /// Item name
    pub item_name: String,
    /// Item unit cost
    pub item_cost: f64,
    /// Conversion mode
    pub conversion_mode: ConversionMode,
    /// Annotate pages on load; off until the user turns it on
    pub auto_convert: bool,
    /// Host → enabled; hosts not listed are enabled
    pub enabled_sites: IndexMap<String, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        let valuation = ValuationConfig::default();
        Self {
            salary: valuation.monthly_income,
            item_name: valuation.item_name,
            item_cost: valuation.item_unit_cost,
            conversion_mode: valuation.mode,
            auto_convert: false,
            enabled_sites: IndexMap::new(),
        }
    }
}

impl Settings {
    /// Read from `store`, defaulting absent or null keys
    ///
    /// # Errors
    /// - [`StoreError::InvalidValue`] if a stored value has the wrong shape
    /// - Any error the store itself reports
    pub async fn load(store: &dyn ConfigStore) -> Result<Self, StoreError> {
        let mut record = store.get(&SETTINGS_KEYS).await?;
        let mut settings = Self::default();
        if let Some(salary) = field(&mut record, KEY_SALARY)? {
            settings.salary = salary;
        }
        if let Some(item_name) = field(&mut record, KEY_ITEM_NAME)? {
            settings.item_name = item_name;
        }
        if let Some(item_cost) = field(&mut record, KEY_ITEM_COST)? {
            settings.item_cost = item_cost;
        }
        if let Some(mode) = field(&mut record, KEY_CONVERSION_MODE)? {
            settings.conversion_mode = mode;
        }
        if let Some(auto_convert) = field(&mut record, KEY_AUTO_CONVERT)? {
            settings.auto_convert = auto_convert;
        }
        if let Some(sites) = field(&mut record, KEY_ENABLED_SITES)? {
            settings.enabled_sites = sites;
        }
        Ok(settings)
    }

    /// Write every key to `store`
    ///
    /// # Errors
    /// Returns any error the store reports
    pub async fn save(&self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(record) => store.set(record).await,
            _ => Ok(()),
        }
    }

    /// Valuation parameters derived from these settings
    #[must_use]
    pub fn valuation_config(&self) -> ValuationConfig {
        ValuationConfig::new()
            .with_mode(self.conversion_mode)
            .with_income(self.salary)
            .with_item(self.item_name.clone(), self.item_cost)
    }

    /// Copy valuation parameters into these settings
    pub fn apply_valuation(&mut self, config: &ValuationConfig) {
        self.conversion_mode = config.mode;
        self.salary = config.monthly_income;
        self.item_name.clone_from(&config.item_name);
        self.item_cost = config.item_unit_cost;
    }

    /// Whether annotation is enabled on `host`
    #[must_use]
    pub fn is_enabled_for(&self, host: &str) -> bool {
        self.enabled_sites.get(host) != Some(&false)
    }

    /// Enable or disable annotation on `host`
    pub fn set_site_enabled(&mut self, host: impl Into<String>, enabled: bool) {
        self.enabled_sites.insert(host.into(), enabled);
    }

    /// Configuration to activate with when a page on `host` loads
    ///
    /// `None` when auto-convert is off, the host is disabled, or the settings
    /// do not yet form a valid configuration.
    #[must_use]
    pub fn auto_activation(&self, host: &str) -> Option<ValuationConfig> {
        if !self.auto_convert || !self.is_enabled_for(host) {
            return None;
        }
        let config = self.valuation_config();
        config.validate().ok().map(|()| config)
    }
}

fn field<T: DeserializeOwned>(record: &mut SettingsMap, key: &str) -> Result<Option<T>, StoreError> {
    record
        .remove(key)
        .filter(|value| !value.is_null())
        .map(|value| {
            serde_json::from_value(value).map_err(|err| StoreError::InvalidValue {
                key: key.to_string(),
                message: err.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store(value: Value) -> MemoryStore {
        match value {
            Value::Object(map) => MemoryStore::with_values(map),
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let settings = Settings::load(&MemoryStore::new()).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.item_name, "Coffee");
        assert_eq!(settings.item_cost, 150.0);
        assert_eq!(settings.salary, 0.0);
        assert_eq!(settings.conversion_mode, ConversionMode::TimeToEarn);
        assert!(!settings.auto_convert);
        assert!(settings.auto_activation("example.com").is_none());
    }

    #[tokio::test]
    async fn loads_stored_keys() {
        let store = store(json!({
            "salary": 80000,
            "itemName": "Pizza",
            "itemCost": 300,
            "conversionMode": "item",
            "autoConvert": true,
            "enabledSites": {"news.example": false}
        }));
        let settings = Settings::load(&store).await.unwrap();
        assert_eq!(settings.conversion_mode, ConversionMode::ItemEquivalence);
        assert!(!settings.is_enabled_for("news.example"));
        assert!(settings.is_enabled_for("shop.example"));

        let config = settings.auto_activation("shop.example").unwrap();
        assert_eq!(config.item_name, "Pizza");
        assert!(settings.auto_activation("news.example").is_none());
    }

    #[tokio::test]
    async fn wrong_shape_names_the_key() {
        let store = store(json!({"salary": "lots"}));
        match Settings::load(&store).await {
            Err(StoreError::InvalidValue { key, .. }) => assert_eq!(key, "salary"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.apply_valuation(&ValuationConfig::new().with_income(45_000.0));
        settings.set_site_enabled("bank.example", false);
        settings.auto_convert = true;
        settings.save(&store).await.unwrap();

        assert_eq!(store.len(), SETTINGS_KEYS.len());
        assert_eq!(Settings::load(&store).await.unwrap(), settings);
    }
}
