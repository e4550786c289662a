// src/storage.rs
//
// The persisted-preferences collaborator. The real backend (browser storage,
// a file, anything key → JSON value) lives behind `SettingsStore`; the core
// only ever reads typed preferences through `load_prefs`, which degrades to
// documented defaults on any failure.

use async_trait::async_trait;
use dashmap::DashMap;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::presentation::DisplayMode;
use crate::tiers::TierSettings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("stored value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Well-known preference keys.
pub mod keys {
    pub const HOURLY_WAGE: &str = "hourly_wage";
    pub const DISPLAY_MODE: &str = "display_mode";
    pub const SHOW_HOURS: &str = "show_hours";
    pub const TIER_SETTINGS: &str = "tier_settings";
}

/// Key-value preference storage.
///
/// ## Example
///
/// ```rust,no_run
/// use wagelens::storage::{MemoryStore, SettingsStore, keys};
/// use serde_json::json;
///
/// # async fn demo() -> Result<(), wagelens::storage::StoreError> {
/// let store = MemoryStore::new();
/// store.set(keys::HOURLY_WAGE, json!(25.0)).await?;
/// assert_eq!(store.get(keys::HOURLY_WAGE).await?, Some(json!(25.0)));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-memory store used by tests and the CLI.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// User preferences as the core consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPrefs {
    /// Hourly wage; zero means unset and disables conversion.
    pub hourly_wage: f64,
    pub display_mode: DisplayMode,
    pub show_hours: bool,
    pub tiers: TierSettings,
}

impl Default for UserPrefs {
    fn default() -> Self {
        Self {
            hourly_wage: 0.0,
            display_mode: DisplayMode::SideBySide,
            show_hours: true,
            tiers: TierSettings::default(),
        }
    }
}

/// Read all preferences. Each key degrades independently to its default on a
/// missing value, a decode failure, or a backend error; a broken store never
/// breaks a pass.
pub async fn load_prefs(store: &dyn SettingsStore) -> UserPrefs {
    let mut prefs = UserPrefs::default();

    match store.get(keys::HOURLY_WAGE).await {
        Ok(Some(value)) => match value.as_f64() {
            Some(wage) if wage.is_finite() && wage >= 0.0 => prefs.hourly_wage = wage,
            _ => warn!("stored wage {:?} is not a non-negative number, using default", value),
        },
        Ok(None) => {}
        Err(err) => warn!("failed to read wage, using default: {err}"),
    }

    match store.get(keys::DISPLAY_MODE).await {
        Ok(Some(value)) => match value.as_str().map(str::parse::<DisplayMode>) {
            Some(Ok(mode)) => prefs.display_mode = mode,
            _ => warn!("stored display mode {:?} is invalid, using default", value),
        },
        Ok(None) => {}
        Err(err) => warn!("failed to read display mode, using default: {err}"),
    }

    match store.get(keys::SHOW_HOURS).await {
        Ok(Some(value)) => match value.as_bool() {
            Some(show) => prefs.show_hours = show,
            None => warn!("stored show-hours flag {:?} is not a boolean, using default", value),
        },
        Ok(None) => {}
        Err(err) => warn!("failed to read show-hours flag, using default: {err}"),
    }

    match store.get(keys::TIER_SETTINGS).await {
        Ok(Some(value)) => match serde_json::from_value::<TierSettings>(value) {
            Ok(tiers) if tiers.is_well_formed() => prefs.tiers = tiers,
            Ok(tiers) => warn!("stored tier thresholds {:?} are not ordered, using defaults", tiers),
            Err(err) => warn!("failed to decode tier settings, using defaults: {err}"),
        },
        Ok(None) => {}
        Err(err) => warn!("failed to read tier settings, using defaults: {err}"),
    }

    prefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let store = MemoryStore::new();
        let prefs = load_prefs(&store).await;
        assert_eq!(prefs.hourly_wage, 0.0);
        assert_eq!(prefs.display_mode, DisplayMode::SideBySide);
        assert!(prefs.show_hours);
    }

    #[tokio::test]
    async fn test_reads_stored_values() {
        let store = MemoryStore::new();
        store.set(keys::HOURLY_WAGE, json!(25.0)).await.unwrap();
        store
            .set(keys::DISPLAY_MODE, json!("replace"))
            .await
            .unwrap();
        store.set(keys::SHOW_HOURS, json!(false)).await.unwrap();

        let prefs = load_prefs(&store).await;
        assert_eq!(prefs.hourly_wage, 25.0);
        assert_eq!(prefs.display_mode, DisplayMode::Replace);
        assert!(!prefs.show_hours);
    }

    #[tokio::test]
    async fn test_bad_values_degrade_to_defaults() {
        let store = MemoryStore::new();
        store.set(keys::HOURLY_WAGE, json!(-5.0)).await.unwrap();
        store
            .set(keys::DISPLAY_MODE, json!("sideways"))
            .await
            .unwrap();
        store
            .set(
                keys::TIER_SETTINGS,
                json!({"type": "money", "green": 50.0, "yellow": 10.0, "red": 5.0}),
            )
            .await
            .unwrap();

        let prefs = load_prefs(&store).await;
        assert_eq!(prefs.hourly_wage, 0.0);
        assert_eq!(prefs.display_mode, DisplayMode::SideBySide);
        assert_eq!(prefs.tiers, TierSettings::default());
    }
}
