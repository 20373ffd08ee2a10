//! Storage consent record and the functional-data sweep

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StorageResult;
use crate::game::GameKind;
use crate::storage::KeyValueStore;

pub const CONSENT_KEY: &str = "cookie-consent";
pub const CONSENT_DATE_KEY: &str = "cookie-consent-date";

/// Substrings that mark a key as functional data
const FUNCTIONAL_MARKERS: [&str; 3] = ["game-", "score-", "best-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPreferences {
    pub necessary: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl Default for ConsentPreferences {
    fn default() -> Self {
        Self::necessary_only()
    }
}

impl ConsentPreferences {
    pub fn all() -> Self {
        Self {
            necessary: true,
            functional: true,
            analytics: true,
            marketing: true,
        }
    }

    pub fn necessary_only() -> Self {
        Self {
            necessary: true,
            functional: false,
            analytics: false,
            marketing: false,
        }
    }

    /// Necessary storage cannot be declined
    pub fn custom(functional: bool, analytics: bool, marketing: bool) -> Self {
        Self {
            necessary: true,
            functional,
            analytics,
            marketing,
        }
    }
}

pub fn is_functional_key(key: &str) -> bool {
    FUNCTIONAL_MARKERS.iter().any(|m| key.contains(m)) || GameKind::from_score_key(key).is_some()
}

/// Stored decision, `None` if the player has not chosen yet or the record is unreadable
pub fn load(store: &dyn KeyValueStore) -> StorageResult<Option<ConsentPreferences>> {
    let Some(raw) = store.get(CONSENT_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(prefs) => Ok(Some(prefs)),
        Err(e) => {
            tracing::warn!("ignoring unreadable consent record: {e}");
            Ok(None)
        }
    }
}

/// Persist a decision. Declining functional storage removes existing
/// functional data; the number of removed keys is returned.
pub fn save(store: &mut dyn KeyValueStore, prefs: &ConsentPreferences) -> StorageResult<usize> {
    store.set(CONSENT_KEY, &serde_json::to_string(prefs)?)?;
    store.set(CONSENT_DATE_KEY, &Local::now().to_rfc3339())?;
    if prefs.functional {
        return Ok(0);
    }
    clear_functional(store)
}

pub fn accept_all(store: &mut dyn KeyValueStore) -> StorageResult<usize> {
    save(store, &ConsentPreferences::all())
}

pub fn accept_necessary(store: &mut dyn KeyValueStore) -> StorageResult<usize> {
    save(store, &ConsentPreferences::necessary_only())
}

pub fn save_custom(
    store: &mut dyn KeyValueStore,
    functional: bool,
    analytics: bool,
    marketing: bool,
) -> StorageResult<usize> {
    save(store, &ConsentPreferences::custom(functional, analytics, marketing))
}

fn clear_functional(store: &mut dyn KeyValueStore) -> StorageResult<usize> {
    let mut removed = 0;
    for key in store.keys()? {
        if is_functional_key(&key) && store.remove(&key)? {
            removed += 1;
        }
    }
    if removed > 0 {
        info!(removed, "cleared functional data after consent change");
    }
    Ok(removed)
}
