//! Best result per game, kept on this device

use tracing::{info, warn};

use crate::consent::{self, ConsentPreferences};
use crate::error::{StorageError, StorageResult};
use crate::game::GameKind;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Stored,
    NotImproved,
    ConsentWithheld,
}

/// Score records gated by the functional consent flag. Every read and write
/// is a no-op until the player allows functional storage.
#[derive(Debug)]
pub struct ScoreStore {
    storage: Box<dyn KeyValueStore>,
    functional: bool,
}

impl ScoreStore {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        let functional = match consent::load(storage.as_ref()) {
            Ok(prefs) => prefs.is_some_and(|p| p.functional),
            Err(e) => {
                warn!("cannot read consent, treating functional storage as declined: {e}");
                false
            }
        };
        Self {
            storage,
            functional,
        }
    }

    /// SQLite under the state directory, or memory when that cannot be opened
    pub fn open_default() -> Self {
        match SqliteStore::open_default() {
            Ok(db) => Self::new(Box::new(db)),
            Err(e) => {
                warn!("score database unavailable, scores will not persist: {e}");
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn functional_allowed(&self) -> bool {
        self.functional
    }

    pub fn consent(&self) -> Option<ConsentPreferences> {
        consent::load(self.storage.as_ref()).ok().flatten()
    }

    /// Record a consent decision; returns how many keys the sweep removed
    pub fn set_consent(&mut self, prefs: &ConsentPreferences) -> StorageResult<usize> {
        let removed = consent::save(self.storage.as_mut(), prefs)?;
        self.functional = prefs.functional;
        Ok(removed)
    }

    pub fn load(&self, key: &str) -> Option<String> {
        if !self.functional {
            return None;
        }
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, "cannot read score: {e}");
                None
            }
        }
    }

    pub fn best(&self, kind: GameKind) -> Option<u64> {
        self.load(kind.score_key())?.parse().ok()
    }

    /// Overwrite the record only when `value` is strictly better
    pub fn save(&mut self, key: &str, value: &str) -> StorageResult<SaveOutcome> {
        let kind =
            GameKind::from_score_key(key).ok_or_else(|| StorageError::UnknownKey(key.to_string()))?;
        let candidate: u64 = value
            .trim()
            .parse()
            .map_err(|_| StorageError::InvalidValue(value.to_string()))?;
        if !self.functional {
            return Ok(SaveOutcome::ConsentWithheld);
        }

        let current = self.storage.get(key)?.and_then(|v| v.parse::<u64>().ok());
        if let Some(current) = current {
            if !kind.ordering().is_better(candidate, current) {
                return Ok(SaveOutcome::NotImproved);
            }
        }

        self.storage.set(key, &candidate.to_string())?;
        info!(game = %kind, value = candidate, previous = ?current, "new best score");
        Ok(SaveOutcome::Stored)
    }

    pub fn save_score(&mut self, kind: GameKind, value: u64) -> StorageResult<SaveOutcome> {
        self.save(kind.score_key(), &value.to_string())
    }

    pub fn clear(&mut self, key: &str) -> StorageResult<()> {
        if self.functional {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    /// Remove every game's record; returns how many existed
    pub fn clear_all(&mut self) -> StorageResult<usize> {
        if !self.functional {
            return Ok(0);
        }
        let mut removed = 0;
        for kind in GameKind::ALL {
            if self.storage.remove(kind.score_key())? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn consented() -> ScoreStore {
        let mut store = ScoreStore::in_memory();
        store.set_consent(&ConsentPreferences::all()).unwrap();
        store
    }

    #[test]
    fn test_higher_is_better_keeps_best() {
        let mut store = consented();
        assert_eq!(store.save("best-wpm-typing", "40").unwrap(), SaveOutcome::Stored);
        assert_eq!(store.save("best-wpm-typing", "35").unwrap(), SaveOutcome::NotImproved);
        assert_eq!(store.save("best-wpm-typing", "40").unwrap(), SaveOutcome::NotImproved);
        assert_eq!(store.load("best-wpm-typing").as_deref(), Some("40"));
    }

    #[test]
    fn test_lower_is_better_for_reaction() {
        let mut store = consented();
        store.save_score(GameKind::Reaction, 260).unwrap();
        assert_eq!(store.save_score(GameKind::Reaction, 230).unwrap(), SaveOutcome::Stored);
        assert_eq!(store.save_score(GameKind::Reaction, 300).unwrap(), SaveOutcome::NotImproved);
        assert_eq!(store.best(GameKind::Reaction), Some(230));
    }

    #[test]
    fn test_everything_is_noop_without_consent() {
        let mut store = ScoreStore::in_memory();
        assert!(!store.functional_allowed());
        assert_eq!(store.save("best-level-simon", "3").unwrap(), SaveOutcome::ConsentWithheld);
        assert_eq!(store.load("best-level-simon"), None);
        assert_eq!(store.clear_all().unwrap(), 0);
    }

    #[test]
    fn test_withdrawing_consent_clears_scores() {
        let mut store = consented();
        store.save_score(GameKind::Simon, 5).unwrap();
        store.set_consent(&ConsentPreferences::necessary_only()).unwrap();
        store.set_consent(&ConsentPreferences::all()).unwrap();
        assert_eq!(store.best(GameKind::Simon), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = consented();
        store.save_score(GameKind::Typing, 50).unwrap();
        store.save_score(GameKind::NBack, 2).unwrap();
        store.clear("best-wpm-typing").unwrap();
        store.clear("best-wpm-typing").unwrap();
        assert_eq!(store.best(GameKind::Typing), None);
        assert_eq!(store.clear_all().unwrap(), 1);
        assert_eq!(store.clear_all().unwrap(), 0);
    }

    #[test]
    fn test_rejects_unknown_keys_and_garbage() {
        let mut store = consented();
        assert_matches!(store.save("best-score-chess", "1"), Err(StorageError::UnknownKey(_)));
        assert_matches!(store.save("best-wpm-typing", "fast"), Err(StorageError::InvalidValue(_)));
    }

    #[test]
    fn test_consent_survives_reopen() {
        let mut storage = MemoryStore::new();
        consent::accept_all(&mut storage).unwrap();
        let store = ScoreStore::new(Box::new(storage));
        assert!(store.functional_allowed());
    }
}
