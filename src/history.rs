//! One CSV row per finished session

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::consent::ConsentPreferences;
use crate::error::StorageResult;
use crate::game::GameKind;
use crate::score_store::ScoreStore;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: DateTime<Local>,
    pub game: GameKind,
    pub trials: usize,
    pub hits: usize,
    pub misses: usize,
    pub false_positives: usize,
    pub too_early: usize,
    pub score: Option<u64>,
}

impl HistoryRecord {
    pub fn from_session(session: &Session) -> Self {
        let counters = session.counters();
        Self {
            date: Local::now(),
            game: session.kind(),
            trials: session.counted_trials(),
            hits: counters.hits,
            misses: counters.misses,
            false_positives: counters.false_positives,
            too_early: counters.too_early,
            score: session.kind().final_score(session),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn open_default() -> Option<Self> {
        AppDirs::history_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &HistoryRecord) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet we need to emit a header
        let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Delete the log file; returns whether there was one
    pub fn clear(&self) -> StorageResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_all(&self) -> StorageResult<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<HistoryRecord>, _>>()?;
        Ok(records)
    }
}

/// Log a finished session if the player allows functional storage.
/// Aborted and unfinished sessions are never logged.
pub fn record_session(log: &SessionLog, store: &ScoreStore, session: &Session) -> StorageResult<bool> {
    if !store.functional_allowed() || !session.is_completed() {
        return Ok(false);
    }
    log.append(&HistoryRecord::from_session(session))?;
    Ok(true)
}

/// Record a consent decision. Declining functional storage also deletes
/// the session log along with the swept score keys.
pub fn apply_consent(
    store: &mut ScoreStore,
    log: Option<&SessionLog>,
    prefs: &ConsentPreferences,
) -> StorageResult<usize> {
    let removed = store.set_consent(prefs)?;
    if !prefs.functional {
        if let Some(log) = log {
            if log.clear()? {
                info!(path = %log.path().display(), "deleted session history after consent change");
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::Response;
    use tempfile::tempdir;

    fn record(game: GameKind, score: Option<u64>) -> HistoryRecord {
        HistoryRecord {
            date: Local::now(),
            game,
            trials: 5,
            hits: 5,
            misses: 0,
            false_positives: 0,
            too_early: 1,
            score,
        }
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("history.csv"));
        log.append(&record(GameKind::Reaction, Some(231))).unwrap();
        log.append(&record(GameKind::Simon, None)).unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("date,")).count(), 1);

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].game, GameKind::Reaction);
        assert_eq!(rows[0].score, Some(231));
        assert_eq!(rows[1].score, None);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("none.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_aborted_session_is_not_logged() {
        let dir = tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("history.csv"));
        let mut store = ScoreStore::in_memory();
        store.set_consent(&ConsentPreferences::all()).unwrap();

        let mut session = Session::new(GameKind::ColorBlind);
        session.start(GameKind::ColorBlind.default_config(), 0).unwrap();
        session.abort(10);
        assert!(!record_session(&log, &store, &session).unwrap());
        assert!(log.read_all().unwrap().is_empty());
    }

    fn completed_colorblind() -> Session {
        let mut session = Session::new(GameKind::ColorBlind);
        session.start(GameKind::ColorBlind.default_config(), 0).unwrap();
        let mut at = 10;
        while !session.is_finished() {
            session.record_response(Response::Skip, at).unwrap();
            at += 10;
        }
        session
    }

    #[test]
    fn test_declining_functional_storage_deletes_history() {
        let dir = tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("history.csv"));
        let mut store = ScoreStore::in_memory();
        apply_consent(&mut store, Some(&log), &ConsentPreferences::all()).unwrap();

        let session = completed_colorblind();
        assert!(record_session(&log, &store, &session).unwrap());
        assert_eq!(log.read_all().unwrap().len(), 1);

        apply_consent(&mut store, Some(&log), &ConsentPreferences::necessary_only()).unwrap();
        assert!(!log.path().exists());
        assert!(log.read_all().unwrap().is_empty());
        assert!(!record_session(&log, &store, &session).unwrap());
    }

    #[test]
    fn test_accepting_keeps_history() {
        let dir = tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("history.csv"));
        log.append(&record(GameKind::Typing, Some(60))).unwrap();

        let mut store = ScoreStore::in_memory();
        apply_consent(&mut store, Some(&log), &ConsentPreferences::all()).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 1);
        assert!(log.clear().unwrap());
        assert!(!log.clear().unwrap());
    }
}
