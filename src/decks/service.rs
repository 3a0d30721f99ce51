//! Deck service
//!
//! The single entry point the UI layer talks to. All mutations funnel
//! through one mutex-guarded repository, so the deck list has a single
//! writer; queries return snapshots and commands return `Result` values.
//! Parsing and extraction I/O run before the repository lock is taken,
//! and an in-flight registry gives imports single-flight semantics per
//! source path: a path that is already importing, or already known,
//! fails fast without touching the parsers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::models::Deck;
use super::repository::DeckRepository;
use super::session::StudySession;
use crate::import::{import_from_path, ImportError, ImportReport, Result};
use crate::storage::{AssetStore, KvStore};

/// Result of a successful import: the registered deck plus the row
/// counts the parser reported.
#[derive(Debug)]
pub struct ImportOutcome {
    pub deck: Deck,
    pub report: ImportReport,
}

pub struct DeckService {
    repo: Mutex<DeckRepository>,
    assets: AssetStore,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl DeckService {
    /// Open the engine over an explicit base directory.
    pub fn open(base_path: PathBuf) -> Result<Self> {
        let store = KvStore::new(base_path.clone());
        let assets = AssetStore::new(base_path.join("deck_images"));
        let mut repo = DeckRepository::new(store, assets.clone());
        repo.load()?;

        Ok(Self {
            repo: Mutex::new(repo),
            assets,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Open the engine over the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(KvStore::default_data_dir()?)
    }

    /// Snapshot of the current deck list.
    pub fn decks(&self) -> Vec<Deck> {
        self.repo.lock().unwrap().decks().to_vec()
    }

    pub fn get_deck(&self, id: Uuid) -> Option<Deck> {
        self.repo.lock().unwrap().get(id).cloned()
    }

    /// Import the source at `path` and register the resulting deck.
    pub fn import(&self, path: &Path, name_override: Option<&str>) -> Result<ImportOutcome> {
        let source = path.to_string_lossy().to_string();
        let _guard = self.begin_import(source)?;

        // Parsing, extraction, and asset copying happen outside the
        // repository lock; a slow import never blocks queries.
        let imported = import_from_path(path, &self.assets, name_override)?;
        let report = imported.report;

        let deck = self.repo.lock().unwrap().add(imported)?;
        Ok(ImportOutcome { deck, report })
    }

    /// Commit a mutated deck copy (typically a finished study session).
    pub fn update_deck(&self, deck: Deck) -> Result<Deck> {
        self.repo.lock().unwrap().update(deck)
    }

    pub fn delete_deck(&self, id: Uuid) -> Result<()> {
        self.repo.lock().unwrap().delete(id)
    }

    pub fn merge_decks(&self, a_id: Uuid, b_id: Uuid, new_name: &str) -> Result<Deck> {
        self.repo.lock().unwrap().merge(a_id, b_id, new_name)
    }

    /// Start a study session on a shuffled copy of the deck.
    pub fn start_session(&self, deck_id: Uuid) -> Result<StudySession> {
        let repo = self.repo.lock().unwrap();
        let deck = repo.get(deck_id).ok_or(ImportError::DeckNotFound(deck_id))?;
        Ok(StudySession::new(deck))
    }

    /// Close a session and persist its results: cumulative score, round
    /// count, and play timestamp land on the authoritative deck.
    pub fn commit_session(&self, session: StudySession) -> Result<Deck> {
        self.update_deck(session.finish())
    }

    /// Register `source` as in flight, failing fast when it is already
    /// importing or already backs an existing deck.
    fn begin_import(&self, source: String) -> Result<InFlightGuard> {
        {
            let repo = self.repo.lock().unwrap();
            if repo.decks().iter().any(|d| d.source_path == source) {
                return Err(ImportError::DuplicateSource(source));
            }
        }

        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(source.clone()) {
            log::warn!("Import of {} already in flight", source);
            return Err(ImportError::DuplicateSource(source));
        }

        Ok(InFlightGuard {
            registry: Arc::clone(&self.in_flight),
            source,
        })
    }
}

/// Removes the source-path reservation on every exit path.
struct InFlightGuard {
    registry: Arc<Mutex<HashSet<String>>>,
    source: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().unwrap().remove(&self.source);
    }
}
