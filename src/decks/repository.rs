//! Canonical deck collection and storage reconciliation
//!
//! The repository owns the authoritative deck list. The whole list is
//! serialized as one JSON blob under a single key; every mutation
//! rewrites the blob. On load and update, each flashcard's image is
//! re-validated against the asset store, with one recovery attempt from
//! the deck's original source location before the card is dropped.

use std::collections::HashSet;
use std::path::Path;

use rand::seq::SliceRandom;
use uuid::Uuid;

use super::models::{ContentKey, Deck};
use crate::import::{ImportError, ImportedDeck, Result};
use crate::storage::{AssetStore, KvStore, StorageError, DECKS_KEY};

pub struct DeckRepository {
    store: KvStore,
    assets: AssetStore,
    decks: Vec<Deck>,
}

impl DeckRepository {
    pub fn new(store: KvStore, assets: AssetStore) -> Self {
        Self {
            store,
            assets,
            decks: Vec::new(),
        }
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// All decks, in current in-memory order.
    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn get(&self, id: Uuid) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    /// Deserialize the persisted deck list and reconcile it against the
    /// asset store. Flashcards whose image cannot be resolved (or
    /// recovered from the original source) are dropped from the
    /// in-memory copy; decks left empty are dropped entirely. The deck
    /// order is freshly shuffled on every load.
    pub fn load(&mut self) -> Result<()> {
        let mut decks: Vec<Deck> = match self.store.get(DECKS_KEY)? {
            Some(blob) => serde_json::from_str(&blob).map_err(StorageError::from)?,
            None => Vec::new(),
        };

        for deck in &mut decks {
            reconcile_deck(&self.assets, deck);
        }
        let before = decks.len();
        decks.retain(|d| !d.flashcards.is_empty());
        if decks.len() < before {
            log::info!("Dropped {} deck(s) with no displayable cards", before - decks.len());
        }

        decks.shuffle(&mut rand::thread_rng());
        self.decks = decks;
        Ok(())
    }

    /// Register a freshly parsed deck. Fails when a deck from the same
    /// source path already exists.
    pub fn add(&mut self, imported: ImportedDeck) -> Result<Deck> {
        if self.decks.iter().any(|d| d.source_path == imported.source_path) {
            return Err(ImportError::DuplicateSource(imported.source_path));
        }

        let deck = Deck::new(imported.name, imported.source_path, imported.flashcards);
        self.decks.push(deck.clone());
        self.persist()?;
        log::info!("Added deck '{}' with {} cards", deck.name, deck.flashcards.len());
        Ok(deck)
    }

    /// Replace the deck matching by id, re-running the same asset
    /// reconciliation pass as `load`. This is how a finished study
    /// session commits its score mutations.
    pub fn update(&mut self, mut deck: Deck) -> Result<Deck> {
        let pos = self
            .decks
            .iter()
            .position(|d| d.id == deck.id)
            .ok_or(ImportError::DeckNotFound(deck.id))?;

        reconcile_deck(&self.assets, &mut deck);
        self.decks[pos] = deck.clone();
        self.persist()?;
        Ok(deck)
    }

    /// Remove a deck from memory and storage, then best-effort remove
    /// its image files from the asset store. Filenames still referenced
    /// by a surviving deck are kept; the pool is shared.
    pub fn delete(&mut self, id: Uuid) -> Result<()> {
        let pos = self
            .decks
            .iter()
            .position(|d| d.id == id)
            .ok_or(ImportError::DeckNotFound(id))?;

        let removed = self.decks.remove(pos);
        self.persist()?;

        let still_referenced: HashSet<&str> = self
            .decks
            .iter()
            .flat_map(|d| d.flashcards.iter())
            .map(|c| c.image_name.as_str())
            .collect();

        for card in &removed.flashcards {
            if !card.image_name.is_empty() && !still_referenced.contains(card.image_name.as_str()) {
                self.assets.remove(&card.image_name);
            }
        }

        log::info!("Deleted deck '{}'", removed.name);
        Ok(())
    }

    /// Concatenate two decks into a new, independent one, deduplicated
    /// by content key (first occurrence wins). The merged deck gets a
    /// freshly generated synthetic source path so it can never trip the
    /// duplicate-source check. The source decks are left untouched.
    pub fn merge(&mut self, a_id: Uuid, b_id: Uuid, new_name: &str) -> Result<Deck> {
        let a = self.get(a_id).ok_or(ImportError::DeckNotFound(a_id))?;
        let b = self.get(b_id).ok_or(ImportError::DeckNotFound(b_id))?;

        let mut seen: HashSet<ContentKey> = HashSet::new();
        let mut flashcards = Vec::new();
        for card in a.flashcards.iter().chain(b.flashcards.iter()) {
            if seen.insert(card.content_key()) {
                flashcards.push(card.clone());
            }
        }

        let deck = Deck::new(
            new_name.to_string(),
            format!("merged://{}", Uuid::new_v4()),
            flashcards,
        );
        self.decks.push(deck.clone());
        self.persist()?;
        log::info!(
            "Merged '{}' and '{}' into '{}' ({} cards)",
            a_id,
            b_id,
            deck.name,
            deck.flashcards.len()
        );
        Ok(deck)
    }

    /// Rewrite the whole blob. The persisted copy only carries
    /// flashcards whose image asset is present right now; the in-memory
    /// list is left as-is.
    fn persist(&self) -> Result<()> {
        let snapshot: Vec<Deck> = self
            .decks
            .iter()
            .map(|deck| {
                let mut copy = deck.clone();
                copy.flashcards.retain(|c| {
                    c.image_name.is_empty() || self.assets.resolve(&c.image_name).is_some()
                });
                copy
            })
            .collect();

        let blob = serde_json::to_string_pretty(&snapshot).map_err(StorageError::from)?;
        self.store.set(DECKS_KEY, &blob)?;
        Ok(())
    }
}

/// Drop flashcards whose image asset is gone, after one recovery
/// attempt from the deck's original source location.
fn reconcile_deck(assets: &AssetStore, deck: &mut Deck) {
    let source = deck.source_path.clone();
    let before = deck.flashcards.len();
    deck.flashcards.retain(|card| {
        if card.image_name.is_empty() || assets.resolve(&card.image_name).is_some() {
            return true;
        }
        if recover_asset(assets, &source, &card.image_name) {
            return true;
        }
        log::debug!("Dropping card '{}': image {} unresolvable", card.answer, card.image_name);
        false
    });
    if deck.flashcards.len() < before {
        log::warn!(
            "Deck '{}': dropped {} card(s) with missing images",
            deck.name,
            before - deck.flashcards.len()
        );
    }
}

/// Try to re-copy a missing asset from the original deck source. Folder
/// decks keep their files under an `images` subfolder, so that layout is
/// probed as well.
fn recover_asset(assets: &AssetStore, source_path: &str, image_name: &str) -> bool {
    let source = Path::new(source_path);
    for candidate in [source.join(image_name), source.join("images").join(image_name)] {
        if candidate.is_file() {
            match assets.copy_in(image_name, &candidate) {
                Ok(()) => return true,
                Err(e) => {
                    log::warn!("Failed to recover asset {}: {}", image_name, e);
                    return false;
                }
            }
        }
    }
    false
}
