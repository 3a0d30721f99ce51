//! Deck importers
//!
//! Three importers turn an external source into an ordered sequence of
//! flashcards: a folder holding a SQLite database plus an `images`
//! subfolder, an Anki package, and a note archive of per-page PDFs. The
//! format is chosen by file extension; anything that is not a known
//! archive extension routes to the folder importer.
//!
//! Row-level problems (missing image, empty answer) are skipped and
//! counted, never surfaced; only a total absence of usable rows becomes
//! an error. Each importer returns an [`ImportReport`] alongside the
//! cards so the cleaning stays observable.

mod anki;
mod folder;
mod pages;

use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::decks::Flashcard;
use crate::storage::{AssetStore, StorageError};

pub use anki::import_anki_package;
pub use folder::import_folder;
pub use pages::import_note_archive;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("No database file found in folder")]
    MissingDatabase,

    #[error("No images folder found in folder")]
    MissingImagesFolder,

    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    #[error("No flashcards could be imported from this source")]
    NoFlashcards,

    #[error("A deck was already imported from {0}")]
    DuplicateSource(String),

    #[error("Failed to copy asset {name}: {source}")]
    CopyFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open database: {0}")]
    DatabaseOpenFailed(rusqlite::Error),

    #[error("Failed to prepare query: {0}")]
    QueryPrepareFailed(rusqlite::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Counts of rows a parser accepted and silently skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub accepted: usize,
    pub skipped: usize,
}

impl ImportReport {
    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }
}

/// A parsed deck, not yet registered with the repository.
#[derive(Debug)]
pub struct ImportedDeck {
    pub name: String,
    pub source_path: String,
    pub flashcards: Vec<Flashcard>,
    pub report: ImportReport,
}

/// Import source format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Folder containing a SQLite database and an `images` subfolder.
    Folder,
    /// Anki `.apkg` package.
    AnkiPackage,
    /// Note archive (`.note`) of per-page PDFs.
    NoteArchive,
}

impl ImportFormat {
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            Some("apkg") => ImportFormat::AnkiPackage,
            Some("note") => ImportFormat::NoteArchive,
            _ => ImportFormat::Folder,
        }
    }
}

/// Parse the source at `path` into a deck, routing by extension.
///
/// `name_override` takes precedence over the source-derived name when it
/// is non-empty after trimming.
pub fn import_from_path(
    path: &Path,
    assets: &AssetStore,
    name_override: Option<&str>,
) -> Result<ImportedDeck> {
    match ImportFormat::detect(path) {
        ImportFormat::AnkiPackage => import_anki_package(path, name_override),
        ImportFormat::NoteArchive => import_note_archive(path, assets, name_override),
        ImportFormat::Folder => import_folder(path, assets, name_override),
    }
}

/// Resolve the deck name: trimmed non-empty override, else the fallback
/// derived from the source.
fn resolve_deck_name(name_override: Option<&str>, fallback: &str) -> String {
    match name_override.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => fallback.to_string(),
    }
}

/// Base name of a source path, used as the fallback deck name.
fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Imported Deck".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_by_extension() {
        assert_eq!(
            ImportFormat::detect(Path::new("/tmp/vocab.apkg")),
            ImportFormat::AnkiPackage
        );
        assert_eq!(
            ImportFormat::detect(Path::new("/tmp/Lecture.note")),
            ImportFormat::NoteArchive
        );
        assert_eq!(
            ImportFormat::detect(Path::new("/tmp/MyDeck")),
            ImportFormat::Folder
        );
        // Unknown extensions also route to the folder importer.
        assert_eq!(
            ImportFormat::detect(Path::new("/tmp/deck.backup")),
            ImportFormat::Folder
        );
    }

    #[test]
    fn test_resolve_deck_name_prefers_trimmed_override() {
        assert_eq!(resolve_deck_name(Some("  Custom  "), "fallback"), "Custom");
        assert_eq!(resolve_deck_name(Some("   "), "fallback"), "fallback");
        assert_eq!(resolve_deck_name(None, "fallback"), "fallback");
    }

    #[test]
    fn test_source_stem() {
        assert_eq!(source_stem(Path::new("/tmp/Kanji Deck.apkg")), "Kanji Deck");
        assert_eq!(source_stem(Path::new("/tmp/capitals")), "capitals");
    }
}
