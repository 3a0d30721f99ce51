//! Deck import and persistence engine for an image-flashcard study app.
//!
//! Decks come from three kinds of sources: folders holding a SQLite
//! database plus an `images` subfolder, Anki packages, and note
//! archives of per-page PDFs. Importers normalize each source into a
//! deck of flashcards; the [`DeckService`] owns the canonical deck
//! list, reconciles image assets on every load and update, and persists
//! everything as one JSON blob in the app's data directory.
//!
//! ```no_run
//! use cardbox::DeckService;
//!
//! let service = DeckService::open_default()?;
//! let outcome = service.import(std::path::Path::new("/decks/capitals"), None)?;
//! println!("imported {} cards", outcome.report.accepted);
//! # Ok::<(), cardbox::ImportError>(())
//! ```

mod decks;
mod import;
mod storage;

pub use decks::{ContentKey, Deck, DeckRepository, DeckService, Flashcard, ImportOutcome, StudySession};
pub use import::{
    import_anki_package, import_folder, import_from_path, import_note_archive, ImportError,
    ImportFormat, ImportReport, ImportedDeck,
};
pub use storage::{AssetStore, KvStore, StorageError, DECKS_KEY};
