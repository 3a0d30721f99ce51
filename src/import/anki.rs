//! Anki package importer
//!
//! An `.apkg` file is a zip container around a SQLite collection
//! database. The archive is extracted into a scratch directory that is
//! removed unconditionally when the import finishes, success or failure.
//! Notes in the default two-field model carry the answer in the second
//! field of the 0x1F-delimited field blob; single-field notes fall back
//! to the primary field. Cards produced here are text-only.

use std::fs::File;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tempfile::TempDir;
use zip::ZipArchive;

use super::{resolve_deck_name, source_stem, ImportError, ImportReport, ImportedDeck, Result};
use crate::decks::Flashcard;

/// Anki's field separator within the `flds` blob.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Collection database names, newest schema first.
const COLLECTION_NAMES: [&str; 2] = ["collection.anki21", "collection.anki2"];

const NOTE_QUERY: &str =
    "SELECT notes.sfld, notes.flds FROM notes \
     JOIN cards ON cards.nid = notes.id \
     GROUP BY notes.id \
     ORDER BY notes.id";

/// Import an Anki package at `path`.
pub fn import_anki_package(path: &Path, name_override: Option<&str>) -> Result<ImportedDeck> {
    let scratch = TempDir::new()?;
    let collection = extract_package(path, scratch.path())?;

    let conn = Connection::open_with_flags(
        &collection,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(ImportError::DatabaseOpenFailed)?;

    let mut stmt = conn
        .prepare(NOTE_QUERY)
        .map_err(ImportError::QueryPrepareFailed)?;

    let rows = stmt
        .query_map([], |row| {
            let sfld: Option<String> = row.get(0).unwrap_or(None);
            let flds: Option<String> = row.get(1).unwrap_or(None);
            Ok((sfld.unwrap_or_default(), flds.unwrap_or_default()))
        })
        .map_err(ImportError::QueryPrepareFailed)?;

    let mut flashcards = Vec::new();
    let mut report = ImportReport::default();

    for row in rows {
        let (sfld, flds) = match row {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable note row: {}", e);
                report.skip();
                continue;
            }
        };

        let answer = note_answer(&sfld, &flds);
        let answer = answer.trim();
        if answer.is_empty() {
            report.skip();
            continue;
        }

        flashcards.push(Flashcard::new(String::new(), answer.to_string()));
        report.accept();
    }

    if flashcards.is_empty() {
        return Err(ImportError::NoFlashcards);
    }

    Ok(ImportedDeck {
        name: resolve_deck_name(name_override, &source_stem(path)),
        source_path: path.to_string_lossy().to_string(),
        flashcards,
        report,
    })
    // `scratch` drops here, removing the extraction directory.
}

/// Extract the package and locate the collection database inside it.
fn extract_package(path: &Path, scratch: &Path) -> Result<PathBuf> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ImportError::InvalidPackage(format!("not a readable package: {}", e)))?;
    archive
        .extract(scratch)
        .map_err(|e| ImportError::InvalidPackage(format!("extraction failed: {}", e)))?;

    COLLECTION_NAMES
        .iter()
        .map(|name| scratch.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| ImportError::InvalidPackage("collection database missing".to_string()))
}

/// Answer text for a note: the second field when the blob has at least
/// two, else the raw primary field.
fn note_answer(sfld: &str, flds: &str) -> String {
    let fields: Vec<&str> = flds.split(FIELD_SEPARATOR).collect();
    if fields.len() >= 2 {
        fields[1].to_string()
    } else {
        sfld.to_string()
    }
}
