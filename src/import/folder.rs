//! Folder + database importer
//!
//! A folder deck is a directory holding one SQLite database file and an
//! `images` subfolder. Each database row pairs an image filename with an
//! answer text; rows whose image is missing from the folder or whose
//! answer is blank are skipped, and surviving images are copied into the
//! asset store before the flashcard is accepted.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use super::{resolve_deck_name, ImportError, ImportReport, ImportedDeck, Result};
use crate::decks::Flashcard;
use crate::storage::AssetStore;

const DB_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

const CARD_QUERY: &str =
    "SELECT front, back, front_image_file_name, back_image_file_name FROM cards";

/// Answer used when a row carries an image but neither text field.
const NO_ANSWER_PLACEHOLDER: &str = "No answer found";

/// Import a folder deck at `path`.
pub fn import_folder(
    path: &Path,
    assets: &AssetStore,
    name_override: Option<&str>,
) -> Result<ImportedDeck> {
    if !path.is_dir() {
        return Err(ImportError::MissingDatabase);
    }

    let (db_path, images_dir) = locate_sources(path)?;

    let conn = Connection::open_with_flags(
        &db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(ImportError::DatabaseOpenFailed)?;

    let mut stmt = conn
        .prepare(CARD_QUERY)
        .map_err(ImportError::QueryPrepareFailed)?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })
        .map_err(ImportError::QueryPrepareFailed)?;

    let mut flashcards = Vec::new();
    let mut report = ImportReport::default();

    for row in rows {
        let (front, back, front_image, back_image) = match row {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable card row: {}", e);
                report.skip();
                continue;
            }
        };

        let image_name = match chosen(front_image).or_else(|| chosen(back_image)) {
            Some(name) => name,
            None => {
                report.skip();
                continue;
            }
        };

        let answer = back
            .or(front)
            .unwrap_or_else(|| NO_ANSWER_PLACEHOLDER.to_string());
        let answer = answer.trim();
        if answer.is_empty() {
            report.skip();
            continue;
        }

        let image_path = images_dir.join(&image_name);
        if !image_path.is_file() {
            log::debug!("Skipping card: image {} not found in folder", image_name);
            report.skip();
            continue;
        }

        if let Err(e) = assets.copy_in(&image_name, &image_path).map_err(|source| {
            ImportError::CopyFailed {
                name: image_name.clone(),
                source,
            }
        }) {
            log::warn!("{}; skipping card", e);
            report.skip();
            continue;
        }

        flashcards.push(Flashcard::new(image_name, answer.to_string()));
        report.accept();
    }

    if flashcards.is_empty() {
        return Err(ImportError::NoFlashcards);
    }

    let fallback = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Imported Deck".to_string());

    Ok(ImportedDeck {
        name: resolve_deck_name(name_override, &fallback),
        source_path: path.to_string_lossy().to_string(),
        flashcards,
        report,
    })
}

/// Treat missing and empty column values the same way.
fn chosen(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Scan the folder's immediate children for the database file and the
/// `images` subfolder.
fn locate_sources(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let mut db_path = None;
    let mut images_dir = None;

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();

        if entry_path.is_file() {
            let ext = entry_path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());
            if let Some(ext) = ext {
                if db_path.is_none() && DB_EXTENSIONS.contains(&ext.as_str()) {
                    db_path = Some(entry_path);
                }
            }
        } else if entry_path.is_dir() {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name == "images" {
                images_dir = Some(entry_path);
            }
        }
    }

    let db_path = db_path.ok_or(ImportError::MissingDatabase)?;
    let images_dir = images_dir.ok_or(ImportError::MissingImagesFolder)?;
    Ok((db_path, images_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build a deck folder with the given rows and image files.
    /// Rows are (front, back, front_image, back_image).
    fn create_deck_folder(
        name: &str,
        rows: &[(Option<&str>, Option<&str>, Option<&str>, Option<&str>)],
        images: &[&str],
    ) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join(name);
        let images_dir = folder.join("images");
        fs::create_dir_all(&images_dir).unwrap();

        for image in images {
            fs::write(images_dir.join(image), b"image-bytes").unwrap();
        }

        let conn = Connection::open(folder.join("cards.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE cards (
                front TEXT,
                back TEXT,
                front_image_file_name TEXT,
                back_image_file_name TEXT
            );",
        )
        .unwrap();
        for (front, back, front_image, back_image) in rows {
            conn.execute(
                "INSERT INTO cards (front, back, front_image_file_name, back_image_file_name)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![front, back, front_image, back_image],
            )
            .unwrap();
        }

        (temp_dir, folder)
    }

    fn test_assets() -> (AssetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = AssetStore::new(temp_dir.path().join("deck_images"));
        (store, temp_dir)
    }

    #[test]
    fn test_import_accepts_valid_rows_and_skips_invalid() {
        let (_guard, folder) = create_deck_folder(
            "Capitals",
            &[
                (Some("France"), Some("Paris"), Some("paris.png"), None),
                (Some("Italy"), Some("Rome"), None, Some("rome.png")),
                // Image file missing from the folder.
                (Some("Norway"), Some("Oslo"), Some("oslo.png"), None),
                // Blank answer.
                (Some("  "), Some("   "), Some("paris.png"), None),
                // No image reference at all.
                (Some("Spain"), Some("Madrid"), None, None),
            ],
            &["paris.png", "rome.png"],
        );
        let (assets, _assets_guard) = test_assets();

        let deck = import_folder(&folder, &assets, None).unwrap();

        assert_eq!(deck.flashcards.len(), 2);
        assert_eq!(deck.report, ImportReport { accepted: 2, skipped: 3 });
        assert_eq!(deck.name, "Capitals");
        assert_eq!(deck.flashcards[0].answer, "Paris");
        assert_eq!(deck.flashcards[0].image_name, "paris.png");
        assert_eq!(deck.flashcards[1].answer, "Rome");
        assert!(assets.resolve("paris.png").is_some());
        assert!(assets.resolve("rome.png").is_some());
    }

    #[test]
    fn test_answer_falls_back_to_front_then_placeholder() {
        let (_guard, folder) = create_deck_folder(
            "Fallbacks",
            &[
                (Some("France"), None, Some("a.png"), None),
                (None, None, Some("b.png"), None),
            ],
            &["a.png", "b.png"],
        );
        let (assets, _assets_guard) = test_assets();

        let deck = import_folder(&folder, &assets, None).unwrap();
        assert_eq!(deck.flashcards[0].answer, "France");
        assert_eq!(deck.flashcards[1].answer, NO_ANSWER_PLACEHOLDER);
    }

    #[test]
    fn test_reimport_leaves_stored_assets_untouched() {
        let (_guard, folder) = create_deck_folder(
            "Capitals",
            &[(Some("France"), Some("Paris"), Some("paris.png"), None)],
            &["paris.png"],
        );
        let (assets, _assets_guard) = test_assets();

        import_folder(&folder, &assets, None).unwrap();
        let stored = assets.resolve("paris.png").unwrap();
        fs::write(&stored, b"stored-copy").unwrap();

        // A second parse of the same folder must not overwrite the store.
        import_folder(&folder, &assets, None).unwrap();
        assert_eq!(fs::read(assets.resolve("paris.png").unwrap()).unwrap(), b"stored-copy");
    }

    #[test]
    fn test_name_override_wins() {
        let (_guard, folder) = create_deck_folder(
            "Capitals",
            &[(Some("France"), Some("Paris"), Some("paris.png"), None)],
            &["paris.png"],
        );
        let (assets, _assets_guard) = test_assets();

        let deck = import_folder(&folder, &assets, Some("  Europe Quiz ")).unwrap();
        assert_eq!(deck.name, "Europe Quiz");
    }

    #[test]
    fn test_missing_database() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("deck");
        fs::create_dir_all(folder.join("images")).unwrap();
        let (assets, _assets_guard) = test_assets();

        assert!(matches!(
            import_folder(&folder, &assets, None),
            Err(ImportError::MissingDatabase)
        ));
    }

    #[test]
    fn test_missing_images_folder() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("deck");
        fs::create_dir_all(&folder).unwrap();
        Connection::open(folder.join("cards.db")).unwrap();
        let (assets, _assets_guard) = test_assets();

        assert!(matches!(
            import_folder(&folder, &assets, None),
            Err(ImportError::MissingImagesFolder)
        ));
    }

    #[test]
    fn test_images_folder_name_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("deck");
        let images_dir = folder.join("Images");
        fs::create_dir_all(&images_dir).unwrap();
        fs::write(images_dir.join("a.png"), b"x").unwrap();

        let conn = Connection::open(folder.join("cards.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE cards (
                front TEXT, back TEXT,
                front_image_file_name TEXT, back_image_file_name TEXT
            );
            INSERT INTO cards VALUES ('Q', 'A', 'a.png', NULL);",
        )
        .unwrap();
        let (assets, _assets_guard) = test_assets();

        let deck = import_folder(&folder, &assets, None).unwrap();
        assert_eq!(deck.flashcards.len(), 1);
    }

    #[test]
    fn test_zero_surviving_rows_is_an_error() {
        let (_guard, folder) = create_deck_folder(
            "Empty",
            &[(Some("France"), Some("Paris"), Some("missing.png"), None)],
            &[],
        );
        let (assets, _assets_guard) = test_assets();

        assert!(matches!(
            import_folder(&folder, &assets, None),
            Err(ImportError::NoFlashcards)
        ));
    }

    #[test]
    fn test_non_folder_path_fails_deterministically() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-folder.txt");
        fs::write(&file, b"x").unwrap();
        let (assets, _assets_guard) = test_assets();

        assert!(matches!(
            import_folder(&file, &assets, None),
            Err(ImportError::MissingDatabase)
        ));
    }
}
