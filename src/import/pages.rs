//! Note-archive importer
//!
//! A `.note` archive carries a notebook exported as one PDF per page.
//! The archive is extracted into a scratch directory and searched in
//! tiers: archive root, then a `media` subfolder, then a `pages`
//! subfolder, then a full recursive walk. The first tier that yields at
//! least one page wins and later tiers are never tried. Every page file
//! is copied into the asset store so the synthesized flashcards stay
//! displayable after the scratch directory is removed.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;
use zip::ZipArchive;

use super::{resolve_deck_name, source_stem, ImportError, ImportReport, ImportedDeck, Result};
use crate::decks::Flashcard;
use crate::storage::AssetStore;

const PAGE_PREFIX: &str = "page_";
const PAGE_SUFFIX: &str = ".pdf";

/// Import a note archive at `path`.
pub fn import_note_archive(
    path: &Path,
    assets: &AssetStore,
    name_override: Option<&str>,
) -> Result<ImportedDeck> {
    let scratch = TempDir::new()?;
    extract_archive(path, scratch.path())?;

    let page_files = discover_pages(scratch.path())?;
    if page_files.is_empty() {
        return Err(ImportError::NoFlashcards);
    }

    let mut flashcards = Vec::new();
    let mut report = ImportReport::default();

    for page_path in page_files {
        let file_name = match page_path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => {
                report.skip();
                continue;
            }
        };

        if let Err(e) = assets.copy_in(&file_name, &page_path).map_err(|source| {
            ImportError::CopyFailed {
                name: file_name.clone(),
                source,
            }
        }) {
            log::warn!("{}; skipping card", e);
            report.skip();
            continue;
        }

        let answer = format!("Page {}", page_label(&file_name));
        flashcards.push(Flashcard::new(file_name, answer));
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

fn extract_archive(path: &Path, scratch: &Path) -> Result<()> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ImportError::InvalidPackage(format!("not a readable archive: {}", e)))?;
    archive
        .extract(scratch)
        .map_err(|e| ImportError::InvalidPackage(format!("extraction failed: {}", e)))?;
    Ok(())
}

/// Search the extraction tiers in order; the first tier with at least
/// one page file wins. Pages within a tier are ordered by filename so
/// discovery order is stable across filesystems.
fn discover_pages(scratch: &Path) -> Result<Vec<PathBuf>> {
    for dir in [
        scratch.to_path_buf(),
        scratch.join("media"),
        scratch.join("pages"),
    ] {
        let pages = list_pages(&dir)?;
        if !pages.is_empty() {
            return Ok(pages);
        }
    }

    // Last tier: full recursive scan.
    let mut pages: Vec<PathBuf> = WalkDir::new(scratch)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_page_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    pages.sort();
    Ok(pages)
}

/// Non-recursive page listing for one tier directory.
fn list_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut pages: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_page_file(path))
        .collect();
    pages.sort();
    Ok(pages)
}

fn is_page_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase() == "pdf")
        .unwrap_or(false)
}

/// Label for a page filename: `page_3.pdf` -> `3`; anything else keeps
/// its stem unprocessed.
fn page_label(file_name: &str) -> String {
    match file_name
        .strip_prefix(PAGE_PREFIX)
        .and_then(|rest| rest.strip_suffix(PAGE_SUFFIX))
    {
        Some(number) => number.to_string(),
        None => Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string()),
    }
}
