//! Data models for decks and flashcards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One question/answer unit: an image reference and the textual answer
/// it represents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    /// Filename in the asset store. Empty for text-only cards.
    pub image_name: String,
    pub answer: String,
    #[serde(default)]
    pub is_correct: bool,
    /// -1 answered wrong, 0 unanswered, 1 answered right.
    #[serde(default)]
    pub user_score: i32,
}

impl Flashcard {
    pub fn new(image_name: String, answer: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_name,
            answer,
            is_correct: false,
            user_score: 0,
        }
    }

    /// The (image, answer) pair used for duplicate detection during
    /// merge. Distinct from `id`: two cards with different ids are still
    /// duplicates when their content keys match.
    pub fn content_key(&self) -> ContentKey {
        ContentKey {
            image_name: self.image_name.clone(),
            answer: self.answer.clone(),
        }
    }
}

/// Content identity of a flashcard, independent of its generated id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub image_name: String,
    pub answer: String,
}

/// A named, ordered collection of flashcards plus cumulative study
/// statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    /// Original folder or archive location this deck was imported from.
    /// Immutable; acts as the natural key for re-import detection.
    pub source_path: String,
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub total_score: i64,
    #[serde(default)]
    pub completed_rounds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
}

impl Deck {
    pub fn new(name: String, source_path: String, flashcards: Vec<Flashcard>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            source_path,
            flashcards,
            total_score: 0,
            completed_rounds: 0,
            last_played: None,
        }
    }

    /// Mean session score across completed rounds. 0 before the first
    /// completed round.
    pub fn average_score(&self) -> f64 {
        if self.completed_rounds == 0 {
            0.0
        } else {
            self.total_score as f64 / self.completed_rounds as f64
        }
    }

    /// Share of flashcards that have been answered at least once, in
    /// percent. 0 for an empty deck.
    pub fn progress_percentage(&self) -> f64 {
        if self.flashcards.is_empty() {
            return 0.0;
        }
        let answered = self.flashcards.iter().filter(|c| c.user_score != 0).count();
        answered as f64 / self.flashcards.len() as f64 * 100.0
    }
}
