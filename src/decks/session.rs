//! Study session over a borrowed deck copy
//!
//! A session clones the deck and shuffles the cloned card order; the
//! repository keeps the authoritative copy until `finish()`'s result is
//! handed back through the update path.

use chrono::Utc;
use rand::seq::SliceRandom;
use uuid::Uuid;

use super::models::{Deck, Flashcard};

pub struct StudySession {
    deck: Deck,
    position: usize,
    session_score: i64,
}

impl StudySession {
    /// Start a session on a shuffled copy of `deck`.
    pub fn new(deck: &Deck) -> Self {
        let mut copy = deck.clone();
        copy.flashcards.shuffle(&mut rand::thread_rng());
        Self {
            deck: copy,
            position: 0,
            session_score: 0,
        }
    }

    pub fn deck_id(&self) -> Uuid {
        self.deck.id
    }

    /// The card currently shown, or `None` once the round is over.
    pub fn current(&self) -> Option<&Flashcard> {
        self.deck.flashcards.get(self.position)
    }

    /// Score the current card and advance. A correct answer adds one to
    /// the session score; a wrong answer only marks the card.
    pub fn mark(&mut self, correct: bool) {
        if let Some(card) = self.deck.flashcards.get_mut(self.position) {
            card.is_correct = correct;
            card.user_score = if correct { 1 } else { -1 };
            if correct {
                self.session_score += 1;
            }
            self.position += 1;
        }
    }

    pub fn session_score(&self) -> i64 {
        self.session_score
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.deck.flashcards.len()
    }

    /// Close the round: fold the session score into the deck's
    /// cumulative statistics and stamp the play time. The returned deck
    /// is ready for the repository's update operation.
    pub fn finish(mut self) -> Deck {
        self.deck.total_score += self.session_score;
        self.deck.completed_rounds += 1;
        self.deck.last_played = Some(Utc::now());
        self.deck
    }
}
