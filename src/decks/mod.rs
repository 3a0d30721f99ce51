mod models;
mod repository;
mod service;
mod session;

pub use models::{ContentKey, Deck, Flashcard};
pub use repository::DeckRepository;
pub use service::{DeckService, ImportOutcome};
pub use session::StudySession;
