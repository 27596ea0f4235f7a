pub mod analytics;
pub mod api;
pub mod client;
pub mod config;
pub mod deck;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod selection;
pub mod session;
pub mod state;
pub mod task;

// Re-export main types for convenience
pub use analytics::StudyStats;
pub use api::{InquiroApi, DEFAULT_FLASHCARDS, MAX_FLASHCARDS, MIN_FLASHCARDS};
pub use client::{classify, classify_public, AuthenticatedClient, Endpoint, RequestBody};
pub use config::Config;
pub use deck::FlashcardDeck;
pub use error::{ApiError, ConfigError, InputError, SessionError};
pub use events::{SessionEvent, SessionEvents};
pub use models::{Answer, DocumentRef, Flashcard, FlashcardBatch, Registration};
pub use routes::{resolve, Navigator, Resolution, Route};
pub use selection::DocumentSelection;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use state::{ChatLog, ChatMessage, Notification, Sender, Severity};
pub use task::InFlight;
