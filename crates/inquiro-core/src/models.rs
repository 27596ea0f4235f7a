//! Backend payloads and the domain records built from them.

use serde::{Deserialize, Serialize};

/// A document the backend knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
}

/// One question/answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(
        default,
        rename = "flashcard_id",
        alias = "id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: &str, answer: &str) -> Self {
        Self {
            id: None,
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }
}

/// Result of a question against a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub query_id: Option<String>,
    /// Documents the backend used as context, when it reports them.
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

/// A freshly generated set of flashcards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlashcardBatch {
    pub flashcards: Vec<Flashcard>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

// Wire-only shapes.

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentList {
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub id: String,
}
