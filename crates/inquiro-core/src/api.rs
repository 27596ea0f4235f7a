//! Backend operations used by the views and the command line.

use reqwest::Method;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{AuthenticatedClient, Endpoint, RequestBody};
use crate::error::{ApiError, InputError};
use crate::events::{SessionEvent, SessionEvents};
use crate::models::{
    Answer, DocumentList, DocumentRef, Flashcard, FlashcardBatch, LoginResponse, Registration,
    UploadResponse,
};
use crate::session::SessionStore;

pub const MIN_FLASHCARDS: u32 = 1;
pub const MAX_FLASHCARDS: u32 = 20;
pub const DEFAULT_FLASHCARDS: u32 = 5;

/// Multipart field the backend reads uploads from.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct InquiroApi {
    client: AuthenticatedClient,
}

impl InquiroApi {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>, events: SessionEvents) -> Self {
        Self {
            client: AuthenticatedClient::new(base_url, session, events),
        }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.client.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Exchange credentials for a bearer token and store it.
    ///
    /// On any failure the store is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(InputError::EmptyCredentials.into());
        }

        let form = vec![
            ("username".to_string(), username.trim().to_string()),
            ("password".to_string(), password.to_string()),
        ];
        let response: LoginResponse = self
            .client
            .send_public(Method::POST, "/login", RequestBody::Form(form))
            .await?;
        if response.access_token.is_empty() {
            return Err(ApiError::MalformedResponse(
                "login response carried an empty access_token".to_string(),
            ));
        }

        self.session().set(&response.access_token)?;
        self.client.events().emit(SessionEvent::LoggedIn);
        info!("logged in as {}", username.trim());
        Ok(())
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, ApiError> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(InputError::IncompleteRegistration.into());
        }

        let body = json!({
            "username": username.trim(),
            "email": email.trim(),
            "password": password,
        });
        let registration: Option<Registration> = self
            .client
            .send_public(Method::POST, "/register", RequestBody::Json(body))
            .await?;
        info!("registered {}", username.trim());
        Ok(registration.unwrap_or_default())
    }

    /// Forget the stored credential. Safe to call when already logged out.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().clear()?;
        self.client.events().emit(SessionEvent::LoggedOut);
        info!("logged out");
        Ok(())
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentRef>, ApiError> {
        let list: DocumentList = self
            .client
            .send(Method::GET, "/documents", RequestBody::Empty)
            .await?;
        debug!("fetched {} documents", list.documents.len());
        Ok(list.documents)
    }

    /// Upload one file. `None` (or an empty path) is rejected before any
    /// request is built.
    pub async fn upload_document(&self, path: Option<&Path>) -> Result<DocumentRef, ApiError> {
        let path = path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(InputError::NoFileSelected)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| InputError::UnreadableFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let body = RequestBody::File {
            field: UPLOAD_FIELD.to_string(),
            file_name: title.clone(),
            bytes,
        };
        let response: UploadResponse = self.client.send(Method::POST, "/upload", body).await?;
        info!("uploaded {} as {}", title, response.id);
        Ok(DocumentRef {
            id: response.id,
            title,
        })
    }

    pub async fn query(&self, question: &str, doc_id: Option<&str>) -> Result<Answer, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(InputError::EmptyQuestion.into());
        }
        let doc_id = doc_id
            .filter(|id| !id.is_empty())
            .ok_or(InputError::NoDocumentSelected)?;

        let body = json!({ "question": question, "doc_id": doc_id });
        let answer: Answer = self
            .client
            .send(Method::POST, "/query", RequestBody::Json(body))
            .await?;
        if answer.answer.trim().is_empty() {
            return Err(ApiError::MalformedResponse(
                "response carried an empty answer".to_string(),
            ));
        }
        Ok(answer)
    }

    /// Generate `count` cards for a document. The count is checked before
    /// any request is built.
    pub async fn generate_flashcards(
        &self,
        doc_id: Option<&str>,
        count: u32,
    ) -> Result<FlashcardBatch, ApiError> {
        let doc_id = doc_id
            .filter(|id| !id.is_empty())
            .ok_or(InputError::NoDocumentSelected)?;
        validate_flashcard_count(count)?;

        // The backend reads the count from the query string; the body keeps
        // it for servers that accept JSON.
        let endpoint = Endpoint::new("/flashcards")
            .segment(doc_id)
            .query("num_flashcards", count);
        let body = json!({ "num_flashcards": count });
        let batch: FlashcardBatch = self
            .client
            .send(Method::POST, endpoint, RequestBody::Json(body))
            .await?;
        info!("generated {} flashcards for {}", batch.flashcards.len(), doc_id);
        Ok(batch)
    }

    /// Cards previously generated for a document.
    pub async fn fetch_flashcards(&self, doc_id: Option<&str>) -> Result<Vec<Flashcard>, ApiError> {
        let doc_id = doc_id
            .filter(|id| !id.is_empty())
            .ok_or(InputError::NoDocumentSelected)?;
        let endpoint = Endpoint::new("/flashcards").segment(doc_id);
        self.client.send(Method::GET, endpoint, RequestBody::Empty).await
    }
}

pub fn validate_flashcard_count(count: u32) -> Result<(), InputError> {
    if !(MIN_FLASHCARDS..=MAX_FLASHCARDS).contains(&count) {
        return Err(InputError::FlashcardCount {
            requested: count,
            min: MIN_FLASHCARDS,
            max: MAX_FLASHCARDS,
        });
    }
    Ok(())
}
