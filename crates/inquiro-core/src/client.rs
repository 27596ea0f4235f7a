//! Authenticated HTTP client for the Inquiro backend.
//!
//! Every call reads the credential from the [`SessionStore`] at send time and
//! runs the response through [`classify`], so each call site sees the same
//! four outcomes: a payload, `AuthenticationExpired`, a rejection carrying
//! the server's message, or a transport failure.

use reqwest::header::CONTENT_TYPE;
use reqwest::{multipart, Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::events::{SessionEvent, SessionEvents};
use crate::session::SessionStore;

/// Outgoing request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    /// A single file part. The transport writes the multipart boundary.
    File {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// A backend route as path segments plus query pairs.
///
/// Segments are percent-encoded one at a time when the URL is built, so a
/// document id can never add path parts or query parameters of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Fixed route such as `/flashcards`.
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
        }
    }

    /// Append one segment, taken literally.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Unencoded path, for logs and session events.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[derive(Clone)]
pub struct AuthenticatedClient {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    events: SessionEvents,
}

impl AuthenticatedClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>, events: SessionEvents) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    fn url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ApiError::TransportFailure(format!("invalid base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                let message = format!("base URL {} cannot carry a path", self.base_url);
                ApiError::TransportFailure(message)
            })?
            .pop_if_empty()
            .extend(&endpoint.segments);
        Ok(url)
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> Result<RequestBuilder, ApiError> {
        let url = self.url(endpoint)?;
        debug!("{} {}", method, url);
        let request = self.http.request(method, url);
        if endpoint.query.is_empty() {
            Ok(request)
        } else {
            Ok(request.query(&endpoint.query))
        }
    }

    /// Send a request carrying the stored bearer credential.
    ///
    /// Without a credential nothing is sent. A 401 publishes
    /// [`SessionEvent::Expired`] once; when nobody is subscribed the client
    /// clears the store itself.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: impl Into<Endpoint>,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let token = self.session.get().ok_or(ApiError::AuthenticationMissing)?;

        let endpoint = endpoint.into();
        let path = endpoint.path();
        let request = attach_body(self.request(method, &endpoint)?.bearer_auth(token), body)?;

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::TransportFailure(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.escalate(&path);
            return Err(ApiError::AuthenticationExpired);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::TransportFailure(e.to_string()))?;
        debug!("{} -> {}", path, status);
        classify(status, &bytes)
    }

    /// Send a request that needs no credential (login, register).
    pub async fn send_public<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: impl Into<Endpoint>,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let endpoint = endpoint.into();
        let path = endpoint.path();
        let request = attach_body(self.request(method, &endpoint)?, body)?;

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::TransportFailure(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::TransportFailure(e.to_string()))?;
        debug!("{} -> {}", path, status);
        classify_public(status, &bytes)
    }

    fn escalate(&self, path: &str) {
        warn!("session rejected by backend on {}", path);
        let delivered = self.events.emit(SessionEvent::Expired {
            path: path.to_string(),
        });
        if !delivered {
            if let Err(err) = self.session.clear() {
                warn!("failed to clear rejected session: {}", err);
            }
        }
    }
}

fn attach_body(request: RequestBuilder, body: RequestBody) -> Result<RequestBuilder, ApiError> {
    let request = match body {
        RequestBody::Empty => request.header(CONTENT_TYPE, "application/json"),
        RequestBody::Json(value) => request.json(&value),
        RequestBody::Form(fields) => request.form(&fields),
        RequestBody::File {
            field,
            file_name,
            bytes,
        } => {
            let part = multipart::Part::bytes(bytes)
                .file_name(file_name.clone())
                .mime_str(mime_for(&file_name))
                .map_err(|e| ApiError::TransportFailure(e.to_string()))?;
            request.multipart(multipart::Form::new().part(field, part))
        }
    };
    Ok(request)
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".txt") || lower.ends_with(".md") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

/// Classify a response for an authenticated call.
///
/// Total over every status and body: 2xx parses into `T` (an empty body is
/// read as `null`), 401 is `AuthenticationExpired` without looking at the
/// body, anything else is `RequestRejected`.
pub fn classify<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::AuthenticationExpired);
    }
    classify_public(status, body)
}

/// Classify a response for a call that carries no session. A 401 here is an
/// ordinary rejection (bad password), not an expired session.
pub fn classify_public<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<T, ApiError> {
    if !status.is_success() {
        let message = detail_message(body)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        return Err(ApiError::RequestRejected {
            status: status.as_u16(),
            message,
        });
    }

    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(body)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?
    };
    serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// Server-provided failure text: `detail` as a string, a validation list
/// joined by "; ", or `message`.
fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let detail = match value.get("detail") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item.get("msg").and_then(Value::as_str) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect();
            Some(parts.join("; "))
        }
        _ => None,
    };
    detail
        .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|text| !text.trim().is_empty())
}
