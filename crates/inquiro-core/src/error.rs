//! Error types shared by the session store, the HTTP client and the views.

/// Outcome of a backend call that did not produce a payload.
///
/// Every HTTP response is classified into exactly one of the first five
/// variants. `Invalid` and `Session` never come from a response: they are
/// raised before a request is built or after a successful login fails to
/// persist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No credential was present when the call required one.
    #[error("Not authenticated. Please login first.")]
    AuthenticationMissing,

    /// The backend answered 401; the stored session is no longer valid.
    #[error("Unauthorized: invalid or expired token")]
    AuthenticationExpired,

    /// Any other non-2xx answer, carrying the server's detail when it sent one.
    #[error("{message}")]
    RequestRejected { status: u16, message: String },

    /// A 2xx answer whose payload is missing required fields.
    #[error("Invalid response format: {0}")]
    MalformedResponse(String),

    /// No response was received at all.
    #[error("{0}")]
    TransportFailure(String),

    /// Client-side validation rejected the action before any request.
    #[error(transparent)]
    Invalid(#[from] InputError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// True for the one kind that escalates to the unauthorized handler.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::AuthenticationExpired)
    }

    /// True when the failure came from local validation, not the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Invalid(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationExpired => Some(401),
            ApiError::RequestRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pre-flight validation failures. None of these touch the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please select a file to upload")]
    NoFileSelected,

    #[error("Could not read {path}: {reason}")]
    UnreadableFile { path: String, reason: String },

    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("No document selected. Please upload or select a document.")]
    NoDocumentSelected,

    #[error("Number of flashcards must be between {min} and {max} (got {requested})")]
    FlashcardCount { requested: u32, min: u32, max: u32 },

    #[error("Username and password are required")]
    EmptyCredentials,

    #[error("Username, email and password are required")]
    IncompleteRegistration,
}

/// Failures of the persisted credential store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Session store I/O failed: {0}")]
    Io(String),

    #[error("Session file is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Corrupt(err.to_string())
    }
}

/// Failures while loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("base url must not be empty")]
    EmptyBaseUrl,

    #[error("base url must use http:// or https:// and include a host: {0}")]
    InvalidBaseUrl(String),

    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}
