//! Error types shared across the application.

use std::fmt::{Display, Formatter};

use serde_json::Value;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type for chat orchestration steps.
pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Message used when the chat server returns a response nobody expected.
pub const DEFAULT_CHAT_ERROR_MESSAGE: &str = "There was a unexpected error with the chat server.";

/// Application error enumeration covering process-level failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Chat orchestration failure.
    Chat(ChatError),
    /// HTTP service bind or serve failure.
    Http(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Chat(err) => write!(f, "chat: {err}"),
            Self::Http(msg) => write!(f, "http: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        Self::Chat(err)
    }
}

/// Classification of a chat orchestration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Course or user data was missing, malformed, or not eligible.
    InvalidInput,
    /// The chat server answered `success: false`.
    Rejected,
    /// The chat server could not be reached or refused our credentials.
    Connectivity,
    /// The chat server answered with JSON of an unknown shape.
    Unrecognized,
}

/// Raw data attached to a [`ChatError`], kept exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// A JSON document, usually the chat server's response.
    Json(Value),
    /// Free-form text.
    Text(String),
}

impl Display for ErrorPayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<Value> for ErrorPayload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for ErrorPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ErrorPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Failure raised while provisioning a chat room for a course visitor.
///
/// Carries the payload that caused it verbatim together with a message fit
/// for display. Rendered as `<message>\nError data: <payload>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatError {
    kind: ChatErrorKind,
    payload: ErrorPayload,
    message: String,
}

impl ChatError {
    /// Build an error from its parts.
    #[must_use]
    pub fn new(
        kind: ChatErrorKind,
        payload: impl Into<ErrorPayload>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            payload: payload.into(),
            message: message.into(),
        }
    }

    /// Input validation failure; raised before any network call.
    #[must_use]
    pub fn invalid_input(payload: impl Into<ErrorPayload>, message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidInput, payload, message)
    }

    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> ChatErrorKind {
        self.kind
    }

    /// Raw data attached to the failure.
    #[must_use]
    pub fn payload(&self) -> &ErrorPayload {
        &self.payload
    }

    /// Human-readable message without the payload.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\nError data: {}", self.message, self.payload)
    }
}

impl std::error::Error for ChatError {}
