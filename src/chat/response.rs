//! Classification of chat server responses.
//!
//! Rocket.Chat answers with one of two shapes:
//!
//! - `{"success": true, ...}` / `{"success": false, "error": "...", "errorType": "..."}`
//!   for requests it processed;
//! - `{"status": "error", ...}` when the caller is not authenticated, which is
//!   also the shape [`HttpChatClient`](super::HttpChatClient) uses for
//!   connection faults and non-JSON bodies.

use serde_json::Value;

use crate::errors::{ChatError, ChatErrorKind, ChatResult, DEFAULT_CHAT_ERROR_MESSAGE};

const CONNECTIVITY_MESSAGE: &str = "An error occurred connecting to the server";

/// Whether the chat server explicitly reported `success: false`.
#[must_use]
pub fn is_rejection(response: &Value) -> bool {
    response.get("success").and_then(Value::as_bool) == Some(false)
}

/// `errorType` of a rejected response, if any.
#[must_use]
pub fn error_type(response: &Value) -> Option<&str> {
    response.get("errorType").and_then(Value::as_str)
}

/// Pass a successful response through, or turn it into a [`ChatError`].
///
/// # Errors
///
/// - [`ChatErrorKind::Rejected`] when `success` is present but not true; the
///   remote `error` string becomes the message.
/// - [`ChatErrorKind::Connectivity`] when the response is `status`-shaped.
/// - [`ChatErrorKind::Unrecognized`] for anything else.
pub fn check_success(response: Value) -> ChatResult<Value> {
    let Some(object) = response.as_object() else {
        return Err(ChatError::new(
            ChatErrorKind::Unrecognized,
            response,
            DEFAULT_CHAT_ERROR_MESSAGE,
        ));
    };

    if let Some(success) = object.get("success") {
        if success.as_bool() == Some(true) || success.as_str() == Some("True") {
            return Ok(response);
        }
        let message = object
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CHAT_ERROR_MESSAGE)
            .to_owned();
        return Err(ChatError::new(ChatErrorKind::Rejected, response, message));
    }

    if object.contains_key("status") {
        return Err(ChatError::new(
            ChatErrorKind::Connectivity,
            response,
            CONNECTIVITY_MESSAGE,
        ));
    }

    Err(ChatError::new(
        ChatErrorKind::Unrecognized,
        response,
        DEFAULT_CHAT_ERROR_MESSAGE,
    ))
}

fn nested_id<'a>(response: &'a Value, field: &str) -> Option<&'a str> {
    response
        .get(field)
        .and_then(|inner| inner.get("_id"))
        .and_then(Value::as_str)
}

fn missing_id(response: &Value, field: &str) -> ChatError {
    ChatError::new(
        ChatErrorKind::Unrecognized,
        response.clone(),
        format!("The chat server response has no {field}._id"),
    )
}

/// Validated `groups.info` / `groups.create` response.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo(Value);

impl RoomInfo {
    /// Validate a raw room response.
    ///
    /// # Errors
    ///
    /// See [`check_success`].
    pub fn from_response(response: Value) -> ChatResult<Self> {
        check_success(response).map(Self)
    }

    /// `group._id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        nested_id(&self.0, "group")
    }

    /// `group._id`, or an unrecognized-response error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ChatErrorKind::Unrecognized`] when the id is missing.
    pub fn require_id(&self) -> ChatResult<&str> {
        self.id().ok_or_else(|| missing_id(&self.0, "group"))
    }

    /// Raw response document.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.0
    }
}

/// Validated `users.info` / `users.create` response.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo(Value);

impl UserInfo {
    /// Validate a raw user response.
    ///
    /// # Errors
    ///
    /// See [`check_success`].
    pub fn from_response(response: Value) -> ChatResult<Self> {
        check_success(response).map(Self)
    }

    /// `user._id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        nested_id(&self.0, "user")
    }

    /// `user._id`, or an unrecognized-response error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ChatErrorKind::Unrecognized`] when the id is missing.
    pub fn require_id(&self) -> ChatResult<&str> {
        self.id().ok_or_else(|| missing_id(&self.0, "user"))
    }

    /// Raw response document.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.0
    }
}

/// Validated `groups.invite` response.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipInfo(Value);

impl MembershipInfo {
    /// Validate a raw invite response.
    ///
    /// # Errors
    ///
    /// See [`check_success`].
    pub fn from_response(response: Value) -> ChatResult<Self> {
        check_success(response).map(Self)
    }

    /// Raw response document.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.0
    }
}
