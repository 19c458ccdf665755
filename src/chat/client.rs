//! HTTP transport for the Rocket.Chat REST API.
//!
//! Every call resolves to a JSON value. Transport faults and non-JSON bodies
//! are folded into a `{"status": "Failure", ...}` document so callers have a
//! single shape to inspect.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::{AppError, Result};

const APPLICATION_JSON: &str = "application/json";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const USER_ID_HEADER: &str = "X-User-Id";

/// Future returned by [`ChatTransport`] calls.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Value> + Send + 'a>>;

/// Issues authenticated JSON requests against the chat server.
///
/// Implementations never fail: connectivity problems come back as a
/// `status`-shaped JSON document.
pub trait ChatTransport: Send + Sync {
    /// `GET url`.
    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a>;

    /// `POST url` with a JSON body.
    fn post<'a>(&'a self, url: &'a str, body: &'a Value) -> TransportFuture<'a>;
}

/// Reqwest-backed [`ChatTransport`] authenticating as the configured admin.
#[derive(Clone)]
pub struct HttpChatClient {
    http: Client,
    admin_token: String,
    admin_user_id: String,
}

impl HttpChatClient {
    /// Build a client with the per-request timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Http(format!("failed to build chat http client: {err}")))?;

        Ok(Self {
            http,
            admin_token: config.admin_token.clone(),
            admin_user_id: config.admin_user_id.clone(),
        })
    }

    /// `GET url`, returning the response JSON.
    pub async fn get_json(&self, url: &str) -> Value {
        debug!(method = "GET", %url, "chat api request");
        let request = self
            .http
            .get(url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(AUTH_TOKEN_HEADER, &self.admin_token)
            .header(USER_ID_HEADER, &self.admin_user_id);

        match request.send().await {
            Ok(response) => read_json(response, url).await,
            Err(err) => connection_failure(url, &err),
        }
    }

    /// `POST url` with `body`, returning the response JSON.
    pub async fn post_json(&self, url: &str, body: &Value) -> Value {
        debug!(method = "POST", %url, "chat api request");
        let request = self
            .http
            .post(url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(AUTH_TOKEN_HEADER, &self.admin_token)
            .header(USER_ID_HEADER, &self.admin_user_id)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body.to_string());

        match request.send().await {
            Ok(response) => read_json(response, url).await,
            Err(err) => connection_failure(url, &err),
        }
    }

    /// `GET url`, rendered as indented JSON for display.
    pub async fn get_pretty(&self, url: &str) -> String {
        pretty(&self.get_json(url).await)
    }

    /// `POST url` with `body`, rendered as indented JSON for display.
    pub async fn post_pretty(&self, url: &str, body: &Value) -> String {
        pretty(&self.post_json(url, body).await)
    }
}

impl ChatTransport for HttpChatClient {
    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a> {
        Box::pin(self.get_json(url))
    }

    fn post<'a>(&'a self, url: &'a str, body: &'a Value) -> TransportFuture<'a> {
        Box::pin(self.post_json(url, body))
    }
}

async fn read_json(response: reqwest::Response, url: &str) -> Value {
    let status = response.status();
    match response.bytes().await {
        Ok(body) => {
            debug!(%url, %status, bytes = body.len(), "chat api response");
            parse_body(&body, url)
        }
        Err(err) => connection_failure(url, &err),
    }
}

/// Parse a response body, substituting a failure document for non-JSON.
///
/// The HTTP status is not consulted: the chat server reports failures in the
/// body (`success` or `status`), including on 4xx responses.
#[must_use]
pub fn parse_body(body: &[u8], url: &str) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|err| {
        warn!(%url, %err, "chat api returned invalid JSON");
        invalid_json(url)
    })
}

/// Failure document for a response that was not JSON.
#[must_use]
pub fn invalid_json(url: &str) -> Value {
    json!({
        "status": "Failure",
        "message": format!("The API returned invalid JSON. Verify the URL:\n{url}"),
    })
}

/// Failure document for a request that never produced a response.
#[must_use]
pub fn connection_error(details: &str) -> Value {
    json!({
        "status": "Failure",
        "message": "Error connecting to the Chat server",
        "exception": details,
    })
}

fn connection_failure(url: &str, err: &reqwest::Error) -> Value {
    warn!(%url, %err, timeout = err.is_timeout(), "chat api request failed");
    connection_error(&err.to_string())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
