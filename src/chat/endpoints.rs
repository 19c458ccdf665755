//! URL layout of the Rocket.Chat REST API endpoints used by the tab.

use reqwest::Url;

/// Builds endpoint URLs relative to the configured chat server root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEndpoints {
    base_url: String,
}

impl ChatEndpoints {
    /// Create a builder for `base_url`; trailing slashes are ignored.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Chat server root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET groups.info?roomName=<room>`
    #[must_use]
    pub fn group_info(&self, room_name: &str) -> String {
        self.with_query("groups.info", "roomName", room_name)
    }

    /// `POST groups.create`
    #[must_use]
    pub fn group_create(&self) -> String {
        self.api("groups.create")
    }

    /// `POST groups.invite`
    #[must_use]
    pub fn group_invite(&self) -> String {
        self.api("groups.invite")
    }

    /// `POST groups.addOwner`
    #[must_use]
    pub fn group_add_owner(&self) -> String {
        self.api("groups.addOwner")
    }

    /// `GET users.info?username=<username>`
    #[must_use]
    pub fn user_info(&self, username: &str) -> String {
        self.with_query("users.info", "username", username)
    }

    /// `POST users.create`
    #[must_use]
    pub fn user_create(&self) -> String {
        self.api("users.create")
    }

    /// Browser URL of a private group.
    #[must_use]
    pub fn room_url(&self, room_name: &str) -> String {
        format!("{}/group/{room_name}", self.base_url)
    }

    fn api(&self, method: &str) -> String {
        format!("{}/api/v1/{method}", self.base_url)
    }

    fn with_query(&self, method: &str, key: &str, value: &str) -> String {
        let endpoint = self.api(method);
        Url::parse_with_params(&endpoint, &[(key, value)])
            .map_or_else(|_| format!("{endpoint}?{key}={value}"), String::from)
    }
}
