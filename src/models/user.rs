//! Visiting user as described by the host platform.

use serde::{Deserialize, Serialize};

/// User record supplied by the host platform for each launch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct UserRecord {
    /// Platform username.
    pub username: String,
    /// Primary email address.
    #[serde(default)]
    pub email: String,
    /// Full name shown in the chat.
    #[serde(default)]
    pub display_name: String,
    /// Course staff are made owners of the room.
    #[serde(default)]
    pub is_staff: bool,
    /// Only enrolled users may join the course room.
    #[serde(default)]
    pub is_enrolled: bool,
}

impl UserRecord {
    /// Copy of this record with the username lower-cased.
    ///
    /// The chat server treats usernames case-insensitively and rejects
    /// `Fi_Last` once `fi_last` exists, so every remote call uses the
    /// lower-cased form.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.to_lowercase(),
            ..self.clone()
        }
    }
}
