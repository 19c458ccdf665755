//! Input bundle and outcome exchanged with the host platform's chat tab.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::user::UserRecord;
use crate::errors::{ChatError, ChatResult};

const COURSE_DATA_MESSAGE: &str = "Error obtaining course data.";

/// Course half of the launch bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CourseInfo {
    /// Course key, e.g. `course-v1:ORG+NUMBER+TERM`.
    pub key: String,
    /// Course display name, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Everything needed to open the chat tab for one user in one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LaunchRequest {
    /// Course being visited.
    pub course: CourseInfo,
    /// Visiting user.
    pub user: UserRecord,
}

impl LaunchRequest {
    /// Parse a launch bundle handed over as untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns an input validation [`ChatError`] when the bundle is not an
    /// object, the course key is missing, or the user record is missing or
    /// malformed.
    pub fn from_value(value: &Value) -> ChatResult<Self> {
        let Some(bundle) = value.as_object() else {
            return Err(ChatError::invalid_input(
                json!({ "ArgError": "Course data was not set" }),
                COURSE_DATA_MESSAGE,
            ));
        };

        let course = bundle.get("course").and_then(Value::as_object);
        let Some(key) = course
            .and_then(|course| course.get("key"))
            .and_then(Value::as_str)
        else {
            return Err(ChatError::invalid_input(
                json!({ "ArgError": "Course key was not set" }),
                COURSE_DATA_MESSAGE,
            ));
        };
        let name = course
            .and_then(|course| course.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        let user = bundle
            .get("user")
            .cloned()
            .ok_or_else(|| "missing field `user`".to_owned())
            .and_then(|user| {
                serde_json::from_value::<UserRecord>(user).map_err(|err| err.to_string())
            })
            .map_err(|reason| {
                ChatError::invalid_input(
                    json!({ "ArgError": "User data was not set", "reason": reason }),
                    "Error obtaining user data.",
                )
            })?;

        Ok(Self {
            course: CourseInfo {
                key: key.to_owned(),
                name,
            },
            user,
        })
    }
}

/// Result handed back to the host: where to point the chat frame, and why
/// it fell back to the generic chat URL if it did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LaunchOutcome {
    /// Course room URL, or the chat server root on failure.
    pub room_url: String,
    /// Display text of the failure, `None` on success.
    pub error: Option<String>,
}

impl LaunchOutcome {
    /// Whether the room was provisioned without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
