//! Per-launch provisioning of the course room, the chat user, and the
//! membership between them.
//!
//! Every step is a lookup-or-create against the chat server, so repeating a
//! launch is harmless. Any failure ends the launch with a [`ChatError`].

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::client::ChatTransport;
use super::endpoints::ChatEndpoints;
use super::response::{self, MembershipInfo, RoomInfo, UserInfo};
use crate::config::ChatConfig;
use crate::errors::{ChatError, ChatResult};
use crate::models::course::derive_room_name;
use crate::models::launch::LaunchRequest;
use crate::models::user::UserRecord;

/// `errorType` returned by `groups.addOwner` when the user already owns the room.
const ALREADY_OWNER: &str = "error-user-already-owner";

/// Provisions the chat room for one user visiting one course.
pub struct ChatRoomOrchestrator {
    course_key: String,
    room_name: String,
    user: UserRecord,
    endpoints: ChatEndpoints,
    transport: Arc<dyn ChatTransport>,
}

impl ChatRoomOrchestrator {
    /// Validate the launch request and prepare the room and user names.
    ///
    /// No network call is made here.
    ///
    /// # Errors
    ///
    /// Returns an input validation [`ChatError`] when the course key cannot
    /// be turned into a room name or the user is not enrolled.
    pub fn new(
        request: LaunchRequest,
        config: &ChatConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> ChatResult<Self> {
        let LaunchRequest { course, user } = request;
        let room_name = derive_room_name(&config.room_prefix, &course.key)?;

        if !user.is_enrolled {
            return Err(ChatError::invalid_input(
                json!({
                    "ValidationError": format!(
                        "User {} is not enrolled in the course.",
                        user.username
                    )
                }),
                format!(
                    "Enrollment in course '{}' is required to access the group chat.",
                    course.key
                ),
            ));
        }

        Ok(Self {
            course_key: course.key,
            room_name,
            user: user.normalized(),
            endpoints: ChatEndpoints::new(&config.base_url),
            transport,
        })
    }

    /// Parse an untyped launch bundle, then behave like [`Self::new`].
    ///
    /// # Errors
    ///
    /// Returns an input validation [`ChatError`] when the bundle is malformed
    /// or fails any check in [`Self::new`].
    pub fn from_value(
        bundle: &Value,
        config: &ChatConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> ChatResult<Self> {
        let request = LaunchRequest::from_value(bundle)?;
        Self::new(request, config, transport)
    }

    /// Course key the room belongs to.
    #[must_use]
    pub fn course_key(&self) -> &str {
        &self.course_key
    }

    /// Name of the course room.
    #[must_use]
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Visiting user, with the username lower-cased.
    #[must_use]
    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    /// Browser URL of the course room. Never fails.
    #[must_use]
    pub fn room_url(&self) -> String {
        self.endpoints.room_url(&self.room_name)
    }

    /// Look the course room up, creating it when the lookup is refused.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] when the lookup or the creation fails.
    pub async fn ensure_room(&self) -> ChatResult<RoomInfo> {
        let url = self.endpoints.group_info(&self.room_name);
        let found = self.transport.get(&url).await;

        if response::is_rejection(&found) {
            debug!(
                room = %self.room_name,
                error_type = response::error_type(&found).unwrap_or("unknown"),
                "room lookup refused, creating room"
            );
            return self.create_room().await;
        }

        RoomInfo::from_response(found)
    }

    /// Create the course room as a private group.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] when the chat server does not confirm creation.
    pub async fn create_room(&self) -> ChatResult<RoomInfo> {
        let body = json!({ "name": self.room_name });
        let created = self
            .transport
            .post(&self.endpoints.group_create(), &body)
            .await;
        let room = RoomInfo::from_response(created)?;
        info!(
            room = %self.room_name,
            room_id = room.id().unwrap_or_default(),
            "chat room created"
        );
        Ok(room)
    }

    /// Look the visiting user up, creating the account when the lookup is
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] when the lookup or the creation fails.
    pub async fn ensure_user(&self) -> ChatResult<UserInfo> {
        let url = self.endpoints.user_info(&self.user.username);
        let found = self.transport.get(&url).await;

        if response::is_rejection(&found) {
            debug!(username = %self.user.username, "user lookup refused, creating user");
            return self.create_user().await;
        }

        UserInfo::from_response(found)
    }

    /// Create a chat account mirroring the platform user.
    ///
    /// The password is random and discarded: these accounts sign in through
    /// the platform's identity provider.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] when the chat server does not confirm creation.
    pub async fn create_user(&self) -> ChatResult<UserInfo> {
        let body = json!({
            "username": self.user.username,
            "email": self.user.email,
            "password": Uuid::new_v4().simple().to_string(),
            "name": self.user.display_name,
            "active": true,
            "verified": true,
            "requirePasswordChange": false,
            "sendWelcomeEmail": false,
        });
        let created = self
            .transport
            .post(&self.endpoints.user_create(), &body)
            .await;
        let user = UserInfo::from_response(created)?;
        info!(username = %self.user.username, "chat user created");
        Ok(user)
    }

    /// Invite the user into the room; staff are additionally made owners.
    ///
    /// The owner grant is best effort. The chat server offers no cheap way to
    /// ask whether someone already owns a room and answers
    /// `error-user-already-owner` when they do, so its outcome is logged and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`] when the invite is not confirmed.
    pub async fn add_user_to_room(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> ChatResult<MembershipInfo> {
        let body = json!({ "roomId": room_id, "userId": user_id });
        let invited = self
            .transport
            .post(&self.endpoints.group_invite(), &body)
            .await;
        let membership = MembershipInfo::from_response(invited)?;

        if self.user.is_staff {
            let granted = self
                .transport
                .post(&self.endpoints.group_add_owner(), &body)
                .await;
            let already_owner = response::error_type(&granted) == Some(ALREADY_OWNER);
            match response::check_success(granted) {
                Ok(_) => info!(room_id, user_id, "room ownership granted"),
                Err(_) if already_owner => debug!(room_id, user_id, "user already owns room"),
                Err(err) => warn!(
                    room_id,
                    user_id,
                    error = err.message(),
                    "room ownership grant failed; ignoring"
                ),
            }
        }

        Ok(membership)
    }
}
