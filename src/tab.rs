//! Course chat tab: the seam between the host learning platform and the
//! chat room orchestration.
//!
//! The host hands over a `{course, user}` bundle and receives a
//! [`LaunchOutcome`]. Nothing here knows which platform is on the other side.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::chat::{ChatRoomOrchestrator, ChatTransport};
use crate::config::ChatConfig;
use crate::errors::ChatResult;
use crate::models::launch::{LaunchOutcome, LaunchRequest};

/// Host platform collaborator for the chat tab.
pub trait TabHost {
    /// The `{course, user}` bundle describing the current visit.
    fn launch_request(&self) -> Value;

    /// Show the outcome to the visitor.
    fn present(&self, outcome: LaunchOutcome);
}

/// Provision the course room for the visiting user and return its URL.
///
/// The room and the user are ensured concurrently since neither depends on
/// the other; the membership step needs both ids.
///
/// # Errors
///
/// Returns the first [`ChatError`](crate::errors::ChatError) raised by any
/// step. Remaining steps are skipped.
pub async fn launch_room(
    request: LaunchRequest,
    config: &ChatConfig,
    transport: Arc<dyn ChatTransport>,
) -> ChatResult<String> {
    let chat = ChatRoomOrchestrator::new(request, config, transport)?;

    let (room, user) = tokio::try_join!(chat.ensure_room(), chat.ensure_user())?;
    let room_id = room.require_id()?;
    let user_id = user.require_id()?;
    chat.add_user_to_room(room_id, user_id).await?;

    let room_url = chat.room_url();
    info!(
        course_key = chat.course_key(),
        room = chat.room_name(),
        username = %chat.user().username,
        "chat room ready"
    );
    Ok(room_url)
}

/// Run a launch from an untyped bundle, folding failures into the outcome.
///
/// On failure the outcome points at the chat server root and carries the
/// error text.
pub async fn open_chat_tab(
    bundle: &Value,
    config: &ChatConfig,
    transport: Arc<dyn ChatTransport>,
) -> LaunchOutcome {
    let result = match LaunchRequest::from_value(bundle) {
        Ok(request) => launch_room(request, config, transport).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(room_url) => LaunchOutcome {
            room_url,
            error: None,
        },
        Err(err) => {
            warn!(kind = ?err.kind(), error = err.message(), "chat tab launch failed");
            LaunchOutcome {
                room_url: config.base_url.clone(),
                error: Some(err.to_string()),
            }
        }
    }
}

/// Pull the bundle from `host`, launch, and hand the outcome back.
pub async fn run_tab(
    host: &dyn TabHost,
    config: &ChatConfig,
    transport: Arc<dyn ChatTransport>,
) {
    let bundle = host.launch_request();
    let outcome = open_chat_tab(&bundle, config, transport).await;
    host.present(outcome);
}
