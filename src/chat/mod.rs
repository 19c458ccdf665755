//! Rocket.Chat REST integration: HTTP transport, endpoint layout, response
//! validation, and the room/user/membership orchestration built on them.

pub mod client;
pub mod endpoints;
pub mod orchestrator;
pub mod response;

pub use client::{ChatTransport, HttpChatClient};
pub use endpoints::ChatEndpoints;
pub use orchestrator::ChatRoomOrchestrator;
pub use response::{MembershipInfo, RoomInfo, UserInfo};
