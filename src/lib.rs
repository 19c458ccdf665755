#![forbid(unsafe_code)]

//! Backend for a learning platform's course "Chat" tab.
//!
//! Opening the tab provisions a Rocket.Chat private group for the course,
//! mirrors the visitor into the chat server, invites them into the group
//! (staff as owners), and returns the group URL.

pub mod chat;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod tab;

pub use config::GlobalConfig;
pub use errors::{AppError, ChatError, ChatErrorKind, ChatResult, Result};
