//! Data models for the assistant backend.
//!
//! - `UserProfile`: normalized view of the stored `usuario` snapshot
//! - `ChatMessage`, `WireMessage`, `Role`: chat transcript and wire format
//! - `ConversationSummary`: entries of the conversation history
//! - Account payloads: `LoginRequest`, `RegisterRequest`, `ProfileUpdate`

pub mod account;
pub mod chat;
pub mod user;

pub use account::{AuthResponse, AvatarError, AvatarFile, Document, LoginRequest, ProfileUpdate, RegisterRequest};
pub use chat::{ChatMessage, ConversationSummary, Role, WireMessage};
pub use user::UserProfile;
