//! REST API client module for the assistant backend.
//!
//! This module provides the `ApiClient`, the only component that talks to
//! the backend: account endpoints (login, registration, profile update) and
//! the assistant endpoints (chat, conversation history).
//!
//! Requests carry `Authorization: Bearer <token>` whenever the session store
//! holds a token.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestBody, RequestOptions, NO_REPLY_FALLBACK};
pub use error::ApiError;
