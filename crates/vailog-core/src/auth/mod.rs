//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: the persisted token + user snapshot, shared by handle
//! - `RouteGuard`: per-navigation allow/redirect decisions
//!
//! A session is valid exactly when a non-empty token is stored; there is no
//! local expiry.

pub mod guard;
pub mod session;

pub use guard::{resolve, Decision, Route, RouteGuard};
pub use session::{SessionRecord, SessionStore};
