//! Core library for vailog, the terminal client of the Vai Logística
//! decision assistant.
//!
//! - [`auth`]: the persisted session and the navigation guards
//! - [`api`]: the gateway client for every backend call
//! - [`forms`], [`chat`]: screen state and validation, free of I/O
//! - [`flight`]: keyed single-flight guard for network operations

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod flight;
pub mod forms;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Decision, Route, RouteGuard, SessionRecord, SessionStore};
pub use config::Config;
pub use flight::{FlightPermit, Operation, SingleFlight};
