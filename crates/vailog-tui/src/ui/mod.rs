//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard event handling per screen
//! - `styles`: colors and text styling
//! - `screens`: the login, register, home and profile screens

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
