//! Session-level use-case services.
//!
//! # Responsibility
//! - Give the rendering layer one object per logged-in user.
//! - Keep views decoupled from channel and wire details.

pub mod session;
