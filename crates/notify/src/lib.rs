//! Escalation delivery for the vigil compliance engine.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - Email (SMTP) and webhook (HTTP gateway) notifier implementations
//! - Minijinja template rendering for escalation messages
//! - Dispatcher that routes escalations to configured channels

pub mod dispatcher;
pub mod email;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use traits::{Notification, Notifier, NotifyError};
