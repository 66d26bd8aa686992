//! axum handlers for the console REST API.
//!
//! Handlers only extract request parts, call into
//! [`ConsoleServices`](crate::service::ConsoleServices) and shape the
//! response. Failures render through [`HttpError`](super::error::HttpError).

pub mod catalog;
pub mod deploy;
pub mod files;
pub mod github;
pub mod health;
pub mod repositories;
pub mod services;

pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::ShutdownController;
use crate::service::ConsoleServices;

/// Shared state handed to every handler. Cloning copies `Arc`s only.
#[derive(Clone)]
pub struct AppState {
    pub shutdown: Arc<ShutdownController>,
    pub services: ConsoleServices,
    /// Process start, for `/health` uptime.
    pub start_time: Instant,
}

/// `{ code, message }` acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub code: u16,
    pub message: String,
}

impl StatusMessage {
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
