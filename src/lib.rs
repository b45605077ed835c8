//! Shared core for the six-cities rental-listing client.
//!
//! Everything that is not rendering lives here: the client-side mirror of
//! server state (offers and user slices), the orchestration of every
//! user-facing workflow, and typed protocols for the effects the core cannot
//! perform itself (HTTP, durable token storage, render signalling). A shell
//! drives the core by feeding [`Event`]s to [`App::update`] and executing the
//! requested effects.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod event;
pub mod model;

use serde::{Deserialize, Serialize};

pub use app::{App, ProfileView, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;

pub const BACKEND_URL: &str = "https://14.design.htmlacademy.pro/six-cities";

/// Local-storage key holding the session token between launches.
pub const TOKEN_STORAGE_KEY: &str = "six-cities-token";

pub const STATIC_CITIES: [&str; 6] = [
    "Paris",
    "Cologne",
    "Brussels",
    "Amsterdam",
    "Hamburg",
    "Dusseldorf",
];

pub const DEFAULT_CITY: &str = "Paris";

pub const MAX_NOTICES: usize = 16;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Warning,
}

/// A transient user-facing message; the view renders these as toasts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }
}
