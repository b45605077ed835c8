use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::capabilities::{HttpResult, StorageError};
use crate::model::SortOrder;

// --- Secret wrapper: redacts Debug, zeroizes on Drop ---

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(OfferId);

// --- Validated review input ---

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rating must be between 1 and 5, got {value}")]
    InvalidRating { value: u8 },

    #[error("review must be at least 50 characters, got {len}")]
    CommentTooShort { len: usize },

    #[error("review must be at most 300 characters, got {len}")]
    CommentTooLong { len: usize },

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("password cannot be empty")]
    EmptyPassword,
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MIN_COMMENT_LENGTH: usize = 50;
pub const MAX_COMMENT_LENGTH: usize = 300;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(ValidationError::InvalidRating { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CommentText(String);

impl CommentText {
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let len = s.chars().count();
        if len < MIN_COMMENT_LENGTH {
            return Err(ValidationError::CommentTooShort { len });
        }
        if len > MAX_COMMENT_LENGTH {
            return Err(ValidationError::CommentTooLong { len });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A review ready to submit: both client-side rules already enforced.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: Rating,
    pub text: CommentText,
}

// --- Login input ---

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: Secret,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        let password: String = password.into();
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Secret::new(password),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &self.password)
            .finish()
    }
}

// --- Event enum: capability results boxed to keep the enum small ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Bootstrap & session
    AppStarted,
    TokenLoaded(Result<Option<Secret>, StorageError>),
    SessionChecked(Box<HttpResult>),
    LoginSubmitted(Credentials),
    LoginCompleted(Box<HttpResult>),
    LogoutRequested,

    // Listing
    PlacesRequested,
    PlacesLoaded(Box<HttpResult>),
    CitySelected(String),
    SortSelected(SortOrder),

    // Offer page
    PlaceOpened(OfferId),
    PlaceLoaded {
        id: OfferId,
        result: Box<HttpResult>,
    },
    NeighborsLoaded(Box<HttpResult>),
    CommentsLoaded(Box<HttpResult>),
    PlaceClosed,

    // Reviews
    CommentSubmitted {
        id: OfferId,
        draft: ReviewDraft,
    },
    CommentPosted {
        id: OfferId,
        result: Box<HttpResult>,
    },
    CommentsRefreshed(Box<HttpResult>),

    // Favorites
    FavoriteToggled {
        id: OfferId,
        favorite: bool,
    },
    FavoriteSaved(Box<HttpResult>),

    // Notices
    NoticeDismissed,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::TokenLoaded(_) => "token_loaded",
            Self::SessionChecked(_) => "session_checked",
            Self::LoginSubmitted(_) => "login_submitted",
            Self::LoginCompleted(_) => "login_completed",
            Self::LogoutRequested => "logout_requested",
            Self::PlacesRequested => "places_requested",
            Self::PlacesLoaded(_) => "places_loaded",
            Self::CitySelected(_) => "city_selected",
            Self::SortSelected(_) => "sort_selected",
            Self::PlaceOpened(_) => "place_opened",
            Self::PlaceLoaded { .. } => "place_loaded",
            Self::NeighborsLoaded(_) => "neighbors_loaded",
            Self::CommentsLoaded(_) => "comments_loaded",
            Self::PlaceClosed => "place_closed",
            Self::CommentSubmitted { .. } => "comment_submitted",
            Self::CommentPosted { .. } => "comment_posted",
            Self::CommentsRefreshed(_) => "comments_refreshed",
            Self::FavoriteToggled { .. } => "favorite_toggled",
            Self::FavoriteSaved(_) => "favorite_saved",
            Self::NoticeDismissed => "notice_dismissed",
        }
    }
}
