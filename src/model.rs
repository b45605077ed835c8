use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::api::ApiConfig;
use crate::event::{OfferId, Secret};
use crate::{Notice, DEFAULT_CITY, MAX_NOTICES};

// --- Wire-shaped domain types (camelCase on the wire) ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct City {
    pub name: String,
    pub location: Location,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Apartment,
    Room,
    House,
    Hotel,
}

/// A rental listing as shown in list and card views. Immutable once fetched,
/// except for the favorite flag which `patch-place` rewrites.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: OfferId,
    pub title: String,
    #[serde(rename = "type")]
    pub category: PlaceCategory,
    pub price: u32,
    pub city: City,
    pub location: Location,
    pub is_favorite: bool,
    pub is_premium: bool,
    pub rating: f64,
    // The detail payload carries `images` instead of a preview.
    #[serde(default)]
    pub preview_image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub name: String,
    pub avatar_url: String,
    pub is_pro: bool,
}

/// The full record for one listing, shown on its dedicated page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetail {
    #[serde(flatten)]
    pub place: Place,
    pub description: String,
    pub bedrooms: u32,
    pub max_adults: u32,
    pub goods: Vec<String>,
    pub images: Vec<String>,
    pub host: UserSummary,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub date: String,
    pub user: UserSummary,
    pub comment: String,
    pub rating: u8,
}

/// Login / session-check payload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub avatar_url: String,
    pub is_pro: bool,
    pub email: String,
    pub token: Secret,
}

// --- Offers slice ---

#[derive(Clone, Debug, PartialEq)]
pub struct OffersState {
    pub city: String,
    pub places: Vec<Place>,
    pub detail: Option<PlaceDetail>,
    pub neighbors: Vec<Place>,
    pub comments: Vec<Review>,
    pub is_loading_places: bool,
    pub is_loading_detail: bool,
    pub is_posting_comment: bool,
    pub detail_not_found: bool,
}

impl Default for OffersState {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            places: Vec::new(),
            detail: None,
            neighbors: Vec::new(),
            comments: Vec::new(),
            is_loading_places: false,
            is_loading_detail: false,
            is_posting_comment: false,
            detail_not_found: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OffersAction {
    SelectCity(String),
    SetLoadingPlaces(bool),
    ReplacePlaces(Vec<Place>),
    SetDetail(Option<Box<PlaceDetail>>),
    ReplaceNeighbors(Vec<Place>),
    ReplaceComments(Vec<Review>),
    SetLoadingDetail(bool),
    SetDetailNotFound(bool),
    SetPostingComment(bool),
    PatchPlace(Place),
}

impl OffersState {
    /// Every arm is whole-field replacement except `PatchPlace`, which
    /// rewrites the matching entry in all three projections and leaves every
    /// other entry untouched.
    pub fn apply(&mut self, action: OffersAction) {
        match action {
            OffersAction::SelectCity(city) => self.city = city,
            OffersAction::SetLoadingPlaces(loading) => self.is_loading_places = loading,
            OffersAction::ReplacePlaces(places) => self.places = places,
            OffersAction::SetDetail(detail) => self.detail = detail.map(|boxed| *boxed),
            OffersAction::ReplaceNeighbors(neighbors) => self.neighbors = neighbors,
            OffersAction::ReplaceComments(comments) => self.comments = comments,
            OffersAction::SetLoadingDetail(loading) => self.is_loading_detail = loading,
            OffersAction::SetDetailNotFound(not_found) => self.detail_not_found = not_found,
            OffersAction::SetPostingComment(posting) => self.is_posting_comment = posting,
            OffersAction::PatchPlace(updated) => self.patch_place(&updated),
        }
    }

    fn patch_place(&mut self, updated: &Place) {
        for place in self.places.iter_mut().filter(|p| p.id == updated.id) {
            *place = updated.clone();
        }
        for place in self.neighbors.iter_mut().filter(|p| p.id == updated.id) {
            *place = updated.clone();
        }
        if let Some(detail) = &mut self.detail {
            if detail.place.id == updated.id {
                detail.place.is_favorite = updated.is_favorite;
            }
        }
    }
}

// --- User slice ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// Initial state, pending the first session check.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct UserState {
    pub status: AuthStatus,
    pub profile: Option<Profile>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
    SetStatus(AuthStatus),
    SetProfile(Option<Box<Profile>>),
}

impl UserState {
    /// No validation here; the orchestration layer keeps status and profile
    /// consistent.
    pub fn apply(&mut self, action: UserAction) {
        match action {
            UserAction::SetStatus(status) => self.status = status,
            UserAction::SetProfile(profile) => self.profile = profile.map(|boxed| *boxed),
        }
    }
}

// --- View-level derivations (filtering and sorting stay out of the slices) ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Server order.
    #[default]
    Popular,
    PriceLowToHigh,
    PriceHighToLow,
    TopRatedFirst,
}

impl SortOrder {
    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Popular => "Popular",
            SortOrder::PriceLowToHigh => "Price: low to high",
            SortOrder::PriceHighToLow => "Price: high to low",
            SortOrder::TopRatedFirst => "Top rated first",
        }
    }
}

pub fn places_in_city(places: &[Place], city: &str) -> Vec<Place> {
    places
        .iter()
        .filter(|place| place.city.name == city)
        .cloned()
        .collect()
}

pub fn sort_places(mut places: Vec<Place>, order: SortOrder) -> Vec<Place> {
    match order {
        SortOrder::Popular => {}
        SortOrder::PriceLowToHigh => places.sort_by_key(|place| place.price),
        SortOrder::PriceHighToLow => {
            places.sort_by_key(|place| std::cmp::Reverse(place.price));
        }
        SortOrder::TopRatedFirst => places.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
    places
}

// --- Model root ---

#[derive(Default)]
pub struct Model {
    pub api: ApiConfig,
    pub offers: OffersState,
    pub user: UserState,

    /// The only piece of session state that outlives the process; mirrored
    /// here from durable storage and attached to every request.
    pub session_token: Option<Secret>,

    pub sort_order: SortOrder,
    pub notices: VecDeque<Notice>,

    /// Outstanding neighbor/comment fetches for the open offer; the detail
    /// loading flag clears when this reaches zero.
    pub pending_detail_fetches: u8,
}

impl Model {
    pub fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}
