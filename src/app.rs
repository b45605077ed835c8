use serde::{Deserialize, Serialize};

use crate::api;
use crate::capabilities::{Capabilities, HttpError, HttpRequest, HttpResponse, HttpResult};
use crate::event::{Event, Secret};
use crate::model::{
    places_in_city, sort_places, AuthStatus, Model, OffersAction, Place, PlaceDetail, Profile,
    Review, SortOrder, UserAction,
};
use crate::{Notice, STATIC_CITIES, TOKEN_STORAGE_KEY};

const FAILED_LOAD_OFFERS: &str = "Failed to load offers.";
const FAILED_LOAD_OFFER: &str = "Failed to load offer.";
const FAILED_POST_REVIEW: &str = "Failed to post review. Please try again later.";
const FAILED_SAVE_FAVORITE: &str = "Failed to save favorite status.";
const FAILED_SIGN_IN: &str = "Failed to sign in.";

/// Profile snapshot for the view; the token never crosses this boundary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub is_pro: bool,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url.clone(),
            is_pro: profile.is_pro,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub cities: Vec<String>,
    pub selected_city: String,
    /// Catalog entries for the selected city, in the selected order.
    pub places: Vec<Place>,
    pub favorites: Vec<Place>,
    pub favorite_count: usize,
    pub is_loading_places: bool,

    pub detail: Option<PlaceDetail>,
    pub neighbors: Vec<Place>,
    pub comments: Vec<Review>,
    pub is_loading_detail: bool,
    pub detail_not_found: bool,
    pub is_posting_comment: bool,

    pub auth_status: AuthStatus,
    pub profile: Option<ProfileView>,

    pub sort_order: SortOrder,
    pub notices: Vec<Notice>,
}

#[derive(Default)]
pub struct App;

impl App {
    /// Dispatch a built request, or surface the build failure. Returns
    /// whether a request actually went out.
    fn send<F>(
        caps: &Capabilities,
        model: &mut Model,
        request: Result<HttpRequest, HttpError>,
        fallback: &str,
        make_event: F,
    ) -> bool
    where
        F: FnOnce(HttpResult) -> Event + Send + 'static,
    {
        match request {
            Ok(request) => {
                caps.http.send(request, make_event);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to build request");
                model.push_notice(Notice::error(fallback));
                false
            }
        }
    }

    /// Centralized error-to-notification mapping; returns whether the
    /// response carried a recognizable envelope.
    fn push_envelope_notices(model: &mut Model, response: &HttpResponse) -> bool {
        let notices = api::envelope_notices(response);
        let recognized = !notices.is_empty();
        for notice in notices {
            model.push_notice(notice);
        }
        recognized
    }

    fn settle_detail_fetch(model: &mut Model) {
        model.pending_detail_fetches = model.pending_detail_fetches.saturating_sub(1);
        if model.pending_detail_fetches == 0 {
            model.offers.apply(OffersAction::SetLoadingDetail(false));
        }
    }

    fn apply_session(model: &mut Model, profile: Profile) {
        model.session_token = Some(profile.token.clone());
        model
            .user
            .apply(UserAction::SetStatus(AuthStatus::Authenticated));
        model
            .user
            .apply(UserAction::SetProfile(Some(Box::new(profile))));
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[allow(clippy::too_many_lines)]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), "handling event");

        match event {
            // --- Bootstrap & session ---
            Event::AppStarted => {
                caps.storage.read(TOKEN_STORAGE_KEY, |result| {
                    Event::TokenLoaded(result.map(|value| value.map(Secret::new)))
                });
            }

            Event::TokenLoaded(result) => {
                match result {
                    Ok(token) => model.session_token = token,
                    Err(err) => {
                        tracing::warn!(error = %err, "token restore failed");
                        model.session_token = None;
                    }
                }
                // The session check always runs, token or not; it is the one
                // transition out of the Unknown authorization state.
                let request = api::get_session(&model.api, model.session_token.as_ref());
                Self::send(caps, model, request, FAILED_SIGN_IN, |result| {
                    Event::SessionChecked(Box::new(result))
                });
                caps.render.render();
            }

            Event::SessionChecked(result) => {
                // Absence of a valid session is normal application state,
                // not an error: every branch resolves the tri-state.
                let status = match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Profile>(&response) {
                            Ok(profile) => {
                                Self::apply_session(model, profile);
                                None
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "session payload undecodable");
                                Some(AuthStatus::Unauthenticated)
                            }
                        }
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        Some(AuthStatus::Unauthenticated)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "session check failed");
                        Some(AuthStatus::Unauthenticated)
                    }
                };
                if let Some(status) = status {
                    model.user.apply(UserAction::SetStatus(status));
                }
                caps.render.render();
            }

            Event::LoginSubmitted(credentials) => {
                let request = api::post_login(&model.api, &credentials);
                Self::send(caps, model, request, FAILED_SIGN_IN, |result| {
                    Event::LoginCompleted(Box::new(result))
                });
                caps.render.render();
            }

            Event::LoginCompleted(result) => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Profile>(&response) {
                            Ok(profile) => {
                                caps.storage.write(TOKEN_STORAGE_KEY, profile.token.expose());
                                Self::apply_session(model, profile);
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "login payload undecodable");
                                model.push_notice(Notice::error(FAILED_SIGN_IN));
                            }
                        }
                    }
                    // On failure the authorization status is left unchanged.
                    Ok(response) => {
                        if !Self::push_envelope_notices(model, &response) {
                            model.push_notice(Notice::error(FAILED_SIGN_IN));
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "login failed");
                        model.push_notice(Notice::error(FAILED_SIGN_IN));
                    }
                }
                caps.render.render();
            }

            Event::LogoutRequested => {
                caps.storage.remove(TOKEN_STORAGE_KEY);
                model.session_token = None;
                model
                    .user
                    .apply(UserAction::SetStatus(AuthStatus::Unauthenticated));
                model.user.apply(UserAction::SetProfile(None));
                caps.render.render();
            }

            // --- Listing ---
            Event::PlacesRequested => {
                model.offers.apply(OffersAction::SetLoadingPlaces(true));
                // Always the full catalog; city filtering happens client-side.
                let request = api::list_offers(&model.api, model.session_token.as_ref());
                Self::send(caps, model, request, FAILED_LOAD_OFFERS, |result| {
                    Event::PlacesLoaded(Box::new(result))
                });
                caps.render.render();
            }

            Event::PlacesLoaded(result) => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Vec<Place>>(&response) {
                            Ok(places) => model.offers.apply(OffersAction::ReplacePlaces(places)),
                            Err(err) => {
                                tracing::warn!(error = %err, "offer list undecodable");
                                model.push_notice(Notice::error(FAILED_LOAD_OFFERS));
                            }
                        }
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_LOAD_OFFERS));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "offer list fetch failed");
                        model.push_notice(Notice::error(FAILED_LOAD_OFFERS));
                    }
                }
                model.offers.apply(OffersAction::SetLoadingPlaces(false));
                caps.render.render();
            }

            Event::CitySelected(city) => {
                model.offers.apply(OffersAction::SelectCity(city));
                caps.render.render();
            }

            Event::SortSelected(order) => {
                model.sort_order = order;
                caps.render.render();
            }

            // --- Offer page ---
            Event::PlaceOpened(id) => {
                model.offers.apply(OffersAction::SetLoadingDetail(true));
                model.offers.apply(OffersAction::SetDetailNotFound(false));
                model.pending_detail_fetches = 0;
                let request = api::get_offer(&model.api, model.session_token.as_ref(), &id);
                Self::send(caps, model, request, FAILED_LOAD_OFFER, move |result| {
                    Event::PlaceLoaded {
                        id,
                        result: Box::new(result),
                    }
                });
                caps.render.render();
            }

            Event::PlaceLoaded { id, result } => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<PlaceDetail>(&response) {
                            Ok(detail) => {
                                model
                                    .offers
                                    .apply(OffersAction::SetDetail(Some(Box::new(detail))));

                                // Independent reads keyed by the same id; their
                                // completion order does not matter. The loading
                                // flag clears once both settle.
                                let mut pending = 0;
                                let nearby = api::get_nearby_offers(
                                    &model.api,
                                    model.session_token.as_ref(),
                                    &id,
                                );
                                if Self::send(caps, model, nearby, FAILED_LOAD_OFFER, |result| {
                                    Event::NeighborsLoaded(Box::new(result))
                                }) {
                                    pending += 1;
                                }
                                let comments = api::get_comments(
                                    &model.api,
                                    model.session_token.as_ref(),
                                    &id,
                                );
                                if Self::send(caps, model, comments, FAILED_LOAD_OFFER, |result| {
                                    Event::CommentsLoaded(Box::new(result))
                                }) {
                                    pending += 1;
                                }
                                model.pending_detail_fetches = pending;
                                if pending == 0 {
                                    model.offers.apply(OffersAction::SetLoadingDetail(false));
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "offer detail undecodable");
                                model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                                model.offers.apply(OffersAction::SetLoadingDetail(false));
                            }
                        }
                    }
                    // Expected, recoverable outcome: the view renders a
                    // not-found page instead of an error.
                    Ok(response) if response.status() == 404 => {
                        Self::push_envelope_notices(model, &response);
                        model.offers.apply(OffersAction::SetDetailNotFound(true));
                        model.offers.apply(OffersAction::SetDetail(None));
                        model.offers.apply(OffersAction::SetLoadingDetail(false));
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                        model.offers.apply(OffersAction::SetLoadingDetail(false));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "offer detail fetch failed");
                        model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                        model.offers.apply(OffersAction::SetLoadingDetail(false));
                    }
                }
                caps.render.render();
            }

            Event::NeighborsLoaded(result) => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Vec<Place>>(&response) {
                            Ok(neighbors) => {
                                model.offers.apply(OffersAction::ReplaceNeighbors(neighbors));
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "neighbor list undecodable");
                                model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                            }
                        }
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "neighbor fetch failed");
                        model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                    }
                }
                Self::settle_detail_fetch(model);
                caps.render.render();
            }

            Event::CommentsLoaded(result) => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Vec<Review>>(&response) {
                            Ok(comments) => {
                                model.offers.apply(OffersAction::ReplaceComments(comments));
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "comment list undecodable");
                                model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                            }
                        }
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "comment fetch failed");
                        model.push_notice(Notice::error(FAILED_LOAD_OFFER));
                    }
                }
                Self::settle_detail_fetch(model);
                caps.render.render();
            }

            Event::PlaceClosed => {
                model.offers.apply(OffersAction::SetDetail(None));
                model.offers.apply(OffersAction::ReplaceNeighbors(Vec::new()));
                model.offers.apply(OffersAction::ReplaceComments(Vec::new()));
                model.offers.apply(OffersAction::SetDetailNotFound(false));
                model.offers.apply(OffersAction::SetLoadingDetail(false));
                model.pending_detail_fetches = 0;
                caps.render.render();
            }

            // --- Reviews ---
            Event::CommentSubmitted { id, draft } => {
                model.offers.apply(OffersAction::SetPostingComment(true));
                let request =
                    api::post_comment(&model.api, model.session_token.as_ref(), &id, &draft);
                Self::send(caps, model, request, FAILED_POST_REVIEW, move |result| {
                    Event::CommentPosted {
                        id,
                        result: Box::new(result),
                    }
                });
                caps.render.render();
            }

            Event::CommentPosted { id, result } => {
                match *result {
                    Ok(response) if response.is_success() => {
                        // Full refresh rather than a local append.
                        let request =
                            api::get_comments(&model.api, model.session_token.as_ref(), &id);
                        if !Self::send(caps, model, request, FAILED_POST_REVIEW, |result| {
                            Event::CommentsRefreshed(Box::new(result))
                        }) {
                            model.offers.apply(OffersAction::SetPostingComment(false));
                        }
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_POST_REVIEW));
                        model.offers.apply(OffersAction::SetPostingComment(false));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "review post failed");
                        model.push_notice(Notice::error(FAILED_POST_REVIEW));
                        model.offers.apply(OffersAction::SetPostingComment(false));
                    }
                }
                caps.render.render();
            }

            Event::CommentsRefreshed(result) => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Vec<Review>>(&response) {
                            Ok(comments) => {
                                model.offers.apply(OffersAction::ReplaceComments(comments));
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "refreshed comments undecodable");
                                model.push_notice(Notice::error(FAILED_POST_REVIEW));
                            }
                        }
                    }
                    // The post itself succeeded; prior comment state stays.
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_POST_REVIEW));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "comment refresh failed");
                        model.push_notice(Notice::error(FAILED_POST_REVIEW));
                    }
                }
                model.offers.apply(OffersAction::SetPostingComment(false));
                caps.render.render();
            }

            // --- Favorites ---
            Event::FavoriteToggled { id, favorite } => {
                // No optimistic update, so no rollback on failure.
                let request = api::post_favorite_status(
                    &model.api,
                    model.session_token.as_ref(),
                    &id,
                    favorite,
                );
                Self::send(caps, model, request, FAILED_SAVE_FAVORITE, |result| {
                    Event::FavoriteSaved(Box::new(result))
                });
            }

            Event::FavoriteSaved(result) => {
                match *result {
                    Ok(response) if response.is_success() => {
                        match api::decode::<Place>(&response) {
                            Ok(place) => model.offers.apply(OffersAction::PatchPlace(place)),
                            Err(err) => {
                                tracing::warn!(error = %err, "favorite payload undecodable");
                                model.push_notice(Notice::error(FAILED_SAVE_FAVORITE));
                            }
                        }
                    }
                    Ok(response) => {
                        Self::push_envelope_notices(model, &response);
                        model.push_notice(Notice::error(FAILED_SAVE_FAVORITE));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "favorite toggle failed");
                        model.push_notice(Notice::error(FAILED_SAVE_FAVORITE));
                    }
                }
                caps.render.render();
            }

            Event::NoticeDismissed => {
                model.notices.pop_front();
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let in_city = places_in_city(&model.offers.places, &model.offers.city);
        let places = sort_places(in_city, model.sort_order);
        let favorites: Vec<Place> = model
            .offers
            .places
            .iter()
            .filter(|place| place.is_favorite)
            .cloned()
            .collect();

        ViewModel {
            cities: STATIC_CITIES.iter().map(ToString::to_string).collect(),
            selected_city: model.offers.city.clone(),
            places,
            favorite_count: favorites.len(),
            favorites,
            is_loading_places: model.offers.is_loading_places,

            detail: model.offers.detail.clone(),
            neighbors: model.offers.neighbors.clone(),
            comments: model.offers.comments.clone(),
            is_loading_detail: model.offers.is_loading_detail,
            detail_not_found: model.offers.detail_not_found,
            is_posting_comment: model.offers.is_posting_comment,

            auth_status: model.user.status,
            profile: model.user.profile.as_ref().map(ProfileView::from),

            sort_order: model.sort_order,
            notices: model.notices.iter().cloned().collect(),
        }
    }
}
