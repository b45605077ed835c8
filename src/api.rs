use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpError, HttpRequest, HttpResponse};
use crate::event::{Credentials, OfferId, ReviewDraft, Secret};
use crate::{Notice, BACKEND_URL};

/// Header carrying the session token, as the backend expects it.
pub const TOKEN_HEADER: &str = "X-Token";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: BACKEND_URL.to_string(),
        }
    }
}

impl ApiConfig {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Attach the token header when a session token is present. Every request
/// goes through here, so auth injection lives in exactly one place.
fn request(
    config: &ApiConfig,
    token: Option<&Secret>,
    build: impl FnOnce(String) -> Result<HttpRequest, HttpError>,
    path: &str,
) -> Result<HttpRequest, HttpError> {
    let mut request = build(config.endpoint(path))?;
    if let Some(token) = token {
        request = request.header(TOKEN_HEADER, token.expose())?;
    }
    Ok(request)
}

// --- One builder per REST resource ---

pub fn list_offers(config: &ApiConfig, token: Option<&Secret>) -> Result<HttpRequest, HttpError> {
    request(config, token, HttpRequest::get, "/offers")
}

pub fn get_offer(
    config: &ApiConfig,
    token: Option<&Secret>,
    id: &OfferId,
) -> Result<HttpRequest, HttpError> {
    request(config, token, HttpRequest::get, &format!("/offers/{id}"))
}

pub fn get_nearby_offers(
    config: &ApiConfig,
    token: Option<&Secret>,
    id: &OfferId,
) -> Result<HttpRequest, HttpError> {
    request(
        config,
        token,
        HttpRequest::get,
        &format!("/offers/{id}/nearby"),
    )
}

pub fn get_comments(
    config: &ApiConfig,
    token: Option<&Secret>,
    id: &OfferId,
) -> Result<HttpRequest, HttpError> {
    request(config, token, HttpRequest::get, &format!("/comments/{id}"))
}

#[derive(Serialize)]
struct CommentPayload<'a> {
    comment: &'a str,
    rating: u8,
}

pub fn post_comment(
    config: &ApiConfig,
    token: Option<&Secret>,
    id: &OfferId,
    draft: &ReviewDraft,
) -> Result<HttpRequest, HttpError> {
    let body = encode(&CommentPayload {
        comment: draft.text.as_str(),
        rating: draft.rating.value(),
    })?;
    request(config, token, HttpRequest::post, &format!("/comments/{id}"))?.json_body(body)
}

pub fn post_favorite_status(
    config: &ApiConfig,
    token: Option<&Secret>,
    id: &OfferId,
    favorite: bool,
) -> Result<HttpRequest, HttpError> {
    let status = u8::from(favorite);
    request(
        config,
        token,
        HttpRequest::post,
        &format!("/favorite/{id}/{status}"),
    )
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

pub fn post_login(config: &ApiConfig, credentials: &Credentials) -> Result<HttpRequest, HttpError> {
    let body = encode(&LoginPayload {
        email: &credentials.email,
        password: credentials.password.expose(),
    })?;
    request(config, None, HttpRequest::post, "/login")?.json_body(body)
}

pub fn get_session(config: &ApiConfig, token: Option<&Secret>) -> Result<HttpRequest, HttpError> {
    request(config, token, HttpRequest::get, "/login")
}

// --- Response handling ---

fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>, HttpError> {
    serde_json::to_vec(body).map_err(|e| HttpError::Serialization {
        message: e.to_string(),
    })
}

/// Type assertion only; no further validation of the payload.
pub fn decode<T: for<'de> Deserialize<'de>>(response: &HttpResponse) -> Result<T, HttpError> {
    serde_json::from_slice(response.body()).map_err(|e| HttpError::Serialization {
        message: e.to_string(),
    })
}

// --- Backend error envelope ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    error_type: String,
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    property: String,
    #[serde(default)]
    #[allow(dead_code)]
    value: String,
    #[serde(default)]
    messages: Vec<String>,
}

const MAPPED_STATUSES: [u16; 3] = [400, 401, 404];

/// Centralized error-to-notification mapping: for the mapped status codes,
/// one error notice per envelope detail plus one warning notice from the
/// summary message. Anything else (or an unparseable body) yields nothing.
pub fn envelope_notices(response: &HttpResponse) -> Vec<Notice> {
    if !MAPPED_STATUSES.contains(&response.status()) {
        return Vec::new();
    }
    let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(response.body()) else {
        return Vec::new();
    };

    let mut notices: Vec<Notice> = envelope
        .details
        .iter()
        .map(|detail| Notice::error(format!("{}: {}", detail.property, detail.messages.join(", "))))
        .collect();
    notices.push(Notice::warning(envelope.message));
    notices
}
