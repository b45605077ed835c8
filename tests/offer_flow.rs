use crux_core::testing::AppTester;
use serde_json::json;

use six_cities_shared::capabilities::{HttpError, HttpResponse};
use six_cities_shared::event::{CommentText, Event, OfferId, Rating, ReviewDraft};
use six_cities_shared::{App, Effect, Model, NoticeKind};

fn offer_json(id: &str, favorite: bool) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Offer {id}"),
        "type": "apartment",
        "price": 120,
        "city": {
            "name": "Amsterdam",
            "location": {"latitude": 52.37454, "longitude": 4.897976, "zoom": 13}
        },
        "location": {"latitude": 52.37454, "longitude": 4.897976, "zoom": 16},
        "isFavorite": favorite,
        "isPremium": false,
        "rating": 4.2,
        "previewImage": "img/1.png"
    })
}

fn detail_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Offer {id}"),
        "type": "house",
        "price": 200,
        "city": {
            "name": "Amsterdam",
            "location": {"latitude": 52.37454, "longitude": 4.897976, "zoom": 13}
        },
        "location": {"latitude": 52.37454, "longitude": 4.897976, "zoom": 16},
        "isFavorite": false,
        "isPremium": true,
        "rating": 4.8,
        "description": "A quiet cozy house hidden behind a river.",
        "bedrooms": 3,
        "maxAdults": 4,
        "goods": ["Wi-Fi", "Heating"],
        "images": ["img/1.png", "img/2.png"],
        "host": {"name": "Angelina", "avatarUrl": "img/avatar-angelina.jpg", "isPro": true}
    })
}

fn review_json(id: &str, comment: &str) -> serde_json::Value {
    json!({
        "id": id,
        "date": "2019-05-08T14:13:56.569Z",
        "user": {"name": "Max", "avatarUrl": "img/avatar-max.jpg", "isPro": false},
        "comment": comment,
        "rating": 4
    })
}

macro_rules! http_requests {
    ($effects:expr) => {
        $effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Http(request) => Some(request),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
}

#[test]
fn open_offer_loads_detail_then_neighbors_and_comments_concurrently() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::PlaceOpened(OfferId::new("77")), &mut model);
    assert!(model.offers.is_loading_detail);
    assert!(!model.offers.detail_not_found);

    let mut requests = http_requests!(update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0].operation.url().ends_with("/offers/77"));

    let response = HttpResponse::json(200, &detail_json("77")).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(response))
        .expect("detail resolves");

    let mut follow_up_effects = Vec::new();
    for event in update.events {
        follow_up_effects.extend(app.update(event, &mut model).effects);
    }

    // Detail is in, but the page is still loading until both child fetches
    // settle.
    assert!(model.offers.detail.is_some());
    assert!(model.offers.is_loading_detail);

    let mut follow_ups = http_requests!(follow_up_effects);
    assert_eq!(follow_ups.len(), 2);
    let urls: Vec<&str> = follow_ups
        .iter()
        .map(|request| request.operation.url())
        .collect();
    assert!(urls.iter().any(|url| url.ends_with("/offers/77/nearby")));
    assert!(urls.iter().any(|url| url.ends_with("/comments/77")));

    for request in &mut follow_ups {
        let response = if request.operation.url().ends_with("/nearby") {
            HttpResponse::json(200, &json!([offer_json("78", false)])).unwrap()
        } else {
            HttpResponse::json(200, &json!([review_json("r1", "Lovely stay.")])).unwrap()
        };
        let update = app.resolve(request, Ok(response)).expect("child resolves");
        for event in update.events {
            app.update(event, &mut model);
        }
    }

    let detail = model.offers.detail.as_ref().unwrap();
    assert_eq!(detail.place.id.as_str(), "77");
    assert_eq!(detail.bedrooms, 3);
    assert_eq!(model.offers.neighbors.len(), 1);
    assert_eq!(model.offers.comments.len(), 1);
    assert!(!model.offers.detail_not_found);
    assert!(!model.offers.is_loading_detail);
}

#[test]
fn open_offer_not_found_is_swallowed_into_a_flag() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::PlaceOpened(OfferId::new("missing")), &mut model);
    let mut requests = http_requests!(update.effects);

    let body = json!({
        "errorType": "COMMON_ERROR",
        "message": "Offer with id missing not found.",
        "details": []
    });
    let response = HttpResponse::json(404, &body).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(response))
        .expect("not-found resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(model.offers.detail_not_found);
    assert!(model.offers.detail.is_none());
    assert!(!model.offers.is_loading_detail);
    // The centralized mapping still reports the envelope summary.
    assert!(model
        .notices
        .iter()
        .any(|notice| notice.text == "Offer with id missing not found."));
}

#[test]
fn open_offer_transport_failure_surfaces_a_generic_notice() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::PlaceOpened(OfferId::new("77")), &mut model);
    let mut requests = http_requests!(update.effects);

    let update = app
        .resolve(&mut requests[0], Err(HttpError::Timeout))
        .expect("failure resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.offers.detail_not_found);
    assert!(model.offers.detail.is_none());
    assert!(!model.offers.is_loading_detail);
    assert_eq!(model.notices.len(), 1);
    assert_eq!(model.notices[0].text, "Failed to load offer.");
}

#[test]
fn leaving_the_offer_page_clears_detail_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::PlaceOpened(OfferId::new("77")), &mut model);
    let mut requests = http_requests!(update.effects);
    let response = HttpResponse::json(200, &detail_json("77")).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(response))
        .expect("detail resolves");
    for event in update.events {
        app.update(event, &mut model);
    }
    assert!(model.offers.detail.is_some());

    app.update(Event::PlaceClosed, &mut model);
    assert!(model.offers.detail.is_none());
    assert!(model.offers.neighbors.is_empty());
    assert!(model.offers.comments.is_empty());
    assert!(!model.offers.is_loading_detail);
    assert!(!model.offers.detail_not_found);
}

#[test]
fn posting_a_comment_refetches_the_full_list() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let draft = ReviewDraft {
        rating: Rating::new(5).unwrap(),
        text: CommentText::new("a".repeat(60)).unwrap(),
    };
    let update = app.update(
        Event::CommentSubmitted {
            id: OfferId::new("77"),
            draft,
        },
        &mut model,
    );
    assert!(model.offers.is_posting_comment);

    let mut requests = http_requests!(update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0].operation.url().ends_with("/comments/77"));

    let created = HttpResponse::json(201, &review_json("r2", &"b".repeat(60))).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(created))
        .expect("post resolves");

    let mut refresh_effects = Vec::new();
    for event in update.events {
        refresh_effects.extend(app.update(event, &mut model).effects);
    }

    // Still posting until the refetch settles; nothing was appended locally.
    assert!(model.offers.is_posting_comment);
    assert!(model.offers.comments.is_empty());

    let mut refresh = http_requests!(refresh_effects);
    assert_eq!(refresh.len(), 1);
    assert!(refresh[0].operation.url().ends_with("/comments/77"));

    let full_list = HttpResponse::json(
        200,
        &json!([
            review_json("r1", &"c".repeat(60)),
            review_json("r2", &"b".repeat(60)),
        ]),
    )
    .unwrap();
    let update = app
        .resolve(&mut refresh[0], Ok(full_list))
        .expect("refresh resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert_eq!(model.offers.comments.len(), 2);
    assert!(!model.offers.is_posting_comment);
    assert!(model.notices.is_empty());
}

#[test]
fn failed_comment_post_keeps_prior_comments() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let draft = ReviewDraft {
        rating: Rating::new(3).unwrap(),
        text: CommentText::new("a".repeat(60)).unwrap(),
    };
    let update = app.update(
        Event::CommentSubmitted {
            id: OfferId::new("77"),
            draft,
        },
        &mut model,
    );
    let mut requests = http_requests!(update.effects);

    let body = json!({
        "errorType": "VALIDATION_ERROR",
        "message": "Validation error: /six-cities/comments/77",
        "details": [
            {"property": "rating", "value": "3", "messages": ["rating is required"]}
        ]
    });
    let response = HttpResponse::json(400, &body).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(response))
        .expect("failed post resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.offers.is_posting_comment);
    assert!(model.offers.comments.is_empty());
    assert!(model
        .notices
        .iter()
        .any(|notice| notice.text == "rating: rating is required"));
    assert!(model
        .notices
        .iter()
        .any(|notice| notice.text == "Failed to post review. Please try again later."));
}

#[test]
fn favorite_toggle_patches_every_projection() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    // Seed the three projections through the regular flows.
    let update = app.update(Event::PlacesRequested, &mut model);
    let mut requests = http_requests!(update.effects);
    let catalog = HttpResponse::json(
        200,
        &json!([offer_json("1", false), offer_json("2", false)]),
    )
    .unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(catalog))
        .expect("catalog resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let update = app.update(Event::PlaceOpened(OfferId::new("1")), &mut model);
    let mut requests = http_requests!(update.effects);
    let detail = HttpResponse::json(200, &detail_json("1")).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(detail))
        .expect("detail resolves");
    let mut child_effects = Vec::new();
    for event in update.events {
        child_effects.extend(app.update(event, &mut model).effects);
    }
    let mut children = http_requests!(child_effects);
    for request in &mut children {
        let response = if request.operation.url().ends_with("/nearby") {
            HttpResponse::json(200, &json!([offer_json("1", false)])).unwrap()
        } else {
            HttpResponse::json(200, &json!([])).unwrap()
        };
        let update = app.resolve(request, Ok(response)).expect("child resolves");
        for event in update.events {
            app.update(event, &mut model);
        }
    }

    // Toggle on.
    let update = app.update(
        Event::FavoriteToggled {
            id: OfferId::new("1"),
            favorite: true,
        },
        &mut model,
    );
    let mut requests = http_requests!(update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0].operation.url().ends_with("/favorite/1/1"));

    let updated = HttpResponse::json(200, &offer_json("1", true)).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(updated))
        .expect("favorite resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(model.offers.places[0].is_favorite);
    assert!(model.offers.neighbors[0].is_favorite);
    assert!(model.offers.detail.as_ref().unwrap().place.is_favorite);
    // The untouched entry stays untouched.
    assert!(!model.offers.places[1].is_favorite);
}

#[test]
fn failed_favorite_toggle_changes_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::PlacesRequested, &mut model);
    let mut requests = http_requests!(update.effects);
    let catalog = HttpResponse::json(200, &json!([offer_json("1", false)])).unwrap();
    let update = app
        .resolve(&mut requests[0], Ok(catalog))
        .expect("catalog resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let update = app.update(
        Event::FavoriteToggled {
            id: OfferId::new("1"),
            favorite: true,
        },
        &mut model,
    );
    let mut requests = http_requests!(update.effects);
    let update = app
        .resolve(&mut requests[0], Err(HttpError::Timeout))
        .expect("failure resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.offers.places[0].is_favorite);
    assert_eq!(model.notices.len(), 1);
    assert_eq!(model.notices[0].kind, NoticeKind::Error);
    assert_eq!(model.notices[0].text, "Failed to save favorite status.");
}
