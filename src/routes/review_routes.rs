//! Review HTTP endpoints
//!
//! - `GET    /api/review`      list reviews as denormalized views
//! - `POST   /api/review`      add a review (authenticated)
//! - `DELETE /api/review/{id}` remove a review (owner or admin)

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::schemas::{ReviewDoc, ReviewView};
use crate::routes::{
    error_response, json_response, method_not_allowed, not_found, parse_json_body, require_auth,
    BoxBody, ErrBody,
};
use crate::server::AppState;
use crate::services::ReviewQuery;

/// Denormalized review as it crosses the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewViewResponse {
    #[serde(rename = "_id")]
    id: String,
    txt: String,
    created_at: i64,
    user: UserRef,
    toy: ToyRef,
}

#[derive(Debug, Serialize)]
struct UserRef {
    #[serde(rename = "_id")]
    id: String,
    fullname: String,
}

#[derive(Debug, Serialize)]
struct ToyRef {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    price: f64,
}

impl From<ReviewView> for ReviewViewResponse {
    fn from(view: ReviewView) -> Self {
        Self {
            id: view.id.to_hex(),
            txt: view.txt,
            created_at: view.created_at,
            user: UserRef {
                id: view.user.id.to_hex(),
                fullname: view.user.fullname,
            },
            toy: ToyRef {
                id: view.toy.id.to_hex(),
                name: view.toy.name,
                price: view.toy.price,
            },
        }
    }
}

/// Freshly-created review, references still by id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewResponse {
    #[serde(rename = "_id")]
    id: String,
    txt: String,
    toy_id: String,
    user_id: String,
    created_at: i64,
}

impl From<ReviewDoc> for ReviewResponse {
    fn from(review: ReviewDoc) -> Self {
        Self {
            id: review.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            txt: review.txt,
            toy_id: review.toy_id.to_hex(),
            user_id: review.user_id.to_hex(),
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddReviewBody {
    #[serde(default)]
    txt: String,
    #[serde(default)]
    toy_id: String,
}

#[derive(Debug, Serialize)]
struct RemovedBody {
    removed: u64,
}

pub async fn handle_review_request(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    let rest = path.strip_prefix("/api/review").unwrap_or("");
    let segments: Vec<String> = rest
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    match (method, segments.as_slice()) {
        (Method::GET, []) => list_reviews(&state, &query).await,
        (Method::POST, []) => add_review(state, req).await,
        (Method::DELETE, [review_id]) => remove_review(&state, &req, review_id).await,
        (Method::GET | Method::POST | Method::DELETE, _) => not_found(&path),
        _ => method_not_allowed(),
    }
}

async fn list_reviews(state: &AppState, query: &str) -> Response<BoxBody> {
    let filter = ReviewQuery::from_query(query);
    match state.reviews.query(&filter).await {
        Ok(views) => {
            let body: Vec<ReviewViewResponse> =
                views.into_iter().map(ReviewViewResponse::from).collect();
            json_response(StatusCode::OK, &body)
        }
        Err(e) => error_response(e, "Failed to get reviews"),
    }
}

async fn add_review(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Response<BoxBody> {
    let user = match require_auth(&state, &req) {
        Ok(user) => user,
        Err(resp) => return *resp,
    };

    let body: AddReviewBody = match parse_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(e, "Failed to add review"),
    };

    if body.txt.trim().is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrBody {
                err: "review txt is required".into(),
            },
        );
    }

    match state.reviews.add(body.txt, &body.toy_id, &user).await {
        Ok(review) => json_response(StatusCode::CREATED, &ReviewResponse::from(review)),
        Err(e) => error_response(e, "Failed to add review"),
    }
}

async fn remove_review(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
    review_id: &str,
) -> Response<BoxBody> {
    let user = match require_auth(state, req) {
        Ok(user) => user,
        Err(resp) => return *resp,
    };

    match state.reviews.remove(review_id, &user).await {
        Ok(removed) => json_response(StatusCode::OK, &RemovedBody { removed }),
        Err(e) => error_response(e, "Failed to remove review"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ReviewToyRef, ReviewUserRef};
    use bson::oid::ObjectId;

    #[test]
    fn test_review_view_wire_shape() {
        let review_id = ObjectId::new();
        let user_id = ObjectId::new();
        let toy_id = ObjectId::new();
        let view = ReviewView {
            id: review_id,
            txt: "my kid loves it".into(),
            created_at: 1_700_000_000_000,
            user: ReviewUserRef {
                id: user_id,
                fullname: "Puki Ben David".into(),
            },
            toy: ReviewToyRef {
                id: toy_id,
                name: "Talking Elmo".into(),
                price: 49.9,
            },
        };

        let json = serde_json::to_value(ReviewViewResponse::from(view)).unwrap();
        assert_eq!(json["_id"], serde_json::json!(review_id.to_hex()));
        assert_eq!(json["user"]["_id"], serde_json::json!(user_id.to_hex()));
        assert_eq!(json["user"]["fullname"], "Puki Ben David");
        assert_eq!(json["toy"]["name"], "Talking Elmo");
        assert_eq!(json["toy"]["price"], 49.9);
    }
}
