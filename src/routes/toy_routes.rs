//! Toy HTTP endpoints
//!
//! - `GET    /api/toy`                  list toys (filter/sort via query string)
//! - `GET    /api/toy/{id}`             fetch one toy
//! - `POST   /api/toy`                  create (admin)
//! - `PUT    /api/toy/{id}`             update (admin)
//! - `DELETE /api/toy/{id}`             delete (admin)
//! - `POST   /api/toy/{id}/msg`         append a message (authenticated)
//! - `DELETE /api/toy/{id}/msg/{msgId}` remove a message (authenticated)

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::schemas::{ToyDoc, ToyMsg};
use crate::routes::{
    error_response, json_response, method_not_allowed, not_found, parse_json_body, require_admin,
    require_auth, BoxBody,
};
use crate::server::AppState;
use crate::services::{ToyInput, ToyQuery};

/// Toy as it crosses the wire; the document id flattens to a hex string
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToyResponse {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    img_url: String,
    price: f64,
    labels: Vec<String>,
    in_stock: bool,
    created_at: i64,
    msgs: Vec<ToyMsg>,
}

impl From<ToyDoc> for ToyResponse {
    fn from(toy: ToyDoc) -> Self {
        Self {
            id: toy.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: toy.name,
            img_url: toy.img_url,
            price: toy.price,
            labels: toy.labels,
            in_stock: toy.in_stock,
            created_at: toy.created_at,
            msgs: toy.msgs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MsgBody {
    #[serde(default)]
    txt: String,
}

#[derive(Debug, Serialize)]
struct RemovedBody {
    removed: u64,
}

pub async fn handle_toy_request(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    let rest = path.strip_prefix("/api/toy").unwrap_or("");
    let segments: Vec<String> = rest
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    match (method, segments.as_slice()) {
        (Method::GET, []) => list_toys(&state, &query).await,
        (Method::GET, [toy_id]) => get_toy(&state, toy_id).await,
        (Method::POST, []) => add_toy(state, req).await,
        (Method::PUT, [toy_id]) => {
            let toy_id = toy_id.clone();
            update_toy(state, req, &toy_id).await
        }
        (Method::DELETE, [toy_id]) => remove_toy(&state, &req, toy_id).await,
        (Method::POST, [toy_id, msg]) if msg == "msg" => {
            let toy_id = toy_id.clone();
            add_toy_msg(state, req, &toy_id).await
        }
        (Method::DELETE, [toy_id, msg, msg_id]) if msg == "msg" => {
            remove_toy_msg(&state, &req, toy_id, msg_id).await
        }
        (Method::GET | Method::POST | Method::PUT | Method::DELETE, _) => not_found(&path),
        _ => method_not_allowed(),
    }
}

async fn list_toys(state: &AppState, query: &str) -> Response<BoxBody> {
    let filter = ToyQuery::from_query(query);
    match state.toys.query(&filter).await {
        Ok(toys) => {
            let body: Vec<ToyResponse> = toys.into_iter().map(ToyResponse::from).collect();
            json_response(StatusCode::OK, &body)
        }
        Err(e) => error_response(e, "Failed to get toys"),
    }
}

async fn get_toy(state: &AppState, toy_id: &str) -> Response<BoxBody> {
    match state.toys.get_by_id(toy_id).await {
        Ok(toy) => json_response(StatusCode::OK, &ToyResponse::from(toy)),
        Err(e) => error_response(e, "Failed to get toy"),
    }
}

async fn add_toy(state: Arc<AppState>, req: Request<hyper::body::Incoming>) -> Response<BoxBody> {
    if let Err(resp) = require_admin(&state, &req) {
        return *resp;
    }

    let input: ToyInput = match parse_json_body(req).await {
        Ok(input) => input,
        Err(e) => return error_response(e, "Failed to add toy"),
    };

    match state.toys.add(input).await {
        Ok(toy) => json_response(StatusCode::CREATED, &ToyResponse::from(toy)),
        Err(e) => error_response(e, "Failed to add toy"),
    }
}

async fn update_toy(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
    toy_id: &str,
) -> Response<BoxBody> {
    if let Err(resp) = require_admin(&state, &req) {
        return *resp;
    }

    let input: ToyInput = match parse_json_body(req).await {
        Ok(input) => input,
        Err(e) => return error_response(e, "Failed to update toy"),
    };

    match state.toys.update(toy_id, input).await {
        Ok(toy) => json_response(StatusCode::OK, &ToyResponse::from(toy)),
        Err(e) => error_response(e, "Failed to update toy"),
    }
}

async fn remove_toy(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
    toy_id: &str,
) -> Response<BoxBody> {
    if let Err(resp) = require_admin(state, req) {
        return *resp;
    }

    match state.toys.remove(toy_id).await {
        Ok(removed) => json_response(StatusCode::OK, &RemovedBody { removed }),
        Err(e) => error_response(e, "Failed to remove toy"),
    }
}

async fn add_toy_msg(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
    toy_id: &str,
) -> Response<BoxBody> {
    let user = match require_auth(&state, &req) {
        Ok(user) => user,
        Err(resp) => return *resp,
    };

    let body: MsgBody = match parse_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(e, "Failed to add toy msg"),
    };

    if body.txt.trim().is_empty() {
        return error_response(
            crate::types::ToyshopError::Http("msg txt is required".into()),
            "Failed to add toy msg",
        );
    }

    match state.toys.add_msg(toy_id, body.txt, &user).await {
        Ok(msg) => json_response(StatusCode::CREATED, &msg),
        Err(e) => error_response(e, "Failed to add toy msg"),
    }
}

async fn remove_toy_msg(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
    toy_id: &str,
    msg_id: &str,
) -> Response<BoxBody> {
    if let Err(resp) = require_auth(state, req) {
        return *resp;
    }

    match state.toys.remove_msg(toy_id, msg_id).await {
        Ok(removed_id) => json_response(StatusCode::OK, &serde_json::json!({ "msgId": removed_id })),
        Err(e) => error_response(e, "Failed to remove toy msg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn test_toy_response_wire_shape() {
        let oid = ObjectId::new();
        let toy = ToyDoc {
            id: Some(oid),
            name: "Talking Elmo".into(),
            img_url: "elmo.png".into(),
            price: 49.9,
            labels: vec!["doll".into()],
            in_stock: true,
            created_at: 1_700_000_000_000,
            msgs: vec![],
        };

        let json = serde_json::to_value(ToyResponse::from(toy)).unwrap();
        // Hex string id, never the {"$oid": ...} extended-JSON form
        assert_eq!(json["_id"], serde_json::json!(oid.to_hex()));
        assert_eq!(json["imgUrl"], "elmo.png");
        assert_eq!(json["inStock"], true);
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
    }
}
