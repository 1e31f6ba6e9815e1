//! User HTTP endpoints
//!
//! - `GET /api/user`      list users
//! - `GET /api/user/{id}` fetch one user
//!
//! Both respond with the public projection only.

use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use crate::routes::{
    error_response, json_response, method_not_allowed, not_found, BoxBody, UserResponse,
};
use crate::server::AppState;

pub async fn handle_user_request(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();

    let rest = path.strip_prefix("/api/user").unwrap_or("");
    let segments: Vec<String> = rest
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    match (method, segments.as_slice()) {
        (Method::GET, []) => list_users(&state).await,
        (Method::GET, [user_id]) => get_user(&state, user_id).await,
        (Method::GET, _) => not_found(&path),
        _ => method_not_allowed(),
    }
}

async fn list_users(state: &AppState) -> Response<BoxBody> {
    match state.users.query().await {
        Ok(users) => {
            let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            json_response(StatusCode::OK, &body)
        }
        Err(e) => error_response(e, "Failed to get users"),
    }
}

async fn get_user(state: &AppState, user_id: &str) -> Response<BoxBody> {
    match state.users.get_by_id(user_id).await {
        Ok(user) => json_response(StatusCode::OK, &UserResponse::from(user)),
        Err(e) => error_response(e, "Failed to get user"),
    }
}

#[cfg(test)]
mod tests {
    use crate::db::schemas::UserDoc;
    use crate::routes::UserResponse;
    use bson::oid::ObjectId;

    #[test]
    fn test_password_hash_never_serialized() {
        let user = UserDoc {
            id: Some(ObjectId::new()),
            username: "puki".into(),
            password_hash: "$argon2id$secret".into(),
            fullname: "Puki Ben David".into(),
            is_admin: false,
            score: 100,
        };

        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"username\":\"puki\""));
        assert!(json.contains("\"isAdmin\":false"));
    }
}
