//! Authentication HTTP endpoints
//!
//! - `POST /api/auth/signup` create an account, respond with user + token
//! - `POST /api/auth/login`  verify credentials, respond with user + token
//! - `POST /api/auth/logout` stateless acknowledgement; clients drop the token

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::UserDoc;
use crate::routes::{
    error_response, json_response, method_not_allowed, not_found, parse_json_body, BoxBody,
    UserResponse,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct SignupBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    fullname: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    user: UserResponse,
    token: String,
    /// Token expiry, epoch seconds
    expires_at: u64,
}

pub async fn handle_auth_request(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();

    match (method, path.as_str()) {
        (Method::POST, "/api/auth/signup") => signup(state, req).await,
        (Method::POST, "/api/auth/login") => login(state, req).await,
        (Method::POST, "/api/auth/logout") => logout(),
        (Method::POST, _) => not_found(&path),
        _ => method_not_allowed(),
    }
}

async fn signup(state: Arc<AppState>, req: Request<hyper::body::Incoming>) -> Response<BoxBody> {
    let body: SignupBody = match parse_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(e, "Failed to signup"),
    };

    let user = match state
        .auth
        .signup(&body.username, &body.password, &body.fullname)
        .await
    {
        Ok(user) => user,
        Err(e) => return error_response(e, "Failed to signup"),
    };

    session_response(&state, user, StatusCode::CREATED)
}

async fn login(state: Arc<AppState>, req: Request<hyper::body::Incoming>) -> Response<BoxBody> {
    let body: LoginBody = match parse_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(e, "Failed to login"),
    };

    let user = match state.auth.login(&body.username, &body.password).await {
        Ok(user) => user,
        Err(e) => return error_response(e, "Failed to login"),
    };

    info!("User logged in: {}", user.username);
    session_response(&state, user, StatusCode::OK)
}

fn logout() -> Response<BoxBody> {
    // Tokens are stateless; there is nothing to invalidate server-side
    json_response(StatusCode::OK, &serde_json::json!({ "msg": "logged out" }))
}

fn session_response(state: &AppState, user: UserDoc, status: StatusCode) -> Response<BoxBody> {
    match state.jwt.generate_token(&user) {
        Ok((token, expires_at)) => json_response(
            status,
            &SessionResponse {
                user: UserResponse::from(user),
                token,
                expires_at,
            },
        ),
        Err(e) => error_response(e, "Failed to issue token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn test_session_response_wire_shape() {
        let user = UserDoc {
            id: Some(ObjectId::new()),
            username: "puki".into(),
            password_hash: "$argon2id$secret".into(),
            fullname: "Puki Ben David".into(),
            is_admin: false,
            score: 100,
        };

        let session = SessionResponse {
            user: UserResponse::from(user),
            token: "abc.def.ghi".into(),
            expires_at: 1_700_000_000,
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["token"], "abc.def.ghi");
        assert_eq!(json["expiresAt"], 1_700_000_000_u64);
        assert_eq!(json["user"]["username"], "puki");
        assert!(json["user"].get("password").is_none());
    }

    #[test]
    fn test_bodies_tolerate_missing_fields() {
        let body: SignupBody = serde_json::from_str("{}").unwrap();
        assert!(body.username.is_empty());
        assert!(body.password.is_empty());
        assert!(body.fullname.is_empty());

        let body: LoginBody = serde_json::from_str(r#"{"username":"puki"}"#).unwrap();
        assert_eq!(body.username, "puki");
        assert!(body.password.is_empty());
    }
}
