//! HTTP routes
//!
//! Handlers follow a uniform shape: parse/authenticate at the boundary, call
//! the service, and map the result to JSON. Failures collapse to a generic
//! message per status class; internal detail stays in the logs.

pub mod auth_routes;
pub mod health;
pub mod review_routes;
pub mod toy_routes;
pub mod user_routes;

pub use auth_routes::handle_auth_request;
pub use health::health_check;
pub use review_routes::handle_review_request;
pub use toy_routes::handle_toy_request;
pub use user_routes::handle_user_request;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::auth::{extract_token_from_header, LoggedInUser};
use crate::db::schemas::UserDoc;
use crate::server::AppState;
use crate::types::ToyshopError;

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error body matching the frontend contract
#[derive(Debug, Serialize)]
pub(crate) struct ErrBody {
    pub err: String,
}

/// Public user projection; the password hash never crosses the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub fullname: String,
    pub is_admin: bool,
    pub score: i64,
}

impl From<UserDoc> for UserResponse {
    fn from(user: UserDoc) -> Self {
        Self {
            id: user.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            username: user.username,
            fullname: user.fullname,
            is_admin: user.is_admin,
            score: user.score,
        }
    }
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Map a service error to its boundary response. The generic `public`
/// message is what 500-class failures leak; everything else gets a fixed
/// phrase per status class.
pub(crate) fn error_response(err: ToyshopError, public: &str) -> Response<BoxBody> {
    let status = err.status_code();
    let message = match status {
        StatusCode::NOT_FOUND => "Not found".to_string(),
        StatusCode::FORBIDDEN => "Not allowed".to_string(),
        StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
        StatusCode::CONFLICT => err.to_string(),
        StatusCode::BAD_REQUEST => err.to_string(),
        _ => {
            error!("{}: {}", public, err);
            public.to_string()
        }
    };

    json_response(status, &ErrBody { err: message })
}

pub(crate) fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub(crate) fn not_found(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrBody {
            err: format!("No route for {}", path),
        },
    )
}

pub(crate) fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrBody {
            err: "Method not allowed".into(),
        },
    )
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, ToyshopError> {
    let body = req
        .collect()
        .await
        .map_err(|e| ToyshopError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(ToyshopError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| ToyshopError::Http(format!("Invalid JSON: {}", e)))
}

/// Resolve the authenticated caller from the Authorization header, if any.
pub(crate) fn logged_in_user(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
) -> Option<LoggedInUser> {
    let header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    let token = extract_token_from_header(header)?;
    state.jwt.verify_token(token).ok().map(LoggedInUser::from)
}

/// Require an authenticated caller, or produce the 401 response.
pub(crate) fn require_auth(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
) -> Result<LoggedInUser, Box<Response<BoxBody>>> {
    logged_in_user(state, req).ok_or_else(|| {
        Box::new(json_response(
            StatusCode::UNAUTHORIZED,
            &ErrBody {
                err: "Login required".into(),
            },
        ))
    })
}

/// Require an admin caller, or produce the 401/403 response.
pub(crate) fn require_admin(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
) -> Result<LoggedInUser, Box<Response<BoxBody>>> {
    let user = require_auth(state, req)?;
    if !user.is_admin {
        return Err(Box::new(json_response(
            StatusCode::FORBIDDEN,
            &ErrBody {
                err: "Not allowed".into(),
            },
        )));
    }
    Ok(user)
}
