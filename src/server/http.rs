//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is a single
//! method/path match; the chat endpoint upgrades the connection in place.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::JwtValidator;
use crate::chat::{self, RoomStore};
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes;
use crate::services::{AuthService, ReviewService, ToyService, UserService};
use crate::types::{Result, ToyshopError};

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    pub toys: ToyService,
    pub reviews: ReviewService,
    pub users: UserService,
    pub auth: AuthService,
    /// Chat relay room membership
    pub chat: Arc<RoomStore>,
}

impl AppState {
    /// Build the services against an already-connected MongoDB client.
    pub async fn new(args: Args, mongo: &MongoClient) -> Result<Self> {
        let secret = args.jwt_secret().map_err(ToyshopError::Config)?;
        let jwt = JwtValidator::new(&secret, args.jwt_expiry_seconds);

        let toys = ToyService::new(mongo).await?;
        let reviews = ReviewService::new(mongo).await?;
        let users = UserService::new(mongo).await?;
        let auth = AuthService::new(users.clone());

        Ok(Self {
            args,
            jwt,
            toys,
            reviews,
            users,
            auth,
            chat: Arc::new(RoomStore::new()),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Toyshop listening on {}", state.args.listen);
    info!("Chat relay enabled at /api/chat/ws");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .with_upgrades()
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // CORS preflight
        (Method::OPTIONS, _) => routes::cors_preflight(),

        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),

        // Chat relay WebSocket
        (Method::GET, "/api/chat/ws") => {
            if hyper_tungstenite::is_upgrade_request(&req) {
                to_boxed(chat::handle_chat_upgrade(Arc::clone(&state.chat), req).await)
            } else {
                routes::json_response(
                    hyper::StatusCode::BAD_REQUEST,
                    &serde_json::json!({ "err": "WebSocket upgrade required for /api/chat/ws" }),
                )
            }
        }

        (_, p) if p.starts_with("/api/auth") => routes::handle_auth_request(state, req).await,
        (_, p) if p.starts_with("/api/toy") => routes::handle_toy_request(state, req).await,
        (_, p) if p.starts_with("/api/review") => routes::handle_review_request(state, req).await,
        (_, p) if p.starts_with("/api/user") => routes::handle_user_request(state, req).await,

        _ => routes::not_found(&path),
    };

    Ok(response)
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
