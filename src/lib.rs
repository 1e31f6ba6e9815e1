//! Toyshop - toy catalog backend
//!
//! REST API over MongoDB with JWT authentication, plus a WebSocket chat
//! relay for per-room messaging.
//!
//! ## Services
//!
//! - **Toys**: catalog CRUD with filtering, sorting, and embedded messages
//! - **Reviews**: user reviews joined to their author and toy at read time
//! - **Users**: public user listing backing the review views
//! - **Auth**: signup/login with Argon2 hashes and HS256 bearer tokens
//! - **Chat**: in-memory room relay, nothing persisted

pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, ToyshopError};
