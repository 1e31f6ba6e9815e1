//! CRUD services and the filter/query builder
//!
//! Services are constructed with injected collection handles at startup and
//! invoked by the route layer with an already-authenticated caller identity.

pub mod auth;
pub mod filter;
pub mod review;
pub mod toy;
pub mod user;

pub use auth::AuthService;
pub use filter::{ReviewQuery, ToyQuery};
pub use review::ReviewService;
pub use toy::{ToyInput, ToyService};
pub use user::UserService;
