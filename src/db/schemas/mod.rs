//! Database schemas
//!
//! Defines MongoDB document structures for toys, reviews, and users.

mod review;
mod toy;
mod user;

pub use review::{ReviewDoc, ReviewToyRef, ReviewUserRef, ReviewView, REVIEW_COLLECTION};
pub use toy::{ToyDoc, ToyMsg, TOY_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
