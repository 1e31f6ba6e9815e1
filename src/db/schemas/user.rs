//! User document schema
//!
//! Users are referenced (never embedded) by reviews and toy messages.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for users
pub const USER_COLLECTION: &str = "user";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Unique login name
    pub username: String,

    /// Argon2 password hash (PHC string); never serialized to clients
    #[serde(rename = "password")]
    pub password_hash: String,

    #[serde(default)]
    pub fullname: String,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default)]
    pub score: i64,
}

impl UserDoc {
    pub fn new(username: String, password_hash: String, fullname: String) -> Self {
        Self {
            id: None,
            username,
            password_hash,
            fullname,
            is_admin: false,
            score: 0,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "username": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("username_unique".to_string())
                    .build(),
            ),
        )]
    }
}
