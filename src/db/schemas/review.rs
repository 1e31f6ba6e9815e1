//! Review document schema and its denormalized read view

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for reviews
pub const REVIEW_COLLECTION: &str = "review";

/// Review document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub txt: String,

    /// Referenced toy
    pub toy_id: ObjectId,

    /// Authoring user
    pub user_id: ObjectId,

    /// Epoch milliseconds
    pub created_at: i64,
}

/// Denormalized review as produced by the aggregation pipeline.
///
/// Reviews whose referenced user or toy no longer exists do not appear
/// (inner-join semantics of `$unwind`).
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub txt: String,

    pub created_at: i64,

    pub user: ReviewUserRef,

    pub toy: ReviewToyRef,
}

/// Reduced user projection embedded in the read view
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReviewUserRef {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(default)]
    pub fullname: String,
}

/// Reduced toy projection embedded in the read view
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReviewToyRef {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,

    #[serde(default)]
    pub price: f64,
}

impl IntoIndexes for ReviewDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "toyId": 1 },
                Some(IndexOptions::builder().name("toy_id_index".to_string()).build()),
            ),
            (
                doc! { "userId": 1 },
                Some(IndexOptions::builder().name("user_id_index".to_string()).build()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_pipeline_document() {
        let doc = doc! {
            "_id": ObjectId::new(),
            "txt": "my kid loves it",
            "createdAt": 1_700_000_000_000_i64,
            "user": { "_id": ObjectId::new(), "fullname": "Puki Ben David" },
            "toy": { "_id": ObjectId::new(), "name": "Talking Elmo", "price": 49.9 },
        };

        let view: ReviewView = bson::from_document(doc).unwrap();
        assert_eq!(view.user.fullname, "Puki Ben David");
        assert_eq!(view.toy.price, 49.9);
    }
}
