//! Toy document schema
//!
//! A toy owns its message sequence by value; messages have no lifecycle of
//! their own and are appended/removed through the toy's update path.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for toys
pub const TOY_COLLECTION: &str = "toy";

/// Toy document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ToyDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    #[serde(default)]
    pub img_url: String,

    /// Always non-negative; coerced on the way in, never stored negative
    #[serde(default)]
    pub price: f64,

    /// Label tags, matched by set intersection in queries
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub in_stock: bool,

    /// Creation time in epoch milliseconds
    pub created_at: i64,

    /// Embedded messages, ordered by append
    #[serde(default)]
    pub msgs: Vec<ToyMsg>,
}

/// Message embedded in a toy
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ToyMsg {
    /// Opaque generated token, unique within the toy's msgs sequence
    pub id: String,

    pub txt: String,

    /// Authoring user id (hex)
    pub by: String,

    /// Denormalized snapshot of the author's fullname at write time
    #[serde(default)]
    pub fullname: String,

    /// Epoch milliseconds
    pub created_at: i64,
}

impl IntoIndexes for ToyDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Default sort field
            (
                doc! { "name": 1 },
                Some(IndexOptions::builder().name("name_index".to_string()).build()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bson_field_names() {
        let toy = ToyDoc {
            id: None,
            name: "Talking Elmo".into(),
            img_url: "http://example.com/elmo.png".into(),
            price: 49.9,
            labels: vec!["doll".into(), "battery powered".into()],
            in_stock: true,
            created_at: 1_700_000_000_000,
            msgs: vec![],
        };

        let doc = bson::to_document(&toy).unwrap();
        assert!(doc.contains_key("imgUrl"));
        assert!(doc.contains_key("inStock"));
        assert!(doc.contains_key("createdAt"));
        // Absent _id must not be serialized as null
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn test_defaults_on_sparse_document() {
        let doc = doc! { "name": "Yoyo", "createdAt": 0_i64 };
        let toy: ToyDoc = bson::from_document(doc).unwrap();
        assert_eq!(toy.price, 0.0);
        assert!(toy.labels.is_empty());
        assert!(!toy.in_stock);
        assert!(toy.msgs.is_empty());
    }
}
