//! Toy CRUD service

use bson::doc;
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::auth::LoggedInUser;
use crate::db::schemas::{ToyDoc, ToyMsg, TOY_COLLECTION};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::services::filter::ToyQuery;
use crate::types::{Result, ToyshopError};

/// Validated toy input for add/update.
///
/// Missing optional fields are defaulted and the price is coerced
/// non-negative; a malformed body never reaches the store as-is.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToyInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    /// Optional seed messages, honored on add only
    #[serde(default)]
    pub msgs: Option<Vec<ToyMsg>>,
}

impl ToyInput {
    fn sanitized_price(&self) -> f64 {
        match self.price {
            Some(p) if p.is_finite() && p > 0.0 => p,
            _ => 0.0,
        }
    }

    /// Build the document to insert, defaulting absent fields.
    fn to_doc(&self, created_at: i64) -> ToyDoc {
        ToyDoc {
            id: None,
            name: self.name.clone(),
            img_url: self.img_url.clone(),
            price: self.sanitized_price(),
            labels: self.labels.clone().unwrap_or_default(),
            in_stock: self.in_stock.unwrap_or(false),
            created_at,
            msgs: self.msgs.clone().unwrap_or_default(),
        }
    }
}

/// Toy service over the `toy` collection
#[derive(Clone)]
pub struct ToyService {
    col: MongoCollection<ToyDoc>,
}

impl ToyService {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            col: mongo.collection(TOY_COLLECTION).await?,
        })
    }

    /// List toys matching the filter, in the requested sort order.
    pub async fn query(&self, filter: &ToyQuery) -> Result<Vec<ToyDoc>> {
        self.col
            .find_many(filter.criteria(), Some(filter.sort()))
            .await
            .map_err(|e| {
                error!("cannot find toys: {}", e);
                e
            })
    }

    /// Fetch a single toy; a missing or unparseable id fails with NotFound.
    pub async fn get_by_id(&self, toy_id: &str) -> Result<ToyDoc> {
        let oid = parse_object_id(toy_id)?;
        self.col
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ToyshopError::NotFound(format!("toy {}", toy_id)))
    }

    pub async fn add(&self, input: ToyInput) -> Result<ToyDoc> {
        let mut toy = input.to_doc(Utc::now().timestamp_millis());

        let id = self.col.insert_one(&toy).await.map_err(|e| {
            error!("cannot insert toy: {}", e);
            e
        })?;
        toy.id = Some(id);
        Ok(toy)
    }

    /// Update the whitelisted fields only; `createdAt` and `msgs` are owned
    /// by their dedicated paths and never clobbered here.
    pub async fn update(&self, toy_id: &str, input: ToyInput) -> Result<ToyDoc> {
        let oid = parse_object_id(toy_id)?;

        let update = doc! {
            "$set": {
                "name": &input.name,
                "imgUrl": &input.img_url,
                "price": input.sanitized_price(),
                "labels": input.labels.clone().unwrap_or_default(),
                "inStock": input.in_stock.unwrap_or(false),
            }
        };

        self.col.update_one(doc! { "_id": oid }, update).await.map_err(|e| {
            error!("cannot update toy {}: {}", toy_id, e);
            e
        })?;

        self.get_by_id(toy_id).await
    }

    /// Delete a toy, returning the deleted count (0 when already gone).
    pub async fn remove(&self, toy_id: &str) -> Result<u64> {
        let oid = parse_object_id(toy_id)?;
        self.col.delete_one(doc! { "_id": oid }).await.map_err(|e| {
            error!("cannot remove toy {}: {}", toy_id, e);
            e
        })
    }

    /// Append a message to a toy's msgs sequence.
    pub async fn add_msg(&self, toy_id: &str, txt: String, by: &LoggedInUser) -> Result<ToyMsg> {
        let oid = parse_object_id(toy_id)?;

        let msg = ToyMsg {
            id: Uuid::new_v4().simple().to_string(),
            txt,
            by: by.id.clone(),
            fullname: by.fullname.clone(),
            created_at: Utc::now().timestamp_millis(),
        };

        let msg_bson = bson::to_bson(&msg)
            .map_err(|e| ToyshopError::Database(format!("Failed to encode msg: {}", e)))?;

        let result = self
            .col
            .update_one(doc! { "_id": oid }, doc! { "$push": { "msgs": msg_bson } })
            .await
            .map_err(|e| {
                error!("cannot add toy msg {}: {}", toy_id, e);
                e
            })?;

        if result.matched_count == 0 {
            return Err(ToyshopError::NotFound(format!("toy {}", toy_id)));
        }

        Ok(msg)
    }

    /// Remove a message by id. Removing an absent message id is a no-op.
    pub async fn remove_msg(&self, toy_id: &str, msg_id: &str) -> Result<String> {
        let oid = parse_object_id(toy_id)?;

        self.col
            .update_one(
                doc! { "_id": oid },
                doc! { "$pull": { "msgs": { "id": msg_id } } },
            )
            .await
            .map_err(|e| {
                error!("cannot remove toy msg {}: {}", toy_id, e);
                e
            })?;

        Ok(msg_id.to_string())
    }
}
