//! Review CRUD service and the denormalized read-view pipeline

use bson::{doc, Document};
use chrono::Utc;
use tracing::error;

use crate::auth::LoggedInUser;
use crate::db::schemas::{ReviewDoc, ReviewView, REVIEW_COLLECTION, TOY_COLLECTION, USER_COLLECTION};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::services::filter::ReviewQuery;
use crate::types::{Result, ToyshopError};

/// Review service over the `review` collection
#[derive(Clone)]
pub struct ReviewService {
    col: MongoCollection<ReviewDoc>,
}

/// Aggregation pipeline joining each review to its user and toy.
///
/// `$unwind` without preserveNullAndEmptyArrays drops reviews whose
/// referenced user or toy is missing - orphans are silently excluded.
pub(crate) fn build_pipeline(filter: &ReviewQuery) -> Vec<Document> {
    vec![
        doc! { "$match": filter.criteria() },
        doc! { "$lookup": {
            "from": USER_COLLECTION,
            "localField": "userId",
            "foreignField": "_id",
            "as": "user",
        }},
        doc! { "$unwind": "$user" },
        doc! { "$lookup": {
            "from": TOY_COLLECTION,
            "localField": "toyId",
            "foreignField": "_id",
            "as": "toy",
        }},
        doc! { "$unwind": "$toy" },
        doc! { "$project": {
            "txt": 1,
            "createdAt": 1,
            "user._id": 1,
            "user.fullname": 1,
            "toy._id": 1,
            "toy.name": 1,
            "toy.price": 1,
        }},
    ]
}

impl ReviewService {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            col: mongo.collection(REVIEW_COLLECTION).await?,
        })
    }

    /// List reviews as denormalized views. No sort option; ordering beyond
    /// the underlying collection order is not guaranteed.
    pub async fn query(&self, filter: &ReviewQuery) -> Result<Vec<ReviewView>> {
        let docs = self.col.aggregate(build_pipeline(filter)).await.map_err(|e| {
            error!("cannot find reviews: {}", e);
            e
        })?;

        let mut views = Vec::with_capacity(docs.len());
        for doc in docs {
            match bson::from_document::<ReviewView>(doc) {
                Ok(view) => views.push(view),
                Err(e) => error!("skipping malformed review view: {}", e),
            }
        }
        Ok(views)
    }

    /// Add a review for a toy on behalf of the authenticated user.
    pub async fn add(&self, txt: String, toy_id: &str, user: &LoggedInUser) -> Result<ReviewDoc> {
        let toy_oid = parse_object_id(toy_id)?;
        let user_oid = parse_object_id(&user.id)?;

        let mut review = ReviewDoc {
            id: None,
            txt,
            toy_id: toy_oid,
            user_id: user_oid,
            created_at: Utc::now().timestamp_millis(),
        };

        let id = self.col.insert_one(&review).await.map_err(|e| {
            error!("cannot insert review: {}", e);
            e
        })?;
        review.id = Some(id);
        Ok(review)
    }

    /// Delete a review. Allowed iff the requester owns it or is an admin.
    ///
    /// Returns the deleted count: a review that is already gone (including
    /// one lost to a concurrent delete) yields 0, which is success-but-no-op.
    pub async fn remove(&self, review_id: &str, requester: &LoggedInUser) -> Result<u64> {
        let oid = parse_object_id(review_id)?;

        let Some(review) = self.col.find_one(doc! { "_id": oid }).await? else {
            return Ok(0);
        };

        if !may_remove(requester, &review.user_id) {
            return Err(ToyshopError::Forbidden(format!(
                "user {} may not remove review {}",
                requester.id, review_id
            )));
        }

        self.col.delete_one(doc! { "_id": oid }).await
    }
}

/// Whether the requester may delete a review owned by `owner`.
fn may_remove(requester: &LoggedInUser, owner: &bson::oid::ObjectId) -> bool {
    requester.is_admin || requester.id == owner.to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    fn requester(id: &ObjectId, is_admin: bool) -> LoggedInUser {
        LoggedInUser {
            id: id.to_hex(),
            username: "puki".into(),
            fullname: "Puki Ben David".into(),
            is_admin,
        }
    }

    #[test]
    fn test_owner_may_remove_own_review() {
        let owner = ObjectId::new();
        assert!(may_remove(&requester(&owner, false), &owner));
    }

    #[test]
    fn test_non_owner_non_admin_may_not_remove() {
        let owner = ObjectId::new();
        let other = ObjectId::new();
        assert!(!may_remove(&requester(&other, false), &owner));
    }

    #[test]
    fn test_admin_may_remove_any_review() {
        let owner = ObjectId::new();
        let other = ObjectId::new();
        assert!(may_remove(&requester(&other, true), &owner));
    }

    #[test]
    fn test_pipeline_shape() {
        let pipeline = build_pipeline(&ReviewQuery::default());
        assert_eq!(pipeline.len(), 6);

        // Unconstrained filter matches everything
        assert!(pipeline[0].get_document("$match").unwrap().is_empty());

        let user_lookup = pipeline[1].get_document("$lookup").unwrap();
        assert_eq!(user_lookup.get_str("from"), Ok("user"));
        assert_eq!(user_lookup.get_str("localField"), Ok("userId"));

        // Plain $unwind stages: inner-join semantics, orphans dropped
        assert_eq!(pipeline[2].get_str("$unwind"), Ok("$user"));
        assert_eq!(pipeline[4].get_str("$unwind"), Ok("$toy"));

        let toy_lookup = pipeline[3].get_document("$lookup").unwrap();
        assert_eq!(toy_lookup.get_str("from"), Ok("toy"));

        let project = pipeline[5].get_document("$project").unwrap();
        for field in ["txt", "createdAt", "user._id", "user.fullname", "toy._id", "toy.name", "toy.price"] {
            assert_eq!(project.get_i32(field), Ok(1), "missing projection for {field}");
        }
    }

    #[test]
    fn test_pipeline_match_carries_reference_filter() {
        let oid = ObjectId::new();
        let filter = ReviewQuery {
            toy_id: Some(oid.to_hex()),
            ..Default::default()
        };
        let pipeline = build_pipeline(&filter);
        assert_eq!(
            pipeline[0].get_document("$match").unwrap().get_object_id("toyId"),
            Ok(oid)
        );
    }
}
