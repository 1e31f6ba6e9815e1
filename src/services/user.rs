//! User service

use bson::doc;
use tracing::{error, info};

use crate::auth::hash_password;
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::types::{Result, ToyshopError};

/// User service over the `user` collection
#[derive(Clone)]
pub struct UserService {
    col: MongoCollection<UserDoc>,
}

impl UserService {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            col: mongo.collection(USER_COLLECTION).await?,
        })
    }

    pub async fn query(&self) -> Result<Vec<UserDoc>> {
        self.col.find_many(doc! {}, Some(doc! { "username": 1 })).await
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<UserDoc> {
        let oid = parse_object_id(user_id)?;
        self.col
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ToyshopError::NotFound(format!("user {}", user_id)))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserDoc>> {
        self.col.find_one(doc! { "username": username }).await
    }

    /// Create a user. The username must be free.
    pub async fn add(&self, mut user: UserDoc) -> Result<UserDoc> {
        if self.get_by_username(&user.username).await?.is_some() {
            return Err(ToyshopError::Conflict(format!(
                "username '{}' already taken",
                user.username
            )));
        }

        let id = self.col.insert_one(&user).await.map_err(|e| {
            error!("cannot insert user: {}", e);
            e
        })?;
        user.id = Some(id);
        Ok(user)
    }

    pub async fn remove(&self, user_id: &str) -> Result<u64> {
        let oid = parse_object_id(user_id)?;
        self.col.delete_one(doc! { "_id": oid }).await
    }

    /// Upsert the admin account so a fresh database always has one.
    pub async fn ensure_admin(&self, password: &str) -> Result<()> {
        let hash = hash_password(password)?;
        self.col
            .upsert_one(
                doc! { "username": "admin" },
                doc! { "$set": {
                    "username": "admin",
                    "password": hash,
                    "fullname": "Admin",
                    "isAdmin": true,
                    "score": 0_i64,
                }},
            )
            .await?;
        info!("Admin account ensured");
        Ok(())
    }
}
