use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use mongodb::{options::FindOptions, Database};

use crate::database::manager::USERS;
use crate::database::models::{User, UserChanges};
use crate::database::repository::Repository;
use crate::database::store::UserStore;
use crate::error::ApiError;

pub struct MongoUserStore {
    repo: Repository<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db, USERS),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: &User) -> Result<(), ApiError> {
        self.repo
            .insert(user)
            .await
            .map_err(|e| e.or_conflict("USER_ALREADY_EXISTS", "Email already registered"))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, ApiError> {
        Ok(self.repo.select_by_id(id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.repo.select_one(doc! { "email": email }).await?)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, ApiError> {
        Ok(self.repo.select_ids(ids).await?)
    }

    async fn find_all(&self) -> Result<Vec<User>, ApiError> {
        let options = FindOptions::builder()
            .projection(doc! { "password": 0, "resetPasswordToken": 0 })
            .sort(doc! { "createdAt": -1 })
            .build();
        Ok(self.repo.select_any(doc! {}, options).await?)
    }

    async fn find_by_reset_token(&self, token: &str, now: DateTime) -> Result<Option<User>, ApiError> {
        Ok(self
            .repo
            .select_one(doc! {
                "resetPasswordToken": token,
                "resetPasswordExpires": { "$gt": now },
            })
            .await?)
    }

    async fn update_profile(&self, id: ObjectId, changes: &UserChanges) -> Result<bool, ApiError> {
        let update = doc! {
            "$set": {
                "name": changes.name.as_str(),
                "email": changes.email.as_str(),
                "role": changes.role.as_str(),
                "company": changes.company.clone(),
                "updatedAt": DateTime::now(),
            }
        };
        self.repo
            .update_by_id(id, update)
            .await
            .map_err(|e| e.or_conflict("EMAIL_ALREADY_EXISTS", "Email already used by another user"))
    }

    async fn set_password(&self, id: ObjectId, password_hash: &str) -> Result<bool, ApiError> {
        let update = doc! {
            "$set": { "password": password_hash, "updatedAt": DateTime::now() },
            "$unset": { "resetPasswordToken": "", "resetPasswordExpires": "" },
        };
        Ok(self.repo.update_by_id(id, update).await?)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        Ok(self.repo.delete_by_id(id).await?)
    }
}
