use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use mongodb::{options::FindOptions, Database};

use crate::database::manager::COMPANIES;
use crate::database::models::Company;
use crate::database::repository::{iequals, Repository};
use crate::database::store::CompanyStore;
use crate::error::ApiError;

const CONFLICT_CODE: &str = "COMPANY_ALREADY_EXISTS";
const CONFLICT_MESSAGE: &str = "Company name already exists";

pub struct MongoCompanyStore {
    repo: Repository<Company>,
}

impl MongoCompanyStore {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db, COMPANIES),
        }
    }
}

#[async_trait]
impl CompanyStore for MongoCompanyStore {
    async fn insert(&self, company: &Company) -> Result<(), ApiError> {
        self.repo
            .insert(company)
            .await
            .map_err(|e| e.or_conflict(CONFLICT_CODE, CONFLICT_MESSAGE))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, ApiError> {
        Ok(self.repo.select_by_id(id).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Company>, ApiError> {
        if let Some(company) = self.repo.select_one(doc! { "name": name }).await? {
            return Ok(Some(company));
        }
        Ok(self.repo.select_one(doc! { "name": iequals(name) }).await?)
    }

    async fn find_all(&self, limit: i64) -> Result<Vec<Company>, ApiError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .build();
        Ok(self.repo.select_any(doc! {}, options).await?)
    }

    async fn find_by_user(&self, user_id: ObjectId) -> Result<Vec<Company>, ApiError> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        Ok(self.repo.select_any(doc! { "user": user_id }, options).await?)
    }

    async fn update(&self, company: &Company) -> Result<bool, ApiError> {
        let mut set = doc! {
            "name": company.name.as_str(),
            "user": company.user.clone(),
            "updatedAt": DateTime::now(),
        };
        let mut update = doc! {};
        match &company.profile_picture {
            Some(picture) => {
                set.insert("profilePicture", picture.as_str());
            }
            None => {
                update.insert("$unset", doc! { "profilePicture": "" });
            }
        }
        update.insert("$set", set);

        self.repo
            .update_by_id(company.id, update)
            .await
            .map_err(|e| e.or_conflict(CONFLICT_CODE, CONFLICT_MESSAGE))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        Ok(self.repo.delete_by_id(id).await?)
    }
}
