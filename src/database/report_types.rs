use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::{options::FindOptions, Database};

use crate::database::manager::REPORT_TYPES;
use crate::database::models::ReportType;
use crate::database::repository::Repository;
use crate::database::store::ReportTypeStore;
use crate::error::ApiError;

const CONFLICT_CODE: &str = "REPORT_TYPE_ALREADY_EXISTS";
const CONFLICT_MESSAGE: &str = "Report type name already exists";

pub struct MongoReportTypeStore {
    repo: Repository<ReportType>,
}

impl MongoReportTypeStore {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db, REPORT_TYPES),
        }
    }
}

#[async_trait]
impl ReportTypeStore for MongoReportTypeStore {
    async fn insert(&self, report_type: &ReportType) -> Result<(), ApiError> {
        self.repo
            .insert(report_type)
            .await
            .map_err(|e| e.or_conflict(CONFLICT_CODE, CONFLICT_MESSAGE))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<ReportType>, ApiError> {
        Ok(self.repo.select_by_id(id).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ReportType>, ApiError> {
        Ok(self.repo.select_one(doc! { "name": name }).await?)
    }

    async fn find_all(&self) -> Result<Vec<ReportType>, ApiError> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        Ok(self.repo.select_any(doc! {}, options).await?)
    }

    async fn update(&self, report_type: &ReportType) -> Result<bool, ApiError> {
        self.repo
            .update_by_id(report_type.id, doc! { "$set": { "name": report_type.name.as_str() } })
            .await
            .map_err(|e| e.or_conflict(CONFLICT_CODE, CONFLICT_MESSAGE))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        Ok(self.repo.delete_by_id(id).await?)
    }
}
