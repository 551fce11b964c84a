use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::Database;

use crate::database::manager::{DatabaseError, REPORTS};
use crate::database::models::{PopulatedReport, Report};
use crate::database::population::{report_pipeline, ReportFilter};
use crate::database::repository::Repository;
use crate::database::store::{Page, ReportStore};
use crate::error::ApiError;

pub struct MongoReportStore {
    repo: Repository<Report>,
}

impl MongoReportStore {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db, REPORTS),
        }
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<PopulatedReport>, DatabaseError> {
        let cursor = self.repo.raw().aggregate(pipeline, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(|d| bson::from_document::<PopulatedReport>(d).map_err(DatabaseError::from))
            .collect()
    }
}

#[async_trait]
impl ReportStore for MongoReportStore {
    async fn insert(&self, report: &Report) -> Result<(), ApiError> {
        Ok(self.repo.insert(report).await?)
    }

    async fn find_raw(&self, id: ObjectId) -> Result<Option<Report>, ApiError> {
        Ok(self.repo.select_by_id(id).await?)
    }

    async fn update(&self, report: &Report) -> Result<bool, ApiError> {
        let update = doc! {
            "$set": {
                "reportName": report.report_name.as_str(),
                "reportType": report.report_type,
                "year": report.year.as_str(),
                "company": report.company,
                "currency": report.currency.clone(),
                "createdBy": report.created_by,
                "userAccess": report.user_access.clone(),
                "reportData": report.report_data.clone(),
                "updatedAt": report.updated_at,
            }
        };
        Ok(self.repo.update_by_id(report.id, update).await?)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        Ok(self.repo.delete_by_id(id).await?)
    }

    async fn find_populated(
        &self,
        filter: &ReportFilter,
        page: Option<Page>,
    ) -> Result<Vec<PopulatedReport>, ApiError> {
        Ok(self.aggregate(report_pipeline(filter, page)).await?)
    }

    async fn count(&self, filter: &ReportFilter) -> Result<u64, ApiError> {
        Ok(self.repo.count(filter.to_match()).await?)
    }
}
