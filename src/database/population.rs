use bson::{doc, oid::ObjectId, Document};

use crate::database::store::Page;

/// Which reports to assemble
#[derive(Debug, Clone, PartialEq)]
pub enum ReportFilter {
    All,
    Id(ObjectId),
    Name(String),
    Company(ObjectId),
    Companies(Vec<ObjectId>),
    ReportType(ObjectId),
    UserAccess(ObjectId),
    CreatedBy(ObjectId),
}

impl ReportFilter {
    /// `$match` predicate over the raw `reports` collection
    pub fn to_match(&self) -> Document {
        match self {
            ReportFilter::All => doc! {},
            ReportFilter::Id(id) => doc! { "_id": id },
            ReportFilter::Name(name) => doc! { "reportName": name },
            ReportFilter::Company(id) => doc! { "company": id },
            ReportFilter::Companies(ids) => doc! { "company": { "$in": ids.clone() } },
            ReportFilter::ReportType(id) => doc! { "reportType": id },
            // matches array membership
            ReportFilter::UserAccess(id) => doc! { "userAccess": id },
            ReportFilter::CreatedBy(id) => doc! { "createdBy": id },
        }
    }
}

const COMPANY_PROJECTION: &[&str] = &["_id", "name", "profilePicture", "createdAt", "updatedAt"];
const REPORT_TYPE_PROJECTION: &[&str] = &["_id", "name"];
const USER_PROJECTION: &[&str] = &["_id", "name", "email", "role", "createdAt", "updatedAt"];

fn projection(fields: &[&str]) -> Document {
    fields.iter().map(|f| (f.to_string(), 1.into())).collect()
}

fn lookup(from: &str, local_field: &str, fields: &[&str]) -> Document {
    doc! {
        "$lookup": {
            "from": from,
            "localField": local_field,
            "foreignField": "_id",
            "as": local_field,
            "pipeline": [ { "$project": projection(fields) } ],
        }
    }
}

/// Stages that replace the four references with their projected documents.
///
/// Single references come back from `$lookup` as zero-or-one element arrays and are
/// flattened with `$arrayElemAt`, so a dangling reference leaves the field absent.
pub fn population_stages() -> Vec<Document> {
    vec![
        lookup("companies", "company", COMPANY_PROJECTION),
        lookup("reporttypes", "reportType", REPORT_TYPE_PROJECTION),
        lookup("users", "createdBy", USER_PROJECTION),
        lookup("users", "userAccess", USER_PROJECTION),
        doc! {
            "$project": {
                "_id": 1,
                "reportName": 1,
                "year": 1,
                "currency": 1,
                "reportData": 1,
                "userAccess": 1,
                "createdAt": 1,
                "updatedAt": 1,
                "company": { "$arrayElemAt": ["$company", 0] },
                "reportType": { "$arrayElemAt": ["$reportType", 0] },
                "createdBy": { "$arrayElemAt": ["$createdBy", 0] },
            }
        },
    ]
}

/// The single aggregation that filters, optionally pages, and joins reports
pub fn report_pipeline(filter: &ReportFilter, page: Option<Page>) -> Vec<Document> {
    let mut pipeline = vec![doc! { "$match": filter.to_match() }];
    if let Some(page) = page {
        // page before joining so only the returned window is looked up
        pipeline.push(doc! { "$sort": { "createdAt": -1, "_id": -1 } });
        pipeline.push(doc! { "$skip": page.skip as i64 });
        pipeline.push(doc! { "$limit": page.limit });
    }
    pipeline.extend(population_stages());
    pipeline
}
