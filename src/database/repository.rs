use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{options::FindOptions, Collection, Database};
use serde::{de::DeserializeOwned, Serialize};

use crate::database::manager::DatabaseError;

/// Typed wrapper over one collection with the queries every adapter shares
#[derive(Clone, Debug)]
pub struct Repository<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            collection: db.collection::<T>(name),
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    /// Untyped view of the same collection, for aggregations and raw updates
    pub fn raw(&self) -> Collection<Document> {
        self.collection.clone_with_type::<Document>()
    }

    pub async fn insert(&self, record: &T) -> Result<(), DatabaseError> {
        self.collection.insert_one(record, None).await?;
        Ok(())
    }

    pub async fn select_one(&self, filter: Document) -> Result<Option<T>, DatabaseError> {
        Ok(self.collection.find_one(filter, None).await?)
    }

    pub async fn select_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError> {
        self.select_one(doc! { "_id": id }).await
    }

    pub async fn select_any(
        &self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> Result<Vec<T>, DatabaseError> {
        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect::<Vec<T>>().await?)
    }

    pub async fn select_ids(&self, ids: &[ObjectId]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select_any(doc! { "_id": { "$in": ids.to_vec() } }, None).await
    }

    /// `$set` the given fields on one document; false when nothing matched
    pub async fn update_by_id(&self, id: ObjectId, update: Document) -> Result<bool, DatabaseError> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, update, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> Result<bool, DatabaseError> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn count(&self, filter: Document) -> Result<u64, DatabaseError> {
        Ok(self.collection.count_documents(filter, None).await?)
    }
}

/// Escape a literal for use inside a `$regex`
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive whole-value match
pub fn iequals(value: &str) -> Document {
    doc! { "$regex": format!("^{}$", escape_regex(value)), "$options": "i" }
}
