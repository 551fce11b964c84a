use bson::oid::ObjectId;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::api::companies::{CompanyResponse, CreateCompanyRequest, UpdateCompanyRequest};
use crate::api::validation::{looks_like_object_id, parse_id};
use crate::cache::TtlCache;
use crate::database::models::{Company, User};
use crate::database::{CompanyStore, UserStore};
use crate::error::ApiError;
use crate::services::user_service::user_not_found;

pub const COMPANIES_CACHE_KEY: &str = "companies:all";
const LIST_LIMIT: i64 = 100;

fn company_not_found() -> ApiError {
    ApiError::not_found("COMPANY_NOT_FOUND", "Company not found")
}

fn invalid_name() -> ApiError {
    ApiError::bad_request("INVALID_COMPANY_NAME", "Company name is invalid")
}

fn already_exists() -> ApiError {
    ApiError::conflict("COMPANY_ALREADY_EXISTS", "Company name already exists")
}

fn parse_company_id(id: &str) -> Result<ObjectId, ApiError> {
    parse_id(id, "INVALID_COMPANY_ID", "Invalid company ID format")
}

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
    users: Arc<dyn UserStore>,
    cache: Arc<TtlCache<Vec<CompanyResponse>>>,
    cache_ttl: Duration,
    base_url: String,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        users: Arc<dyn UserStore>,
        cache: Arc<TtlCache<Vec<CompanyResponse>>>,
        cache_ttl: Duration,
        base_url: String,
    ) -> Self {
        Self {
            companies,
            users,
            cache,
            cache_ttl,
            base_url,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<Vec<CompanyResponse>>> {
        &self.cache
    }

    /// Newest first, served from the cache while it is warm
    pub async fn list(&self) -> Result<Vec<CompanyResponse>, ApiError> {
        if let Some(cached) = self.cache.get(COMPANIES_CACHE_KEY) {
            tracing::debug!(count = cached.len(), "company listing served from cache");
            return Ok(cached);
        }

        let generation = self.cache.generation();
        let companies = self.companies.find_all(LIST_LIMIT).await?;
        let responses = self.render_all(&companies).await?;
        if !self
            .cache
            .set_if_current(COMPANIES_CACHE_KEY, responses.clone(), self.cache_ttl, generation)
        {
            tracing::debug!("company listing changed while loading; not cached");
        }
        Ok(responses)
    }

    pub async fn create(&self, request: CreateCompanyRequest) -> Result<CompanyResponse, ApiError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(invalid_name());
        }
        if self.companies.find_by_name(&name).await?.is_some() {
            return Err(already_exists());
        }

        let members = self.resolve_members(request.user.as_deref().unwrap_or_default()).await?;
        let company = Company::new(
            name,
            request.profile_picture,
            members.iter().map(|u| u.id).collect(),
        );
        // The unique index still decides a concurrent race
        self.companies.insert(&company).await?;
        self.invalidate();

        tracing::info!(company_id = %company.id, name = %company.name, "company created");
        Ok(CompanyResponse::build(&company, &members, &self.base_url))
    }

    /// 24 hex characters look the company up by id, anything else by name
    pub async fn get(&self, id_or_name: &str) -> Result<CompanyResponse, ApiError> {
        let company = if looks_like_object_id(id_or_name) {
            self.load(parse_company_id(id_or_name)?).await?
        } else {
            let name = id_or_name.trim();
            if name.is_empty() {
                return Err(invalid_name());
            }
            self.companies
                .find_by_name(name)
                .await?
                .ok_or_else(company_not_found)?
        };
        self.render(&company).await
    }

    /// Companies that list the caller as a member
    pub async fn for_user(&self, user_id: ObjectId) -> Result<Vec<CompanyResponse>, ApiError> {
        let companies = self.companies.find_by_user(user_id).await?;
        self.render_all(&companies).await
    }

    pub async fn update(&self, id: &str, request: UpdateCompanyRequest) -> Result<CompanyResponse, ApiError> {
        let id = parse_company_id(id)?;
        let mut company = self.load(id).await?;

        if let Some(name) = request.name.as_deref() {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid_name());
            }
            if name != company.name {
                if let Some(other) = self.companies.find_by_name(name).await? {
                    if other.id != company.id {
                        return Err(already_exists());
                    }
                }
            }
            company.name = name.to_string();
        }
        if let Some(picture) = request.profile_picture {
            company.profile_picture = Some(picture);
        }
        if let Some(user) = request.user.as_deref() {
            company.user = self.resolve_members(user).await?.iter().map(|u| u.id).collect();
        }

        if !self.companies.update(&company).await? {
            return Err(company_not_found());
        }
        self.invalidate();

        tracing::info!(company_id = %company.id, "company updated");
        let company = self.load(id).await?;
        self.render(&company).await
    }

    /// Returns the company as it was before deletion
    pub async fn delete(&self, id: &str) -> Result<CompanyResponse, ApiError> {
        let id = parse_company_id(id)?;
        let company = self.load(id).await?;
        if !self.companies.delete(id).await? {
            return Err(company_not_found());
        }
        self.invalidate();

        tracing::info!(company_id = %id, "company deleted");
        self.render(&company).await
    }

    fn invalidate(&self) {
        self.cache.delete(COMPANIES_CACHE_KEY);
    }

    async fn load(&self, id: ObjectId) -> Result<Company, ApiError> {
        self.companies.find_by_id(id).await?.ok_or_else(company_not_found)
    }

    /// Every listed id must parse and name an existing user
    async fn resolve_members(&self, ids: &[String]) -> Result<Vec<User>, ApiError> {
        let mut members = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = parse_id(raw, "INVALID_USER_ID", "Invalid user ID format")?;
            if members.iter().any(|u: &User| u.id == id) {
                continue;
            }
            let user = self.users.find_by_id(id).await?.ok_or_else(user_not_found)?;
            members.push(user);
        }
        Ok(members)
    }

    async fn render(&self, company: &Company) -> Result<CompanyResponse, ApiError> {
        let members = self.users.find_by_ids(&company.user).await?;
        Ok(CompanyResponse::build(company, &members, &self.base_url))
    }

    /// One member lookup for the whole set
    async fn render_all(&self, companies: &[Company]) -> Result<Vec<CompanyResponse>, ApiError> {
        let ids: Vec<ObjectId> = companies
            .iter()
            .flat_map(|c| c.user.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let members = if ids.is_empty() {
            Vec::new()
        } else {
            self.users.find_by_ids(&ids).await?
        };

        Ok(companies
            .iter()
            .map(|c| CompanyResponse::build(c, &members, &self.base_url))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::testing::MemoryDb;

    /// Lets a write slip in between the listing query and the cache fill
    struct WriteDuringList {
        inner: Arc<dyn CompanyStore>,
        db: MemoryDb,
        cache: Arc<TtlCache<Vec<CompanyResponse>>>,
    }

    #[async_trait]
    impl CompanyStore for WriteDuringList {
        async fn insert(&self, company: &Company) -> Result<(), ApiError> {
            self.inner.insert(company).await
        }
        async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, ApiError> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_name(&self, name: &str) -> Result<Option<Company>, ApiError> {
            self.inner.find_by_name(name).await
        }
        async fn find_all(&self, limit: i64) -> Result<Vec<Company>, ApiError> {
            let snapshot = self.inner.find_all(limit).await?;
            self.db.lock().companies.push(Company::new("Late Co".into(), None, vec![]));
            self.cache.delete(COMPANIES_CACHE_KEY);
            Ok(snapshot)
        }
        async fn find_by_user(&self, user_id: ObjectId) -> Result<Vec<Company>, ApiError> {
            self.inner.find_by_user(user_id).await
        }
        async fn update(&self, company: &Company) -> Result<bool, ApiError> {
            self.inner.update(company).await
        }
        async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn listing_overtaken_by_a_write_is_not_cached() {
        let db = MemoryDb::new();
        db.lock().companies.push(Company::new("Early Co".into(), None, vec![]));
        let stores = db.stores();
        let cache = Arc::new(TtlCache::new());
        let racing = Arc::new(WriteDuringList {
            inner: stores.companies.clone(),
            db: db.clone(),
            cache: cache.clone(),
        });
        let service = CompanyService::new(
            racing,
            stores.users.clone(),
            cache.clone(),
            Duration::from_secs(60),
            "http://localhost".into(),
        );

        let first = service.list().await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(cache.get(COMPANIES_CACHE_KEY).is_none());

        // served from the store again, not a stale cached snapshot
        let listed = CompanyService::new(
            stores.companies.clone(),
            stores.users.clone(),
            cache.clone(),
            Duration::from_secs(60),
            "http://localhost".into(),
        )
        .list()
        .await
        .unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Late Co"), "{names:?}");
        assert_eq!(cache.get(COMPANIES_CACHE_KEY).map(|c| c.len()), Some(2));
    }
}
