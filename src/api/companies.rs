use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::api::validation::required;
use crate::database::models::{Company, User};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCompanyRequest {
    #[validate(custom(function = "required"))]
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    pub profile_picture: Option<String>,
    pub user: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub user: Option<Vec<String>>,
}

/// Member entry embedded in a company response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyMember {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub user: Vec<CompanyMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyResponse {
    /// `members` holds the resolved users; references that no longer resolve are skipped
    pub fn build(company: &Company, members: &[User], base_url: &str) -> Self {
        let user = company
            .user
            .iter()
            .filter_map(|id| members.iter().find(|u| u.id == *id))
            .map(|u| CompanyMember {
                id: u.id.to_hex(),
                name: u.name.clone(),
            })
            .collect();

        Self {
            id: company.id.to_hex(),
            name: company.name.clone(),
            profile_picture: company
                .profile_picture
                .as_deref()
                .map(|picture| absolute_url(base_url, picture)),
            user,
            created_at: company.created_at.to_chrono(),
            updated_at: company.updated_at.to_chrono(),
        }
    }
}

/// Resolve a stored (possibly relative) picture path against the public base URL
pub fn absolute_url(base_url: &str, picture: &str) -> String {
    if picture.is_empty() || picture.starts_with("http://") || picture.starts_with("https://") {
        return picture.to_string();
    }

    let joined = Url::parse(base_url).and_then(|base| {
        let base = if base.path().ends_with('/') {
            base
        } else {
            let mut base = base;
            let path = format!("{}/", base.path());
            base.set_path(&path);
            base
        };
        base.join(picture.trim_start_matches('/'))
    });

    match joined {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::warn!(base_url, picture, error = %e, "could not resolve profile picture url");
            picture.to_string()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyMessage {
    pub message: &'static str,
    pub company: CompanyResponse,
}
