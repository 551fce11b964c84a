mod common;

use anyhow::Result;
use bson::{oid::ObjectId, DateTime};

use finsolvz_api::auth::Role;
use finsolvz_api::database::models::{Company, ReportType, User, UserChanges};

fn user(email: &str) -> User {
    User::new("Store Test".to_string(), email.to_string(), "hash".to_string(), Role::Client)
}

#[tokio::test]
async fn unique_indexes_surface_as_conflicts() -> Result<()> {
    let Some(db) = common::TestDb::connect().await? else {
        return Ok(());
    };
    let stores = db.stores();

    stores.users.insert(&user("dup@finsolvz.test")).await?;
    let err = stores.users.insert(&user("dup@finsolvz.test")).await.unwrap_err();
    assert_eq!(err.code(), "USER_ALREADY_EXISTS");

    let other = user("other@finsolvz.test");
    stores.users.insert(&other).await?;
    let mut changes = UserChanges::from(&other);
    changes.email = "dup@finsolvz.test".to_string();
    let err = stores.users.update_profile(other.id, &changes).await.unwrap_err();
    assert_eq!(err.code(), "EMAIL_ALREADY_EXISTS");

    stores.companies.insert(&Company::new("Acme".into(), None, vec![])).await?;
    let err = stores
        .companies
        .insert(&Company::new("Acme".into(), None, vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "COMPANY_ALREADY_EXISTS");

    stores.report_types.insert(&ReportType::new("Audit".into())).await?;
    let err = stores
        .report_types
        .insert(&ReportType::new("Audit".into()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "REPORT_TYPE_ALREADY_EXISTS");

    db.drop().await
}

#[tokio::test]
async fn listing_users_hides_secrets() -> Result<()> {
    let Some(db) = common::TestDb::connect().await? else {
        return Ok(());
    };
    let stores = db.stores();

    let mut stored = user("secret@finsolvz.test");
    stored.reset_password_token = Some("abc".into());
    stored.reset_password_expires = Some(DateTime::from_millis(DateTime::now().timestamp_millis() + 60_000));
    stores.users.insert(&stored).await?;

    let listed = stores.users.find_all().await?;
    assert_eq!(listed.len(), 1);
    assert!(listed[0].password.is_empty());
    assert!(listed[0].reset_password_token.is_none());

    let found = stores.users.find_by_reset_token("abc", DateTime::now()).await?;
    assert_eq!(found.map(|u| u.id), Some(stored.id));
    let later = DateTime::from_millis(DateTime::now().timestamp_millis() + 120_000);
    assert!(stores.users.find_by_reset_token("abc", later).await?.is_none());

    assert!(stores.users.set_password(stored.id, "new-hash").await?);
    let reloaded = stores.users.find_by_id(stored.id).await?.unwrap();
    assert_eq!(reloaded.password, "new-hash");
    assert!(reloaded.reset_password_token.is_none());

    db.drop().await
}

#[tokio::test]
async fn company_name_lookup_falls_back_to_case_insensitive() -> Result<()> {
    let Some(db) = common::TestDb::connect().await? else {
        return Ok(());
    };
    let stores = db.stores();
    let member = ObjectId::new();
    let company = Company::new("Acme (Asia)".into(), None, vec![member]);
    stores.companies.insert(&company).await?;

    let exact = stores.companies.find_by_name("Acme (Asia)").await?;
    assert_eq!(exact.map(|c| c.id), Some(company.id));
    // regex metacharacters are matched literally
    let folded = stores.companies.find_by_name("acme (asia)").await?;
    assert_eq!(folded.map(|c| c.id), Some(company.id));
    assert!(stores.companies.find_by_name("acme").await?.is_none());

    let mine = stores.companies.find_by_user(member).await?;
    assert_eq!(mine.len(), 1);

    assert!(stores.companies.delete(company.id).await?);
    assert!(!stores.companies.delete(company.id).await?);

    db.drop().await
}
