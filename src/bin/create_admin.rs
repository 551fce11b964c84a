use anyhow::{bail, Context};
use clap::Parser;

use finsolvz_api::auth::{password::hash_password, Role};
use finsolvz_api::config::AppConfig;
use finsolvz_api::database::models::User;
use finsolvz_api::database::DatabaseManager;

/// Seed a SUPER_ADMIN account
#[derive(Parser, Debug)]
#[command(name = "create-admin")]
#[command(about = "Create the initial SUPER_ADMIN user in the configured database")]
#[command(version)]
struct Args {
    #[arg(long, default_value = "Super Admin")]
    name: String,

    #[arg(long, default_value = "admin@finsolvz.com")]
    email: String,

    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if args.password.len() < 6 {
        bail!("password must be at least 6 characters");
    }

    let config = AppConfig::from_env();
    let database = DatabaseManager::connect(&config)
        .await
        .context("failed to create database client")?;
    database
        .health_check()
        .await
        .context("database is not reachable")?;
    let users = database.stores().users;

    let email = args.email.trim();
    if users.find_by_email(email).await?.is_some() {
        bail!("a user with email {email} already exists");
    }

    let hash = hash_password(&args.password)?;
    let admin = User::new(args.name.trim().to_string(), email.to_string(), hash, Role::SuperAdmin);
    users.insert(&admin).await?;

    println!("✅ Admin created");
    println!("   id:    {}", admin.id.to_hex());
    println!("   email: {}", admin.email);

    database.shutdown().await;
    Ok(())
}
