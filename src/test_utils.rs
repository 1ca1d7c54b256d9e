//! Shared test utilities for `GlowLink`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::Settings,
    core::profile::{self, BankDetails},
    entities::{self, UserRole, user},
    errors::Result,
};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Settings with defaults suitable for tests: 7-day window, 6-char suffixes.
pub fn test_settings() -> Settings {
    Settings::default()
}

/// Sample bank details for registration calls.
pub fn bank_details() -> BankDetails {
    BankDetails {
        bank_name: "Vietcombank".to_string(),
        bank_account_number: "123456789".to_string(),
        bank_branch: Some("Branch 01".to_string()),
    }
}

/// Creates a test user with the given email and role.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    role: UserRole,
) -> Result<entities::user::Model> {
    let account = user::ActiveModel {
        display_name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        role: Set(role),
        ..Default::default()
    };
    account.insert(db).await.map_err(Into::into)
}

/// Creates a Customer user and upgrades it to Affiliate.
/// Returns (user, profile); the user's stored role is Affiliate afterwards.
pub async fn create_test_affiliate(
    db: &DatabaseConnection,
    email: &str,
) -> Result<(entities::user::Model, entities::affiliate_profile::Model)> {
    let account = create_test_user(db, email, UserRole::Customer).await?;
    let affiliate = profile::register_affiliate(db, account.id, bank_details()).await?;
    Ok((account, affiliate))
}

/// Creates a test product.
///
/// # Defaults
/// * `stock_quantity`: 10
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    commission_rate: Option<f64>,
) -> Result<entities::product::Model> {
    let item = entities::product::ActiveModel {
        name: Set(name.to_string()),
        price: Set(price),
        stock_quantity: Set(10),
        commission_rate: Set(commission_rate),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}
