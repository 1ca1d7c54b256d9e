//! Database configuration module for `GlowLink`.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Table creation uses `Schema::create_table_from_entity` so the schema is always
//! generated from the entity definitions rather than hand-written SQL.

use crate::config::settings::Settings;
use crate::entities::{
    AffiliateProfile, ClickEvent, Order, OrderLine, Product, ReferralLink, User, Withdrawal,
    click_event,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Resolves the database URL: `DATABASE_URL` from the environment wins,
/// then the settings file, which itself defaults to a local `SQLite` path.
#[must_use]
pub fn get_database_url(settings: &Settings) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| settings.database_url.clone())
}

/// Establishes a database connection using the resolved URL.
pub async fn create_connection(settings: &Settings) -> Result<DatabaseConnection> {
    let database_url = get_database_url(settings);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables used by the affiliate subsystem from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User);
    let product_table = schema.create_table_from_entity(Product);
    let profile_table = schema.create_table_from_entity(AffiliateProfile);
    let link_table = schema.create_table_from_entity(ReferralLink);
    let click_table = schema.create_table_from_entity(ClickEvent);
    let order_table = schema.create_table_from_entity(Order);
    let order_line_table = schema.create_table_from_entity(OrderLine);
    let withdrawal_table = schema.create_table_from_entity(Withdrawal);

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&profile_table)).await?;
    db.execute(builder.build(&link_table)).await?;
    db.execute(builder.build(&click_table)).await?;
    db.execute(builder.build(&order_table)).await?;
    db.execute(builder.build(&order_line_table)).await?;
    db.execute(builder.build(&withdrawal_table)).await?;

    // Click aggregation keys on (code, visitor); the index makes concurrent
    // first clicks conflict instead of splitting into two rows.
    let click_index = Index::create()
        .name("idx_click_events_code_user")
        .table(ClickEvent)
        .col(click_event::Column::ReferralCode)
        .col(click_event::Column::UserId)
        .unique()
        .to_owned();
    db.execute(builder.build(&click_index)).await?;

    Ok(())
}
