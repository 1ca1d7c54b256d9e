//! Click event entity - Aggregated clicks by one visitor on one referral code.
//!
//! One row per (`referral_code`, `user_id`) pair, enforced by a unique index the
//! schema bootstrap creates; repeat clicks increment `count` and refresh
//! `last_clicked_at` instead of inserting new rows. Anonymous clicks share a
//! single row per code with `user_id = None` and are analytics-only: attribution
//! requires a signed-in buyer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Click event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "click_events")]
pub struct Model {
    /// Unique identifier for the event row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Referral code that was clicked
    pub referral_code: String,
    /// Signed-in visitor, or None for anonymous traffic
    pub user_id: Option<i64>,
    /// Cumulative click count for this (code, visitor) pair
    pub count: i64,
    /// Time of the most recent click; earlier click times are not preserved
    pub last_clicked_at: DateTimeUtc,
}

/// Defines relationships between `ClickEvent` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
