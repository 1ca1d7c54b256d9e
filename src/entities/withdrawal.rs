//! Withdrawal entity - An affiliate's request to convert balance into a payout.
//!
//! Created in `Pending` by the ledger, resolved exactly once into a terminal
//! state by a manager. Terminal rows are never re-opened.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a withdrawal transaction
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum WithdrawalStatus {
    /// Requested, funds moved from balance into pending
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payout completed; pending funds became withdrawn
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Payout rejected or bounced; pending funds returned to balance
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl WithdrawalStatus {
    /// Whether this status permits no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }
}

/// Withdrawal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    /// Unique identifier for the withdrawal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting affiliate profile
    pub affiliate_profile_id: i64,
    /// Requested payout amount
    pub amount: f64,
    /// Current state of the request
    pub status: WithdrawalStatus,
    /// When the affiliate submitted the request
    pub requested_at: DateTimeUtc,
}

/// Defines relationships between Withdrawal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each withdrawal belongs to one affiliate profile
    #[sea_orm(
        belongs_to = "super::affiliate_profile::Entity",
        from = "Column::AffiliateProfileId",
        to = "super::affiliate_profile::Column::Id"
    )]
    AffiliateProfile,
}

impl Related<super::affiliate_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffiliateProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
