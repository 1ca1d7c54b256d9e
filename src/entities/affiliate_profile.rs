//! Affiliate profile entity - One affiliate's identity, payout details, and ledger.
//!
//! The four monetary fields form the ledger. After every ledger operation the sum
//! identity `total_earnings == balance + pending_amount + withdrawn_amount` must
//! hold, with all four fields non-negative. Only the operations in
//! [`crate::core::ledger`] are allowed to mutate them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Affiliate profile database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliate_profiles")]
pub struct Model {
    /// Unique identifier for the profile
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user account
    pub user_id: i64,
    /// Name of the payout bank
    pub bank_name: String,
    /// Payout account number (free-form, banks differ)
    pub bank_account_number: String,
    /// Optional bank branch
    pub bank_branch: Option<String>,
    /// Base referral code; every issued link code is prefixed with it
    #[sea_orm(unique)]
    pub referral_code: String,
    /// Lifetime commission credited to this affiliate
    pub total_earnings: f64,
    /// Spendable balance, available for withdrawal
    pub balance: f64,
    /// Amount locked in Pending withdrawals
    pub pending_amount: f64,
    /// Amount paid out through resolved withdrawals
    pub withdrawn_amount: f64,
    /// When the profile was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `AffiliateProfile` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One profile issues many referral links
    #[sea_orm(has_many = "super::referral_link::Entity")]
    ReferralLinks,
    /// One profile accumulates many withdrawal transactions
    #[sea_orm(has_many = "super::withdrawal::Entity")]
    Withdrawals,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::referral_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferralLinks.def()
    }
}

impl Related<super::withdrawal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
