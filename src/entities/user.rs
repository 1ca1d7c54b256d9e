//! User entity - The account a shopper, affiliate, or manager signs in with.
//!
//! Only the fields the affiliate subsystem needs are modelled here; the full
//! account (password hash, OTP state, addresses) lives with the auth collaborator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role attached to a user account
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    /// Regular shopper; may upgrade to Affiliate
    #[sea_orm(string_value = "customer")]
    Customer,
    /// Shopper who registered an affiliate profile
    #[sea_orm(string_value = "affiliate")]
    Affiliate,
    /// Staff member who approves or rejects withdrawals
    #[sea_orm(string_value = "manager")]
    Manager,
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name shown on dashboards
    pub display_name: String,
    /// Contact email address
    pub email: String,
    /// Current role of the account
    pub role: UserRole,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns at most one affiliate profile
    #[sea_orm(has_many = "super::affiliate_profile::Entity")]
    AffiliateProfiles,
}

impl Related<super::affiliate_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffiliateProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
