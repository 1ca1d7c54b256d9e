//! Referral link entity - Binds an affiliate to a product under a unique code.
//!
//! Links are immutable once issued. The registry rejects a second link for the
//! same (affiliate, product) pair, so the pair is unique by policy even though
//! only the code carries a schema-level constraint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral link database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_links")]
pub struct Model {
    /// Unique identifier for the link
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Issuing affiliate profile
    pub affiliate_profile_id: i64,
    /// Product the link points at
    pub product_id: i64,
    /// Globally unique code: `{base}-{suffix}`
    #[sea_orm(unique)]
    pub referral_code: String,
    /// When the link was issued
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ReferralLink` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one affiliate profile
    #[sea_orm(
        belongs_to = "super::affiliate_profile::Entity",
        from = "Column::AffiliateProfileId",
        to = "super::affiliate_profile::Column::Id"
    )]
    AffiliateProfile,
    /// Each link targets one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::affiliate_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffiliateProfile.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
