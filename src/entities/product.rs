//! Product entity - Catalog item referenced by links and order lines.
//!
//! Catalog CRUD is an external collaborator; this subsystem reads the price and
//! commission rate and decrements stock inside the order-creation transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Units currently in stock
    pub stock_quantity: i32,
    /// Commission rate as a 0-100 percentage; None means no commission
    pub commission_rate: Option<f64>,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product is targeted by many referral links
    #[sea_orm(has_many = "super::referral_link::Entity")]
    ReferralLinks,
    /// One product appears on many order lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
}

impl Related<super::referral_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReferralLinks.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
