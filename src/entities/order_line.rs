//! Order line entity - One product position on an order.
//!
//! `commission_amount` and `affiliate_profile_id` are computed at order creation
//! and frozen. Every line carries a commission figure even when no affiliate was
//! attributed; an unattributed figure is simply never credited to any ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_lines")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent order
    pub order_id: i64,
    /// Purchased product
    pub product_id: i64,
    /// Units purchased
    pub quantity: i32,
    /// Price per unit at purchase time
    pub unit_price: f64,
    /// Commission computed at purchase time, frozen thereafter
    pub commission_amount: f64,
    /// Affiliate credited for this line, if attribution resolved one
    pub affiliate_profile_id: Option<i64>,
}

/// Defines relationships between `OrderLine` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// Each line references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
