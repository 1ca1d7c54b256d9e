//! Order entity - A customer purchase moving through a one-way status machine.
//!
//! `Paid -> Shipped -> Delivered` are the only transitions this subsystem performs;
//! `Delivered` is the point where attributed line commissions are credited to
//! affiliate ledgers, and the one-way machine guarantees that happens at most once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    /// Created, awaiting payment
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payment confirmed by the gateway collaborator
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Handed to the carrier
    #[sea_orm(string_value = "shipped")]
    Shipped,
    /// Received by the customer; commissions credited
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Cancelled before fulfilment
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Purchasing user
    pub customer_id: i64,
    /// Sum of `quantity * unit_price` over all lines
    pub total_amount: f64,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// When the order was placed
    pub order_date: DateTimeUtc,
    /// Shipping address
    pub address: String,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
