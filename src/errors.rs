//! Unified error types for the affiliate subsystem.
//!
//! Attribution misses are deliberately *not* represented here: a purchase with no
//! qualifying click is a valid `None` outcome, not a failure. Errors cover absent
//! entities, invalid amounts, illegal state transitions, duplicate registrations,
//! and missing caller identity.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("user not found: {id}")]
    UserNotFound { id: i64 },

    #[error("affiliate profile not found: {id}")]
    ProfileNotFound { id: i64 },

    #[error("product not found: {id}")]
    ProductNotFound { id: i64 },

    #[error("referral link not found: {code}")]
    LinkNotFound { code: String },

    #[error("withdrawal not found: {id}")]
    WithdrawalNotFound { id: i64 },

    #[error("order not found: {id}")]
    OrderNotFound { id: i64 },

    #[error("user {user_id} already has an affiliate profile")]
    DuplicateProfile { user_id: i64 },

    #[error("affiliate {affiliate_profile_id} already has a link for product {product_id}")]
    DuplicateLink {
        affiliate_profile_id: i64,
        product_id: i64,
    },

    #[error("user {user_id} does not have the {required} role")]
    RoleMismatch { user_id: i64, required: String },

    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i32 },

    #[error("insufficient balance: have {balance}, requested {requested}")]
    InsufficientBalance { balance: f64, requested: f64 },

    #[error("insufficient stock for product {product_id}: have {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i32,
        requested: i32,
    },

    #[error("illegal state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error(
        "ledger for affiliate profile {affiliate_profile_id} cannot cover {amount}; \
         fields were mutated outside the ledger module"
    )]
    LedgerInconsistent {
        affiliate_profile_id: i64,
        amount: f64,
    },

    #[error("order must contain at least one line")]
    EmptyOrder,

    #[error("caller identity is required for this operation")]
    Unauthenticated,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
