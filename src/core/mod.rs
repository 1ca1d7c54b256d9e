//! Core business logic for the affiliate subsystem.
//!
//! Each submodule owns one component: link issuance, click attribution,
//! commission math, the balance ledger, the withdrawal workflow, affiliate
//! registration, and the order-side calls that consume attribution.

/// Click recording and time-windowed attribution
pub mod clicks;
/// Commission math for order lines
pub mod commission;
/// Balance ledger operations; owns all monetary invariants
pub mod ledger;
/// Referral link issuance and resolution
pub mod links;
/// Order creation and the delivery transition that credits commissions
pub mod orders;
/// Affiliate registration and profile lookups
pub mod profile;
/// Withdrawal workflow layered on the ledger
pub mod withdrawals;
