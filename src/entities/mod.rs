//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod affiliate_profile;
pub mod click_event;
pub mod order;
pub mod order_line;
pub mod product;
pub mod referral_link;
pub mod user;
pub mod withdrawal;

// Re-export specific types to avoid conflicts
pub use affiliate_profile::{
    Column as AffiliateProfileColumn, Entity as AffiliateProfile, Model as AffiliateProfileModel,
};
pub use click_event::{Column as ClickEventColumn, Entity as ClickEvent, Model as ClickEventModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use order_line::{Column as OrderLineColumn, Entity as OrderLine, Model as OrderLineModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use referral_link::{
    Column as ReferralLinkColumn, Entity as ReferralLink, Model as ReferralLinkModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserRole};
pub use withdrawal::{
    Column as WithdrawalColumn, Entity as Withdrawal, Model as WithdrawalModel, WithdrawalStatus,
};
