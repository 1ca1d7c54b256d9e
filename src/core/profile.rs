//! Affiliate registration and profile lookups.
//!
//! A Customer upgrades to Affiliate exactly once: the upgrade creates the
//! profile with a fresh base referral code and a zeroed ledger, then flips the
//! user's role, all in one transaction. Profiles are never deleted.

use crate::{
    entities::{
        AffiliateProfile, User, UserRole, Withdrawal, affiliate_profile, user, withdrawal,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Length of the base referral code assigned at registration.
const BASE_CODE_LEN: usize = 8;

/// Bank payout details captured at registration.
#[derive(Debug, Clone)]
pub struct BankDetails {
    /// Name of the payout bank
    pub bank_name: String,
    /// Account number (free-form)
    pub bank_account_number: String,
    /// Optional branch
    pub bank_branch: Option<String>,
}

/// Upgrades a Customer to Affiliate, creating their profile.
///
/// Fails with `UserNotFound` for unknown users, `DuplicateProfile` when the
/// user already registered, and `RoleMismatch` when the account is not a
/// Customer. The fresh profile has all four ledger fields at zero.
pub async fn register_affiliate(
    db: &DatabaseConnection,
    user_id: i64,
    bank: BankDetails,
) -> Result<affiliate_profile::Model> {
    let txn = db.begin().await?;

    let account = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let existing = AffiliateProfile::find()
        .filter(affiliate_profile::Column::UserId.eq(user_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateProfile { user_id });
    }

    if account.role != UserRole::Customer {
        return Err(Error::RoleMismatch {
            user_id,
            required: "customer".to_string(),
        });
    }

    let profile = affiliate_profile::ActiveModel {
        user_id: Set(user_id),
        bank_name: Set(bank.bank_name),
        bank_account_number: Set(bank.bank_account_number),
        bank_branch: Set(bank.bank_branch),
        referral_code: Set(fresh_base_code(&txn).await?),
        total_earnings: Set(0.0),
        balance: Set(0.0),
        pending_amount: Set(0.0),
        withdrawn_amount: Set(0.0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = profile.insert(&txn).await?;

    let mut account: user::ActiveModel = account.into();
    account.role = Set(UserRole::Affiliate);
    account.update(&txn).await?;

    txn.commit().await?;

    info!(user_id, affiliate_profile_id = created.id, "affiliate registered");
    Ok(created)
}

/// Finds the profile owned by a user, if any.
pub async fn get_profile_by_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<affiliate_profile::Model>> {
    AffiliateProfile::find()
        .filter(affiliate_profile::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All withdrawal transactions of one affiliate, newest first.
/// Backs the status-polling view on the affiliate's own profile page.
pub async fn list_withdrawals(
    db: &DatabaseConnection,
    affiliate_profile_id: i64,
) -> Result<Vec<withdrawal::Model>> {
    Withdrawal::find()
        .filter(withdrawal::Column::AffiliateProfileId.eq(affiliate_profile_id))
        .order_by_desc(withdrawal::Column::RequestedAt)
        .order_by_desc(withdrawal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Draws base codes until one is free. Collisions on an 8-hex-char space are
/// rare, so a small retry budget is plenty.
async fn fresh_base_code<C>(db: &C) -> Result<String>
where
    C: ConnectionTrait,
{
    for _ in 0..3 {
        let mut code = uuid::Uuid::new_v4().simple().to_string();
        code.truncate(BASE_CODE_LEN);

        let taken = AffiliateProfile::find()
            .filter(affiliate_profile::Column::ReferralCode.eq(&code))
            .one(db)
            .await?
            .is_some();
        if !taken {
            return Ok(code);
        }
    }

    Err(Error::Config {
        message: "could not allocate a unique base referral code".to_string(),
    })
}
