//! Balance ledger - All mutation of an affiliate's four monetary fields.
//!
//! The fields must stay non-negative and satisfy
//! `total_earnings == balance + pending_amount + withdrawn_amount` after every
//! operation. Invalid operations are rejected up front rather than repaired
//! later, and every movement is a single guarded SQL UPDATE so a concurrent
//! caller can never observe a stale balance between the check and the write.
//! That guard is the whole concurrency story: it survives multiple processes,
//! which an in-memory lock would not.

use crate::{
    entities::{AffiliateProfile, Withdrawal, WithdrawalStatus, affiliate_profile, withdrawal},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

/// Credits a delivered order line's commission into the affiliate's ledger:
/// `total_earnings += amount; balance += amount`.
///
/// The order subsystem calls this exactly once per attributed line, at the
/// Shipped -> Delivered transition; the one-way transition is what guarantees a
/// line is never credited twice. Zero is accepted (a rate-less product still
/// produces a line) and is a no-op on the stored values.
pub async fn credit_earnings<C>(
    db: &C,
    affiliate_profile_id: i64,
    amount: f64,
) -> Result<affiliate_profile::Model>
where
    C: ConnectionTrait,
{
    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    require_profile(db, affiliate_profile_id).await?;

    use sea_orm::sea_query::Expr;
    AffiliateProfile::update_many()
        .col_expr(
            affiliate_profile::Column::TotalEarnings,
            Expr::col(affiliate_profile::Column::TotalEarnings).add(amount),
        )
        .col_expr(
            affiliate_profile::Column::Balance,
            Expr::col(affiliate_profile::Column::Balance).add(amount),
        )
        .filter(affiliate_profile::Column::Id.eq(affiliate_profile_id))
        .exec(db)
        .await?;

    info!(affiliate_profile_id, amount, "credited commission");
    require_profile(db, affiliate_profile_id).await
}

/// Opens a withdrawal: moves `amount` from `balance` to `pending_amount` and
/// creates the Pending transaction, atomically.
///
/// The balance check rides on the UPDATE itself (`balance >= amount` in the
/// filter), so two simultaneous requests can never both spend the same funds;
/// the loser sees zero affected rows and gets `InsufficientBalance`.
pub async fn request_withdrawal(
    db: &DatabaseConnection,
    affiliate_profile_id: i64,
    amount: f64,
) -> Result<withdrawal::Model> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let profile = require_profile(&txn, affiliate_profile_id).await?;

    use sea_orm::sea_query::Expr;
    let moved = AffiliateProfile::update_many()
        .col_expr(
            affiliate_profile::Column::Balance,
            Expr::col(affiliate_profile::Column::Balance).sub(amount),
        )
        .col_expr(
            affiliate_profile::Column::PendingAmount,
            Expr::col(affiliate_profile::Column::PendingAmount).add(amount),
        )
        .filter(affiliate_profile::Column::Id.eq(affiliate_profile_id))
        .filter(affiliate_profile::Column::Balance.gte(amount))
        .exec(&txn)
        .await?;

    if moved.rows_affected == 0 {
        return Err(Error::InsufficientBalance {
            balance: profile.balance,
            requested: amount,
        });
    }

    let transaction = withdrawal::ActiveModel {
        affiliate_profile_id: Set(affiliate_profile_id),
        amount: Set(amount),
        status: Set(WithdrawalStatus::Pending),
        requested_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = transaction.insert(&txn).await?;

    txn.commit().await?;

    info!(
        affiliate_profile_id,
        amount,
        withdrawal_id = created.id,
        "withdrawal requested"
    );
    Ok(created)
}

/// Resolves a Pending withdrawal into a terminal state.
///
/// Paid moves the amount from `pending_amount` to `withdrawn_amount`; Failed
/// returns it to `balance`. Re-applying the status a transaction already has is
/// an idempotent no-op (safe manager retry); asking a terminal transaction to
/// change to a *different* status is rejected, as is resolving to Pending.
///
/// The status flip itself is the gate: a guarded UPDATE that only matches while
/// the row is still Pending. The ledger movement runs only after that claim
/// succeeds, so two resolvers racing on the same withdrawal apply it once.
pub async fn resolve_withdrawal(
    db: &DatabaseConnection,
    withdrawal_id: i64,
    new_status: WithdrawalStatus,
) -> Result<(withdrawal::Model, affiliate_profile::Model)> {
    let txn = db.begin().await?;

    let transaction = Withdrawal::find_by_id(withdrawal_id)
        .one(&txn)
        .await?
        .ok_or(Error::WithdrawalNotFound { id: withdrawal_id })?;

    let profile_id = transaction.affiliate_profile_id;

    // Retry of an identical terminal status: nothing to do.
    if transaction.status == new_status && transaction.status.is_terminal() {
        let profile = require_profile(&txn, profile_id).await?;
        txn.commit().await?;
        return Ok((transaction, profile));
    }

    if transaction.status.is_terminal() || !new_status.is_terminal() {
        return Err(Error::InvalidTransition {
            from: format!("{:?}", transaction.status),
            to: format!("{new_status:?}"),
        });
    }

    let claimed = Withdrawal::update_many()
        .set(withdrawal::ActiveModel {
            status: Set(new_status),
            ..Default::default()
        })
        .filter(withdrawal::Column::Id.eq(withdrawal_id))
        .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending))
        .exec(&txn)
        .await?;

    if claimed.rows_affected == 0 {
        // Another resolver claimed the row between our read and the flip.
        let current = Withdrawal::find_by_id(withdrawal_id)
            .one(&txn)
            .await?
            .ok_or(Error::WithdrawalNotFound { id: withdrawal_id })?;
        if current.status == new_status {
            let profile = require_profile(&txn, profile_id).await?;
            txn.commit().await?;
            return Ok((current, profile));
        }
        return Err(Error::InvalidTransition {
            from: format!("{:?}", current.status),
            to: format!("{new_status:?}"),
        });
    }

    use sea_orm::sea_query::Expr;
    let amount = transaction.amount;
    let update = AffiliateProfile::update_many()
        .col_expr(
            affiliate_profile::Column::PendingAmount,
            Expr::col(affiliate_profile::Column::PendingAmount).sub(amount),
        )
        .filter(affiliate_profile::Column::Id.eq(profile_id))
        .filter(affiliate_profile::Column::PendingAmount.gte(amount));

    let update = match new_status {
        WithdrawalStatus::Paid => update.col_expr(
            affiliate_profile::Column::WithdrawnAmount,
            Expr::col(affiliate_profile::Column::WithdrawnAmount).add(amount),
        ),
        WithdrawalStatus::Failed => update.col_expr(
            affiliate_profile::Column::Balance,
            Expr::col(affiliate_profile::Column::Balance).add(amount),
        ),
        WithdrawalStatus::Pending => unreachable!("terminal status checked above"),
    };

    let moved = update.exec(&txn).await?;
    if moved.rows_affected == 0 {
        // Pending funds smaller than the transaction amount: dropping the
        // transaction rolls the claim back with the failed movement.
        return Err(Error::LedgerInconsistent {
            affiliate_profile_id: profile_id,
            amount,
        });
    }

    let resolved = withdrawal::Model {
        status: new_status,
        ..transaction
    };

    let profile = require_profile(&txn, profile_id).await?;
    txn.commit().await?;

    info!(
        withdrawal_id,
        affiliate_profile_id = profile_id,
        status = ?new_status,
        "withdrawal resolved"
    );
    Ok((resolved, profile))
}

/// Fetches a profile or fails with `ProfileNotFound`.
pub async fn require_profile<C>(
    db: &C,
    affiliate_profile_id: i64,
) -> Result<affiliate_profile::Model>
where
    C: ConnectionTrait,
{
    AffiliateProfile::find_by_id(affiliate_profile_id)
        .one(db)
        .await?
        .ok_or(Error::ProfileNotFound {
            id: affiliate_profile_id,
        })
}

/// Whether the ledger fields are non-negative and satisfy the sum identity.
/// Exposed for tests and consistency checks.
#[must_use]
pub fn ledger_balanced(profile: &affiliate_profile::Model) -> bool {
    let non_negative = profile.balance >= 0.0
        && profile.pending_amount >= 0.0
        && profile.withdrawn_amount >= 0.0
        && profile.total_earnings >= 0.0;
    let identity = (profile.total_earnings
        - (profile.balance + profile.pending_amount + profile.withdrawn_amount))
        .abs()
        < 1e-9;
    non_negative && identity
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{create_test_affiliate, setup_test_db};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_credit_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = credit_earnings(&db, 1, -5.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -5.0 }
        ));

        let result = credit_earnings(&db, 1, f64::NAN).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_withdrawal_amount_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;

        let result = request_withdrawal(&db, profile.id, 0.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: 0.0 }
        ));

        let result = request_withdrawal(&db, profile.id, -10.0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_updates_totals_and_identity() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;

        let updated = credit_earnings(&db, profile.id, 25.5).await?;
        assert_eq!(updated.total_earnings, 25.5);
        assert_eq!(updated.balance, 25.5);
        assert_eq!(updated.pending_amount, 0.0);
        assert_eq!(updated.withdrawn_amount, 0.0);
        assert!(ledger_balanced(&updated));

        let updated = credit_earnings(&db, profile.id, 4.5).await?;
        assert_eq!(updated.total_earnings, 30.0);
        assert_eq!(updated.balance, 30.0);
        assert!(ledger_balanced(&updated));

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_missing_profile() -> Result<()> {
        let db = setup_test_db().await?;

        let result = credit_earnings(&db, 999, 10.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProfileNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_request_withdrawal_moves_balance_to_pending() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;

        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;
        assert_eq!(transaction.amount, 40.0);
        assert_eq!(transaction.status, WithdrawalStatus::Pending);

        let profile = require_profile(&db, profile.id).await?;
        assert_eq!(profile.balance, 60.0);
        assert_eq!(profile.pending_amount, 40.0);
        assert_eq!(profile.total_earnings, 100.0);
        assert_eq!(profile.withdrawn_amount, 0.0);
        assert!(ledger_balanced(&profile));

        Ok(())
    }

    #[tokio::test]
    async fn test_over_balance_withdrawal_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 30.0).await?;

        let result = request_withdrawal(&db, profile.id, 30.01).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientBalance {
                balance: 30.0,
                requested: 30.01
            }
        ));

        // Nothing moved, no transaction row persisted
        let profile = require_profile(&db, profile.id).await?;
        assert_eq!(profile.balance, 30.0);
        assert_eq!(profile.pending_amount, 0.0);
        assert!(ledger_balanced(&profile));
        assert_eq!(Withdrawal::find().all(&db).await?.len(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_withdrawal_of_entire_balance_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 30.0).await?;

        request_withdrawal(&db, profile.id, 30.0).await?;

        let profile = require_profile(&db, profile.id).await?;
        assert_eq!(profile.balance, 0.0);
        assert_eq!(profile.pending_amount, 30.0);
        assert!(ledger_balanced(&profile));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_paid_moves_pending_to_withdrawn() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        let (resolved, profile) =
            resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Paid).await?;
        assert_eq!(resolved.status, WithdrawalStatus::Paid);
        assert_eq!(profile.balance, 60.0);
        assert_eq!(profile.pending_amount, 0.0);
        assert_eq!(profile.withdrawn_amount, 40.0);
        assert_eq!(profile.total_earnings, 100.0);
        assert!(ledger_balanced(&profile));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_failed_returns_funds_to_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        let (resolved, profile) =
            resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Failed).await?;
        assert_eq!(resolved.status, WithdrawalStatus::Failed);
        assert_eq!(profile.balance, 100.0);
        assert_eq!(profile.pending_amount, 0.0);
        assert_eq!(profile.withdrawn_amount, 0.0);
        assert!(ledger_balanced(&profile));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_on_retry() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        let (_, after_first) =
            resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Paid).await?;
        let (retried, after_second) =
            resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Paid).await?;

        // Applying Paid twice has the same ledger effect as applying it once
        assert_eq!(retried.status, WithdrawalStatus::Paid);
        assert_eq!(after_second.balance, after_first.balance);
        assert_eq!(after_second.pending_amount, after_first.pending_amount);
        assert_eq!(after_second.withdrawn_amount, after_first.withdrawn_amount);
        assert_eq!(after_second.total_earnings, after_first.total_earnings);
        assert!(ledger_balanced(&after_second));

        Ok(())
    }

    #[tokio::test]
    async fn test_conflicting_terminal_status_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Paid).await?;
        let result = resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Failed).await;

        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        // Ledger untouched by the rejected call
        let profile = require_profile(&db, profile.id).await?;
        assert_eq!(profile.withdrawn_amount, 40.0);
        assert!(ledger_balanced(&profile));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolving_back_to_pending_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        let result = resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Pending).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_terminal_row_never_moves_funds_again() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        // Flip the row terminal out of band, leaving the ledger untouched, the
        // way a concurrent resolver's committed claim would.
        let mut active: withdrawal::ActiveModel =
            Withdrawal::find_by_id(transaction.id).one(&db).await?.unwrap().into();
        active.status = Set(WithdrawalStatus::Paid);
        active.update(&db).await?;

        // A resolver arriving late sees the claim and applies nothing.
        let (resolved, profile) =
            resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Paid).await?;
        assert_eq!(resolved.status, WithdrawalStatus::Paid);
        assert_eq!(profile.pending_amount, 40.0);
        assert_eq!(profile.withdrawn_amount, 0.0);

        let result = resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Failed).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_retry_leaves_sibling_pending_funds_intact() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let first = request_withdrawal(&db, profile.id, 40.0).await?;
        let second = request_withdrawal(&db, profile.id, 40.0).await?;

        resolve_withdrawal(&db, first.id, WithdrawalStatus::Paid).await?;
        let (_, after) = resolve_withdrawal(&db, first.id, WithdrawalStatus::Paid).await?;

        // Only the first withdrawal's funds moved; the second still waits.
        assert_eq!(after.withdrawn_amount, 40.0);
        assert_eq!(after.pending_amount, 40.0);
        assert!(ledger_balanced(&after));

        let (_, after) = resolve_withdrawal(&db, second.id, WithdrawalStatus::Paid).await?;
        assert_eq!(after.withdrawn_amount, 80.0);
        assert_eq!(after.pending_amount, 0.0);
        assert!(ledger_balanced(&after));

        Ok(())
    }

    #[tokio::test]
    async fn test_tampered_pending_amount_reported_as_inconsistency() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 100.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 40.0).await?;

        // Shrink the pending funds behind the module's back.
        let mut active: affiliate_profile::ActiveModel =
            require_profile(&db, profile.id).await?.into();
        active.pending_amount = Set(10.0);
        active.update(&db).await?;

        let result = resolve_withdrawal(&db, transaction.id, WithdrawalStatus::Paid).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::LedgerInconsistent { amount: 40.0, .. }
        ));

        // The failed movement rolled the status claim back too.
        let current = Withdrawal::find_by_id(transaction.id).one(&db).await?.unwrap();
        assert_eq!(current.status, WithdrawalStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_missing_transaction() -> Result<()> {
        let db = setup_test_db().await?;

        let result = resolve_withdrawal(&db, 999, WithdrawalStatus::Paid).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::WithdrawalNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_identity_through_full_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;

        credit_earnings(&db, profile.id, 50.0).await?;
        let w1 = request_withdrawal(&db, profile.id, 20.0).await?;
        credit_earnings(&db, profile.id, 10.0).await?;
        let w2 = request_withdrawal(&db, profile.id, 15.0).await?;
        resolve_withdrawal(&db, w1.id, WithdrawalStatus::Paid).await?;
        let (_, profile) = resolve_withdrawal(&db, w2.id, WithdrawalStatus::Failed).await?;

        assert_eq!(profile.total_earnings, 60.0);
        assert_eq!(profile.withdrawn_amount, 20.0);
        assert_eq!(profile.pending_amount, 0.0);
        assert_eq!(profile.balance, 40.0);
        assert!(ledger_balanced(&profile));

        Ok(())
    }
}
