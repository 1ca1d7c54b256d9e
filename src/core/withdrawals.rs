//! Withdrawal workflow - Manager-facing layer over the ledger's state machine.
//!
//! States: Pending (created by `request_withdrawal`) -> Paid | Failed, both
//! terminal. The ledger module performs the field movements; this module adds
//! the caller checks (a resolver must be an identified Manager) and the listing
//! views exposed to the approval dashboard.

use crate::{
    core::ledger,
    entities::{
        User, UserRole, Withdrawal, WithdrawalStatus, affiliate_profile, withdrawal,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};

/// Resolves a Pending withdrawal on behalf of a manager.
///
/// `acting_user_id` is the authenticated caller; `None` (no identity) is
/// `Unauthenticated`, a non-manager is `RoleMismatch`. Transition rules and
/// ledger movements are enforced by [`ledger::resolve_withdrawal`].
pub async fn resolve(
    db: &DatabaseConnection,
    acting_user_id: Option<i64>,
    withdrawal_id: i64,
    new_status: WithdrawalStatus,
) -> Result<(withdrawal::Model, affiliate_profile::Model)> {
    let user_id = acting_user_id.ok_or(Error::Unauthenticated)?;

    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;
    if account.role != UserRole::Manager {
        return Err(Error::RoleMismatch {
            user_id,
            required: "manager".to_string(),
        });
    }

    ledger::resolve_withdrawal(db, withdrawal_id, new_status).await
}

/// All withdrawals across affiliates, newest first. Backs the manager dashboard.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<withdrawal::Model>> {
    Withdrawal::find()
        .order_by_desc(withdrawal::Column::RequestedAt)
        .order_by_desc(withdrawal::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Withdrawals still waiting on a manager decision, oldest first.
pub async fn list_pending(db: &DatabaseConnection) -> Result<Vec<withdrawal::Model>> {
    Withdrawal::find()
        .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Pending))
        .order_by_asc(withdrawal::Column::RequestedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ledger::{credit_earnings, ledger_balanced, request_withdrawal};
    use crate::test_utils::{create_test_affiliate, create_test_user, setup_test_db};

    #[tokio::test]
    async fn test_resolve_requires_identity() -> Result<()> {
        let db = setup_test_db().await?;

        let result = resolve(&db, None, 1, WithdrawalStatus::Paid).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated));

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_requires_manager_role() -> Result<()> {
        let db = setup_test_db().await?;
        let (affiliate_user, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        credit_earnings(&db, profile.id, 50.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 20.0).await?;

        // The affiliate cannot approve their own payout
        let result = resolve(
            &db,
            Some(affiliate_user.id),
            transaction.id,
            WithdrawalStatus::Paid,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::RoleMismatch { .. }));

        let result = resolve(&db, Some(999), transaction.id, WithdrawalStatus::Paid).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_manager_resolves_and_ledger_moves() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        let manager = create_test_user(&db, "boss@example.com", UserRole::Manager).await?;
        credit_earnings(&db, profile.id, 50.0).await?;
        let transaction = request_withdrawal(&db, profile.id, 20.0).await?;

        let (resolved, snapshot) = resolve(
            &db,
            Some(manager.id),
            transaction.id,
            WithdrawalStatus::Paid,
        )
        .await?;

        assert_eq!(resolved.status, WithdrawalStatus::Paid);
        assert_eq!(snapshot.withdrawn_amount, 20.0);
        assert_eq!(snapshot.balance, 30.0);
        assert!(ledger_balanced(&snapshot));

        Ok(())
    }

    #[tokio::test]
    async fn test_listing_views() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, profile) = create_test_affiliate(&db, "ada@example.com").await?;
        let manager = create_test_user(&db, "boss@example.com", UserRole::Manager).await?;
        credit_earnings(&db, profile.id, 100.0).await?;

        let w1 = request_withdrawal(&db, profile.id, 10.0).await?;
        let w2 = request_withdrawal(&db, profile.id, 20.0).await?;
        resolve(&db, Some(manager.id), w1.id, WithdrawalStatus::Paid).await?;

        let all = list_all(&db).await?;
        assert_eq!(all.len(), 2);

        let pending = list_pending(&db).await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, w2.id);

        Ok(())
    }
}
