//! Click tracking and time-windowed attribution.
//!
//! Clicks aggregate per (referral code, visitor): a repeat click bumps the count
//! and refreshes the click time instead of inserting a new row. Attribution is
//! *global last click*: at purchase time the single most recent click inside the
//! window decides, and if that click's link points at a different product the
//! purchase goes unattributed even when an older matching click exists. The
//! policy is confined to [`resolve_attribution`] so it can be swapped for a
//! per-product variant without touching callers.

use crate::{
    core::links,
    entities::{ClickEvent, ReferralLink, click_event, referral_link},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use tracing::debug;

/// Records one click on a referral code.
///
/// Fails with `LinkNotFound` for unknown codes. `buyer` is `None` for anonymous
/// visitors; their clicks aggregate on a shared per-code row and never take part
/// in attribution.
pub async fn record_click(
    db: &DatabaseConnection,
    code: &str,
    buyer: Option<i64>,
    now: DateTime<Utc>,
) -> Result<click_event::Model> {
    links::require_link(db, code).await?;

    // Two first clicks can race find-then-insert; the unique index on
    // (referral_code, user_id) fails the loser's insert, and the retry lands
    // on the update path against the winner's row.
    loop {
        if let Some(event) = find_event(db, code, buyer).await? {
            let next_count = event.count + 1;
            let mut active: click_event::ActiveModel = event.into();
            active.count = Set(next_count);
            active.last_clicked_at = Set(now);
            return active.update(db).await.map_err(Into::into);
        }

        let event = click_event::ActiveModel {
            referral_code: Set(code.to_string()),
            user_id: Set(buyer),
            count: Set(1),
            last_clicked_at: Set(now),
            ..Default::default()
        };
        match event.insert(db).await {
            Ok(created) => return Ok(created),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(%code, "first click lost an insert race, updating instead");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn find_event(
    db: &DatabaseConnection,
    code: &str,
    buyer: Option<i64>,
) -> Result<Option<click_event::Model>> {
    let mut query = ClickEvent::find().filter(click_event::Column::ReferralCode.eq(code));
    query = match buyer {
        Some(user_id) => query.filter(click_event::Column::UserId.eq(user_id)),
        None => query.filter(click_event::Column::UserId.is_null()),
    };
    query.one(db).await.map_err(Into::into)
}

/// Resolves which affiliate, if any, earns the commission for a purchase of
/// `product_id` by `buyer_id` at `now`.
///
/// Considers the buyer's clicks with `last_clicked_at` in `[now - window, now]`
/// (the lower boundary is inclusive), picks the most recent one with the highest
/// event id breaking ties, and returns its link's affiliate only when the link
/// targets the purchased product. A miss is a valid `None`, never an error.
pub async fn resolve_attribution<C>(
    db: &C,
    buyer_id: i64,
    product_id: i64,
    now: DateTime<Utc>,
    window_days: i64,
) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let window_start = now - chrono::Duration::days(window_days);

    let latest = ClickEvent::find()
        .filter(click_event::Column::UserId.eq(buyer_id))
        .filter(click_event::Column::LastClickedAt.gte(window_start))
        .filter(click_event::Column::LastClickedAt.lte(now))
        .order_by_desc(click_event::Column::LastClickedAt)
        .order_by_desc(click_event::Column::Id)
        .one(db)
        .await?;

    let Some(click) = latest else {
        debug!(buyer_id, "no click inside the attribution window");
        return Ok(None);
    };

    match links::resolve_link(db, &click.referral_code).await? {
        Some(link) if link.product_id == product_id => Ok(Some(link.affiliate_profile_id)),
        _ => {
            debug!(
                buyer_id,
                code = %click.referral_code,
                "last click does not match the purchased product"
            );
            Ok(None)
        }
    }
}

/// Aggregate click statistics for one affiliate over a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickStats {
    /// Sum of click counts over the affiliate's codes in the range
    pub total_clicks: i64,
    /// Number of distinct (code, visitor) rows that clicked in the range
    pub unique_visitors: usize,
}

/// Computes [`ClickStats`] for the affiliate's links between `from` and `to`.
pub async fn click_stats(
    db: &DatabaseConnection,
    affiliate_profile_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<ClickStats> {
    let codes: Vec<String> = ReferralLink::find()
        .filter(referral_link::Column::AffiliateProfileId.eq(affiliate_profile_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.referral_code)
        .collect();

    if codes.is_empty() {
        return Ok(ClickStats {
            total_clicks: 0,
            unique_visitors: 0,
        });
    }

    let events = ClickEvent::find()
        .filter(click_event::Column::ReferralCode.is_in(codes))
        .filter(click_event::Column::LastClickedAt.gte(from))
        .filter(click_event::Column::LastClickedAt.lte(to))
        .all(db)
        .await?;

    Ok(ClickStats {
        total_clicks: events.iter().map(|e| e.count).sum(),
        unique_visitors: events.len(),
    })
}
