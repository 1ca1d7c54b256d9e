//! Referral link registry - Issues and resolves affiliate/product link codes.
//!
//! A link code is the affiliate's base code plus a random hex suffix, unique
//! across the whole table. Issuance retries on suffix collisions and rejects a
//! second link for the same (affiliate, product) pair; that policy lives here,
//! not in the callers.

use crate::{
    config::settings::Settings,
    entities::{AffiliateProfile, Product, ReferralLink, referral_link},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// How many fresh suffixes to try before giving up on code generation.
const CODE_RETRY_LIMIT: usize = 3;

/// Issues a new referral link for (affiliate, product).
///
/// Fails with `ProfileNotFound`/`ProductNotFound` if either side is missing and
/// with `DuplicateLink` if the pair already has a link.
pub async fn create_link(
    db: &DatabaseConnection,
    affiliate_profile_id: i64,
    product_id: i64,
    settings: &Settings,
) -> Result<referral_link::Model> {
    let profile = AffiliateProfile::find_by_id(affiliate_profile_id)
        .one(db)
        .await?
        .ok_or(Error::ProfileNotFound {
            id: affiliate_profile_id,
        })?;

    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let existing = ReferralLink::find()
        .filter(referral_link::Column::AffiliateProfileId.eq(affiliate_profile_id))
        .filter(referral_link::Column::ProductId.eq(product_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateLink {
            affiliate_profile_id,
            product_id,
        });
    }

    // The suffix space is large enough that collisions are rare; retry a few
    // times rather than trusting a single draw.
    for _ in 0..CODE_RETRY_LIMIT {
        let code = format!(
            "{}-{}",
            profile.referral_code,
            random_suffix(settings.referral_suffix_len)
        );

        if resolve_link(db, &code).await?.is_some() {
            debug!(%code, "referral code collision, retrying");
            continue;
        }

        let link = referral_link::ActiveModel {
            affiliate_profile_id: Set(affiliate_profile_id),
            product_id: Set(product_id),
            referral_code: Set(code),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        return link.insert(db).await.map_err(Into::into);
    }

    Err(Error::Config {
        message: "could not allocate a unique referral code".to_string(),
    })
}

/// Exact-match lookup of a referral code.
pub async fn resolve_link<C>(db: &C, code: &str) -> Result<Option<referral_link::Model>>
where
    C: ConnectionTrait,
{
    ReferralLink::find()
        .filter(referral_link::Column::ReferralCode.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`resolve_link`] but treats an unknown code as an error.
pub async fn require_link<C>(db: &C, code: &str) -> Result<referral_link::Model>
where
    C: ConnectionTrait,
{
    resolve_link(db, code).await?.ok_or_else(|| Error::LinkNotFound {
        code: code.to_string(),
    })
}

/// All links issued by one affiliate, newest first. Used by the dashboard view.
pub async fn list_links(
    db: &DatabaseConnection,
    affiliate_profile_id: i64,
) -> Result<Vec<referral_link::Model>> {
    ReferralLink::find()
        .filter(referral_link::Column::AffiliateProfileId.eq(affiliate_profile_id))
        .order_by_desc(referral_link::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Composes the shareable storefront URL for a link.
#[must_use]
pub fn share_url(settings: &Settings, link: &referral_link::Model) -> String {
    format!(
        "{}/product/{}?ref={}",
        settings.share_base_url.trim_end_matches('/'),
        link.product_id,
        link.referral_code
    )
}

/// Generates a lowercase hex suffix of the requested length.
fn random_suffix(len: usize) -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(len);
    hex
}
