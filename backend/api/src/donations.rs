//! Donation recorder: validates contributions and applies them to the
//! campaign ledger atomically.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::errors::{ApiError, Result};
use crate::ledger;
use crate::models::{Campaign, CampaignStatus};

/// Record a donation against an active campaign and return the updated
/// campaign.
///
/// The donation row and the growth of `current_amount` commit in a single
/// transaction, and the increment is evaluated server-side so concurrent
/// donors never lose updates to a stale read. Over-funding is allowed: the
/// final donation is applied in full even when it pushes past the target,
/// after which the campaign completes and further donations are rejected.
pub async fn record_donation(
    pool: &SqlitePool,
    campaign_id: i64,
    amount: f64,
    donor: &str,
) -> Result<Campaign> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::validation("amount", "must be a positive number"));
    }
    let donor = donor.trim();
    if donor.is_empty() {
        return Err(ApiError::validation("donor", "must not be empty"));
    }

    let campaign = db::get_campaign(pool, campaign_id)
        .await?
        .ok_or(ApiError::NotFound(campaign_id))?;

    // Eligibility is judged on the reconciled status, not the stored column:
    // a campaign past its deadline stops accepting donations even if no
    // write has flipped the row yet.
    let now = Utc::now();
    let status = ledger::reconcile_status(&campaign, now);
    if status != campaign.status {
        db::set_status(pool, campaign_id, status).await?;
    }
    if status != CampaignStatus::Active {
        return Err(ApiError::InvalidState {
            id: campaign_id,
            status,
        });
    }

    let mut tx = pool.begin().await?;
    db::insert_donation(&mut *tx, campaign_id, amount, donor, now).await?;
    db::increment_current_amount(&mut *tx, campaign_id, amount).await?;
    tx.commit().await?;

    // Re-read the committed amount before reconciling, so a donation that
    // reaches the target flips the campaign to completed right away.
    let mut updated = db::get_campaign(pool, campaign_id)
        .await?
        .ok_or(ApiError::NotFound(campaign_id))?;
    ledger::refresh_status(pool, &mut updated, now).await?;

    info!(
        "Recorded donation of {amount} for campaign {campaign_id}, total now {}",
        updated.current_amount
    );
    Ok(updated)
}
