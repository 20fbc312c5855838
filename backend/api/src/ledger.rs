//! Campaign ledger: creation, lookup, updates, deletion, and the status
//! state machine.
//!
//! Status is never recomputed by a background job. Every read and write
//! path calls [`reconcile_status`] synchronously, so staleness is bounded
//! by the next operation that touches the campaign.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;
use url::Url;

use crate::db;
use crate::errors::{ApiError, Result};
use crate::models::{
    Campaign, CampaignDetail, CampaignStatus, CampaignUpdate, Category, NewCampaign,
};

// ─────────────────────────────────────────────────────────
// Field validation
// ─────────────────────────────────────────────────────────

fn non_empty(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn valid_target(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::validation(
            "target_amount",
            "must be a non-negative number",
        ));
    }
    Ok(amount)
}

fn valid_duration(days: i64) -> Result<i64> {
    if days < 1 {
        return Err(ApiError::validation("duration_days", "must be at least 1 day"));
    }
    Ok(days)
}

fn valid_category(name: &str) -> Result<Category> {
    Category::parse(name)
        .ok_or_else(|| ApiError::validation("category", format!("unknown category: {name}")))
}

fn valid_image_url(raw: &str) -> Result<String> {
    Url::parse(raw).map_err(|e| ApiError::validation("image_url", format!("invalid URL: {e}")))?;
    Ok(raw.to_string())
}

// ─────────────────────────────────────────────────────────
// Status state machine
// ─────────────────────────────────────────────────────────

/// Recompute the lifecycle status from the campaign's monetary state and
/// deadline. `completed` and `cancelled` are terminal; an active campaign
/// completes once the deadline passes or the target is reached. Idempotent.
pub fn reconcile_status(campaign: &Campaign, now: DateTime<Utc>) -> CampaignStatus {
    match campaign.status {
        CampaignStatus::Completed => CampaignStatus::Completed,
        CampaignStatus::Cancelled => CampaignStatus::Cancelled,
        CampaignStatus::Active => {
            if campaign.has_ended(now) || campaign.current_amount >= campaign.target_amount {
                CampaignStatus::Completed
            } else {
                CampaignStatus::Active
            }
        }
    }
}

/// Reconcile in place and persist the status if it changed.
pub async fn refresh_status(
    pool: &SqlitePool,
    campaign: &mut Campaign,
    now: DateTime<Utc>,
) -> Result<()> {
    let next = reconcile_status(campaign, now);
    if next != campaign.status {
        db::set_status(pool, campaign.id, next).await?;
        info!("Campaign {} moved to {next}", campaign.id);
        campaign.status = next;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────

/// Create a campaign from a validated creation request.
pub async fn create(pool: &SqlitePool, input: NewCampaign) -> Result<Campaign> {
    let title = non_empty("title", &input.title)?;
    let description = non_empty("description", &input.description)?;
    let target_amount = valid_target(input.target_amount)?;
    let duration_days = valid_duration(input.duration_days)?;
    let category = valid_category(&input.category)?;
    let image_url = valid_image_url(&input.image_url)?;
    let creator = match input.creator {
        Some(name) => non_empty("creator", &name)?,
        None => "Anonymous".to_string(),
    };

    let now = Utc::now();
    let mut campaign = Campaign {
        id: 0, // assigned by the database
        title,
        description,
        target_amount,
        current_amount: 0.0,
        duration_days,
        category,
        image_url,
        creator,
        status: CampaignStatus::Active,
        start_date: now,
        end_date: now + Duration::days(duration_days),
        created_at: now,
    };
    // Creation is a write path like any other, so it reconciles too:
    // a zero-target campaign is born completed.
    campaign.status = reconcile_status(&campaign, now);

    campaign.id = db::insert_campaign(pool, &campaign).await?;
    info!(
        "Created {} campaign {} with target {}",
        campaign.category.as_str(),
        campaign.id,
        campaign.target_amount
    );
    Ok(campaign)
}

/// Fetch one campaign with its donations, newest first.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<CampaignDetail> {
    let mut campaign = db::get_campaign(pool, id)
        .await?
        .ok_or(ApiError::NotFound(id))?;
    let now = Utc::now();
    refresh_status(pool, &mut campaign, now).await?;
    let donations = db::donations_for_campaign(pool, id).await?;
    Ok(CampaignDetail::new(campaign, donations, now))
}

/// Fetch all campaigns with their donations, newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<CampaignDetail>> {
    let campaigns = db::list_campaigns(pool).await?;
    let now = Utc::now();
    let mut details = Vec::with_capacity(campaigns.len());
    for mut campaign in campaigns {
        refresh_status(pool, &mut campaign, now).await?;
        let donations = db::donations_for_campaign(pool, campaign.id).await?;
        details.push(CampaignDetail::new(campaign, donations, now));
    }
    Ok(details)
}

/// Apply a partial update.
///
/// Field edits require an active campaign. The only status a caller may
/// request is `cancelled`; everything else about the status is derived.
pub async fn update(pool: &SqlitePool, id: i64, patch: CampaignUpdate) -> Result<Campaign> {
    let mut campaign = db::get_campaign(pool, id)
        .await?
        .ok_or(ApiError::NotFound(id))?;
    let now = Utc::now();
    refresh_status(pool, &mut campaign, now).await?;

    let has_field_edits = patch.title.is_some()
        || patch.description.is_some()
        || patch.target_amount.is_some()
        || patch.duration_days.is_some()
        || patch.category.is_some()
        || patch.image_url.is_some()
        || patch.creator.is_some();

    if has_field_edits && campaign.status != CampaignStatus::Active {
        return Err(ApiError::InvalidState {
            id,
            status: campaign.status,
        });
    }

    if let Some(title) = &patch.title {
        campaign.title = non_empty("title", title)?;
    }
    if let Some(description) = &patch.description {
        campaign.description = non_empty("description", description)?;
    }
    if let Some(target) = patch.target_amount {
        campaign.target_amount = valid_target(target)?;
    }
    if let Some(days) = patch.duration_days {
        // `end_date` stays as derived at creation.
        campaign.duration_days = valid_duration(days)?;
    }
    if let Some(category) = &patch.category {
        campaign.category = valid_category(category)?;
    }
    if let Some(image_url) = &patch.image_url {
        campaign.image_url = valid_image_url(image_url)?;
    }
    if let Some(creator) = &patch.creator {
        campaign.creator = non_empty("creator", creator)?;
    }

    if let Some(requested) = &patch.status {
        let requested = CampaignStatus::parse(requested).ok_or_else(|| {
            ApiError::validation("status", format!("unknown status: {requested}"))
        })?;
        if requested != CampaignStatus::Cancelled {
            return Err(ApiError::validation(
                "status",
                "status can only be set to cancelled",
            ));
        }
        if campaign.status != CampaignStatus::Active {
            return Err(ApiError::InvalidState {
                id,
                status: campaign.status,
            });
        }
        campaign.status = CampaignStatus::Cancelled;
        info!("Campaign {id} cancelled");
    }

    // Lowering the target below the raised amount completes the campaign.
    campaign.status = reconcile_status(&campaign, now);
    db::update_campaign(pool, &campaign).await?;
    Ok(campaign)
}

/// Delete a campaign; its donations are removed by the cascade.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let removed = db::delete_campaign(pool, id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound(id));
    }
    info!("Deleted campaign {id}");
    Ok(())
}
