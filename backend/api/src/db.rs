//! Database layer: pool construction, migrations, and all SQL.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::models::{Campaign, CampaignStatus, Donation};

/// Establish a SQLite connection pool and run pending migrations.
///
/// Foreign keys are enabled on every connection so deleting a campaign
/// cascades to its donations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // Make sure the file is created if it doesn't exist yet.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Campaign writes
// ─────────────────────────────────────────────────────────

/// Insert a campaign draft; returns the id assigned by the database.
pub async fn insert_campaign(pool: &SqlitePool, c: &Campaign) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO campaigns
            (title, description, target_amount, current_amount, duration_days,
             category, image_url, creator, status, start_date, end_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&c.title)
    .bind(&c.description)
    .bind(c.target_amount)
    .bind(c.current_amount)
    .bind(c.duration_days)
    .bind(c.category)
    .bind(&c.image_url)
    .bind(&c.creator)
    .bind(c.status)
    .bind(c.start_date)
    .bind(c.end_date)
    .bind(c.created_at)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Persist the mutable columns of a campaign.
///
/// `current_amount` is deliberately absent: it only ever grows through
/// [`increment_current_amount`].
pub async fn update_campaign(pool: &SqlitePool, c: &Campaign) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE campaigns
        SET    title = ?1, description = ?2, target_amount = ?3, duration_days = ?4,
               category = ?5, image_url = ?6, creator = ?7, status = ?8
        WHERE  id = ?9
        "#,
    )
    .bind(&c.title)
    .bind(&c.description)
    .bind(c.target_amount)
    .bind(c.duration_days)
    .bind(c.category)
    .bind(&c.image_url)
    .bind(&c.creator)
    .bind(c.status)
    .bind(c.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist a reconciled status.
pub async fn set_status(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    status: CampaignStatus,
) -> Result<()> {
    sqlx::query("UPDATE campaigns SET status = ?1 WHERE id = ?2")
        .bind(status)
        .bind(id)
        .execute(ex)
        .await?;
    Ok(())
}

/// Grow `current_amount` with a server-side increment. The arithmetic runs
/// in the database, never on a value read into the application, so
/// concurrent donations cannot lose updates.
pub async fn increment_current_amount(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    amount: f64,
) -> Result<()> {
    sqlx::query("UPDATE campaigns SET current_amount = current_amount + ?1 WHERE id = ?2")
        .bind(amount)
        .bind(id)
        .execute(ex)
        .await?;
    Ok(())
}

/// Delete a campaign; donations go with it via the cascade.
/// Returns the number of campaign rows removed.
pub async fn delete_campaign(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM campaigns WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// ─────────────────────────────────────────────────────────
// Campaign reads
// ─────────────────────────────────────────────────────────

pub async fn get_campaign(ex: impl SqliteExecutor<'_>, id: i64) -> Result<Option<Campaign>> {
    let row = sqlx::query_as::<_, Campaign>(
        r#"
        SELECT id, title, description, target_amount, current_amount, duration_days,
               category, image_url, creator, status, start_date, end_date, created_at
        FROM   campaigns
        WHERE  id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(ex)
    .await?;
    Ok(row)
}

/// Fetch all campaigns, newest first.
pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<Campaign>> {
    let rows = sqlx::query_as::<_, Campaign>(
        r#"
        SELECT id, title, description, target_amount, current_amount, duration_days,
               category, image_url, creator, status, start_date, end_date, created_at
        FROM   campaigns
        ORDER  BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Donations
// ─────────────────────────────────────────────────────────

/// Append a donation row; returns the id assigned by the database.
pub async fn insert_donation(
    ex: impl SqliteExecutor<'_>,
    campaign_id: i64,
    amount: f64,
    donor: &str,
    date: DateTime<Utc>,
) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO donations (campaign_id, amount, donor, date) VALUES (?1, ?2, ?3, ?4)")
            .bind(campaign_id)
            .bind(amount)
            .bind(donor)
            .bind(date)
            .execute(ex)
            .await?;
    Ok(result.last_insert_rowid())
}

/// Fetch a campaign's donations, newest first.
pub async fn donations_for_campaign(pool: &SqlitePool, campaign_id: i64) -> Result<Vec<Donation>> {
    let rows = sqlx::query_as::<_, Donation>(
        r#"
        SELECT id, campaign_id, amount, donor, date
        FROM   donations
        WHERE  campaign_id = ?1
        ORDER  BY date DESC, id DESC
        "#,
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
