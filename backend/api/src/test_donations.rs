use std::str::FromStr;

use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::db;
use crate::donations;
use crate::errors::ApiError;
use crate::ledger;
use crate::models::{CampaignStatus, CampaignUpdate, NewCampaign};

/// In-memory SQLite gives every pooled connection its own database, so the
/// test pool is capped at a single connection.
async fn setup() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn solar_stoves() -> NewCampaign {
    NewCampaign {
        title: "Solar Stoves for the Shelter".to_string(),
        description: "Replace gas burners with solar stoves".to_string(),
        target_amount: 100.0,
        duration_days: 14,
        category: "Social".to_string(),
        image_url: "https://example.com/stoves.jpg".to_string(),
        creator: Some("Shelter Collective".to_string()),
    }
}

#[tokio::test]
async fn donations_accumulate_until_the_target_completes() {
    let pool = setup().await;
    let campaign = ledger::create(&pool, solar_stoves()).await.unwrap();

    let after_first = donations::record_donation(&pool, campaign.id, 60.0, "Ada")
        .await
        .unwrap();
    assert_eq!(after_first.current_amount, 60.0);
    assert_eq!(after_first.status, CampaignStatus::Active);

    let after_second = donations::record_donation(&pool, campaign.id, 40.0, "Grace")
        .await
        .unwrap();
    assert_eq!(after_second.current_amount, 100.0);
    assert_eq!(after_second.status, CampaignStatus::Completed);

    let err = donations::record_donation(&pool, campaign.id, 1.0, "Latecomer")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState { .. }));

    // The rejected donation left the ledger untouched.
    let detail = ledger::get(&pool, campaign.id).await.unwrap();
    assert_eq!(detail.campaign.current_amount, 100.0);
    assert_eq!(detail.donations.len(), 2);
}

#[tokio::test]
async fn rejects_invalid_amount_and_donor() {
    let pool = setup().await;
    let campaign = ledger::create(&pool, solar_stoves()).await.unwrap();

    let err = donations::record_donation(&pool, campaign.id, 0.0, "Ada")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { field: "amount", .. }));

    let err = donations::record_donation(&pool, campaign.id, -5.0, "Ada")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { field: "amount", .. }));

    let err = donations::record_donation(&pool, campaign.id, 10.0, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { field: "donor", .. }));

    let detail = ledger::get(&pool, campaign.id).await.unwrap();
    assert_eq!(detail.campaign.current_amount, 0.0);
    assert!(detail.donations.is_empty());
}

#[tokio::test]
async fn donating_to_missing_campaign_is_not_found() {
    let pool = setup().await;
    let err = donations::record_donation(&pool, 99, 10.0, "Ada")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(99)));
}

#[tokio::test]
async fn cancelled_campaigns_reject_donations() {
    let pool = setup().await;
    let campaign = ledger::create(&pool, solar_stoves()).await.unwrap();

    let cancel = CampaignUpdate {
        status: Some("cancelled".to_string()),
        ..CampaignUpdate::default()
    };
    ledger::update(&pool, campaign.id, cancel).await.unwrap();

    let err = donations::record_donation(&pool, campaign.id, 10.0, "Ada")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InvalidState {
            status: CampaignStatus::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn past_deadline_rejects_and_persists_completion() {
    let pool = setup().await;
    let campaign = ledger::create(&pool, solar_stoves()).await.unwrap();

    sqlx::query("UPDATE campaigns SET end_date = ?1 WHERE id = ?2")
        .bind(Utc::now() - Duration::hours(1))
        .bind(campaign.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = donations::record_donation(&pool, campaign.id, 10.0, "Ada")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::InvalidState {
            status: CampaignStatus::Completed,
            ..
        }
    ));

    // The rejection still flipped the stale row.
    let stored = db::get_campaign(&pool, campaign.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CampaignStatus::Completed);
    assert_eq!(stored.current_amount, 0.0);
}

#[tokio::test]
async fn final_donation_may_overshoot_the_target() {
    let pool = setup().await;
    let campaign = ledger::create(&pool, solar_stoves()).await.unwrap();

    let updated = donations::record_donation(&pool, campaign.id, 150.0, "Whale")
        .await
        .unwrap();
    assert_eq!(updated.current_amount, 150.0);
    assert_eq!(updated.status, CampaignStatus::Completed);
}

#[tokio::test]
async fn donations_are_listed_newest_first() {
    let pool = setup().await;
    let campaign = ledger::create(&pool, solar_stoves()).await.unwrap();
    donations::record_donation(&pool, campaign.id, 10.0, "Ada")
        .await
        .unwrap();
    donations::record_donation(&pool, campaign.id, 20.0, "Grace")
        .await
        .unwrap();

    let detail = ledger::get(&pool, campaign.id).await.unwrap();
    let donors: Vec<&str> = detail.donations.iter().map(|d| d.donor.as_str()).collect();
    assert_eq!(donors, ["Grace", "Ada"]);
}

#[tokio::test]
async fn concurrent_donations_are_never_lost() {
    let pool = setup().await;
    let campaign = ledger::create(
        &pool,
        NewCampaign {
            target_amount: 10_000.0,
            ..solar_stoves()
        },
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let pool = pool.clone();
        let id = campaign.id;
        handles.push(tokio::spawn(async move {
            donations::record_donation(&pool, id, 5.0, &format!("donor-{i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let detail = ledger::get(&pool, campaign.id).await.unwrap();
    assert_eq!(detail.campaign.current_amount, 50.0);
    assert_eq!(detail.donations.len(), 10);
}
