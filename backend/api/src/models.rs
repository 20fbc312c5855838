//! Campaign and donation records plus the enumerations that govern them.
//!
//! The campaign lifecycle is strictly forward-only:
//!
//! ```text
//! active ──► completed   (target reached or deadline passed)
//! active ──► cancelled   (explicit cancellation)
//! ```
//!
//! `completed` and `cancelled` are terminal; no transition reopens them.
//! The transition rule itself lives in [`crate::ledger::reconcile_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a campaign. Derived and updated by the ledger,
/// never freely settable by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Accepting donations.
    Active,
    /// Target reached or deadline passed.
    Completed,
    /// Explicitly cancelled by the creator.
    Cancelled,
}

impl CampaignStatus {
    /// Parse the status keyword used on the wire and in the database.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed set of campaign categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Category {
    Environment,
    Education,
    Healthcare,
    Technology,
    Arts,
    Social,
    Other,
}

impl Category {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Environment" => Some(Self::Environment),
            "Education" => Some(Self::Education),
            "Healthcare" => Some(Self::Healthcare),
            "Technology" => Some(Self::Technology),
            "Arts" => Some(Self::Arts),
            "Social" => Some(Self::Social),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "Environment",
            Self::Education => "Education",
            Self::Healthcare => "Healthcare",
            Self::Technology => "Technology",
            Self::Arts => "Arts",
            Self::Social => "Social",
            Self::Other => "Other",
        }
    }
}

/// A fundraising campaign as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    /// Monotonically non-decreasing; grown only via the donation recorder.
    pub current_amount: f64,
    /// Used only to derive `end_date` at creation.
    pub duration_days: i64,
    pub category: Category,
    pub image_url: String,
    pub creator: String,
    pub status: CampaignStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Fraction of the target reached, as a percentage clamped to 100.
    /// A zero-target campaign counts as fully funded.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount > 0.0 {
            (self.current_amount / self.target_amount * 100.0).min(100.0)
        } else {
            100.0
        }
    }

    /// Whole days until the deadline, floored at zero.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.end_date - now).num_days().max(0)
    }

    /// Whether the deadline has passed.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }
}

/// A single contribution tied to exactly one campaign.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Donation {
    pub id: i64,
    pub campaign_id: i64,
    pub amount: f64,
    pub donor: String,
    pub date: DateTime<Utc>,
}

/// Creation request for a campaign. Category arrives as free text and is
/// parsed by the ledger so unknown values surface as validation failures.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub duration_days: i64,
    pub category: String,
    pub image_url: String,
    #[serde(default)]
    pub creator: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CampaignUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub duration_days: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub creator: Option<String>,
    /// The only accepted value is "cancelled".
    pub status: Option<String>,
}

/// A campaign joined with its donations (newest first) and the derived
/// progress state the ledger computes on reads.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub progress_percent: f64,
    pub days_remaining: i64,
    pub ended: bool,
    pub donations: Vec<Donation>,
}

impl CampaignDetail {
    pub fn new(campaign: Campaign, donations: Vec<Donation>, now: DateTime<Utc>) -> Self {
        let progress_percent = campaign.progress_percent();
        let days_remaining = campaign.days_remaining(now);
        let ended = campaign.has_ended(now);
        Self {
            campaign,
            progress_percent,
            days_remaining,
            ended,
            donations,
        }
    }
}
