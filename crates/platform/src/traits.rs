//! Contracts for the external collaborators the optimizer depends on.
//! Everything here is injected as a trait object so components can be
//! exercised against test doubles; no global client state.

use adpilot_core::error::PlatformError;
use adpilot_core::types::{Audience, InterestId, Product};
use adpilot_core::OptimizeResult;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ad platform boundary types
// ---------------------------------------------------------------------------

/// Reporting window for an insights query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingWindow {
    Today,
    Yesterday,
    Last7d,
}

impl ReportingWindow {
    pub fn as_preset(&self) -> &'static str {
        match self {
            ReportingWindow::Today => "today",
            ReportingWindow::Yesterday => "yesterday",
            ReportingWindow::Last7d => "last_7d",
        }
    }
}

/// Raw performance counters for one campaign, as reported by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightsRow {
    pub campaign_name: String,
    pub impressions: u64,
    pub reach: u64,
    pub frequency: f64,
    pub clicks: u64,
    /// Click-through rate in percent.
    pub ctr: f64,
    pub cpc: f64,
    pub spend: f64,
}

/// A budgeted ad set within an external campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSet {
    pub id: String,
    pub daily_budget: f64,
}

/// External delivery status understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalStatus {
    Active,
    Paused,
}

/// Targeting payload in the platform's own shape: numeric gender codes and
/// resolved interest category ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformTargeting {
    pub age_min: u8,
    pub age_max: u8,
    pub genders: Vec<u8>,
    pub interests: Vec<InterestId>,
}

impl PlatformTargeting {
    pub fn from_audience(audience: &Audience, interests: Vec<InterestId>) -> Self {
        Self {
            age_min: audience.age_min,
            age_max: audience.age_max,
            genders: audience.gender.platform_codes(),
            interests,
        }
    }
}

/// Payload for creating a new platform creative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeSpec {
    pub name: String,
    pub headline: String,
    pub ad_copy: String,
    pub cta: String,
    pub image_hash: String,
}

/// External ad platform API. All calls are synchronous, credential-bearing,
/// network-bound, and carry the configured request timeout. Failures
/// surface as [`PlatformError`], never as panics.
pub trait AdPlatform: Send + Sync {
    /// Fetch raw performance counters for a campaign over a window.
    fn get_insights(
        &self,
        external_id: &str,
        window: ReportingWindow,
    ) -> Result<InsightsRow, PlatformError>;

    /// Resolve the campaign's primary (first) ad set.
    fn primary_adset(&self, external_id: &str) -> Result<AdSet, PlatformError>;

    /// Set a new daily budget on an ad set.
    fn update_budget(&self, adset_id: &str, daily_budget: f64) -> Result<(), PlatformError>;

    /// Replace the targeting descriptor on an ad set.
    fn update_targeting(
        &self,
        adset_id: &str,
        targeting: &PlatformTargeting,
    ) -> Result<(), PlatformError>;

    /// Change a campaign's delivery status.
    fn set_status(&self, external_id: &str, status: ExternalStatus) -> Result<(), PlatformError>;

    /// Deep-copy a campaign, appending `suffix` to its name. Returns the new
    /// external campaign id.
    fn copy_campaign(&self, external_id: &str, suffix: &str) -> Result<String, PlatformError>;

    /// Create a platform creative; returns its id.
    fn create_creative(&self, spec: &CreativeSpec) -> Result<String, PlatformError>;

    /// Pause the currently active ad in an ad set, if any. Returns the
    /// paused ad's id.
    fn pause_active_ad(&self, adset_id: &str) -> Result<Option<String>, PlatformError>;

    /// Create a new ad referencing an existing creative; returns the ad id.
    fn create_ad(
        &self,
        adset_id: &str,
        creative_id: &str,
        name: &str,
    ) -> Result<String, PlatformError>;

    /// Resolve human-readable interest names to platform category ids.
    /// Names the platform does not recognize are dropped.
    fn resolve_interests(&self, names: &[String]) -> Result<Vec<InterestId>, PlatformError>;
}

// ---------------------------------------------------------------------------
// Content generation boundary
// ---------------------------------------------------------------------------

/// Generated headline / copy / call-to-action for a creative refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySuggestion {
    pub headline: String,
    pub ad_copy: String,
    pub cta: String,
}

/// Generated replacement audience for a targeting refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceSuggestion {
    pub interests: Vec<String>,
    pub age_min: u8,
    pub age_max: u8,
    pub gender: adpilot_core::types::Gender,
}

/// Prior creative state handed to the generator so it can improve on what
/// underperformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyContext {
    pub previous_headline: Option<String>,
    pub previous_ad_copy: Option<String>,
    pub previous_cta: Option<String>,
}

/// Content-generation collaborator. A non-parseable response is surfaced as
/// `OptimizeError::ContentGeneration`; it fails the requesting action only.
pub trait ContentGenerator: Send + Sync {
    fn generate_copy(&self, product: &Product, prior: &CopyContext)
        -> OptimizeResult<CopySuggestion>;

    fn generate_audience(
        &self,
        product: &Product,
        previous: &Audience,
        reason: &str,
    ) -> OptimizeResult<AudienceSuggestion>;
}

// ---------------------------------------------------------------------------
// Notifier boundary
// ---------------------------------------------------------------------------

/// Fire-and-forget alerting. A notifier failure is logged and swallowed by
/// callers; it never affects an action's result.
pub trait Notifier: Send + Sync {
    fn send_alert(&self, subject: &str, body: &str) -> anyhow::Result<()>;
}
