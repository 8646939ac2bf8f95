//! Domain model shared by every optimizer component: campaigns, metric
//! snapshots, health analyses, decisions, and audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Campaign and its collaborators
// ---------------------------------------------------------------------------

/// Lifecycle status of a managed campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Inactive,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    All,
}

impl Gender {
    /// Platform gender codes: 1 = male, 2 = female, empty = all.
    pub fn platform_codes(&self) -> Vec<u8> {
        match self {
            Gender::Male => vec![1],
            Gender::Female => vec![2],
            Gender::All => Vec::new(),
        }
    }
}

/// Human-readable targeting descriptor stored on the campaign. Interest
/// names are resolved to platform category ids only at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audience {
    pub interests: Vec<String>,
    pub age_min: u8,
    pub age_max: u8,
    pub gender: Gender,
}

impl Default for Audience {
    fn default() -> Self {
        Self {
            interests: Vec::new(),
            age_min: 18,
            age_max: 65,
            gender: Gender::All,
        }
    }
}

/// Product context consumed by the content-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub benefits: String,
    pub use_cases: String,
    pub price: f64,
}

/// A creative asset that can back an ad. The store tracks which creative
/// is currently live for each campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub id: Uuid,
    pub product_id: Uuid,
    /// One of "image", "video", "carousel".
    pub creative_type: String,
    pub file_hash: String,
    pub file_url: String,
    pub headline: Option<String>,
    pub ad_copy: Option<String>,
    pub cta: Option<String>,
    pub is_active: bool,
}

/// A managed campaign. The optimizer reads the whole record but mutates
/// only the fields expressible through [`CampaignUpdate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    /// Campaign id on the external ad platform.
    pub external_id: String,
    /// Primary ad-set id on the external platform, when known.
    pub adset_id: Option<String>,
    pub product_id: Uuid,
    pub name: String,
    pub objective: String,
    pub status: CampaignStatus,
    /// Daily budget in account currency.
    pub budget: f64,
    pub audience: Audience,
    pub headline: Option<String>,
    pub ad_copy: Option<String>,
    pub cta: Option<String>,
    pub creative_ids: Vec<Uuid>,
    /// Internally attributed revenue since launch.
    pub revenue: f64,
    /// Internally attributed conversions since launch.
    pub conversions: u64,
    /// Most recent metrics snapshot; overwritten every cycle.
    pub latest_metrics: Option<MetricsSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Whole days since launch, never below 1 so per-day rates stay finite.
    pub fn days_running(&self, now: DateTime<Utc>) -> u32 {
        (now - self.created_at).num_days().max(1) as u32
    }
}

/// Narrow update contract for the campaign store. Every field is optional;
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub status: Option<CampaignStatus>,
    pub budget: Option<f64>,
    pub audience: Option<Audience>,
    pub headline: Option<String>,
    pub ad_copy: Option<String>,
    pub cta: Option<String>,
    pub creative_ids: Option<Vec<Uuid>>,
    pub latest_metrics: Option<MetricsSnapshot>,
    pub external_id: Option<String>,
    pub adset_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// One cycle's view of a campaign's performance. Recomputed every cycle
/// and never kept as history; only the latest lives on the campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub impressions: u64,
    pub reach: u64,
    pub frequency: f64,
    pub clicks: u64,
    /// Click-through rate in percent.
    pub ctr: f64,
    pub cpc: f64,
    pub spend: f64,
    pub conversions: u64,
    pub revenue: f64,
    /// `revenue / spend`; 0.0 whenever spend or revenue is 0.
    pub roas: f64,
    /// `conversions / clicks * 100`; 0.0 when clicks is 0.
    pub conversion_rate: f64,
    /// `spend / conversions`; 0.0 when conversions is 0.
    pub cost_per_conversion: f64,
    /// `spend / days_running`.
    pub daily_spend: f64,
    pub days_running: u32,
    pub collected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Status bucket derived from the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Critical,
    Underperforming,
    Performing,
    Excellent,
}

impl HealthStatus {
    pub fn from_score(score: i32) -> Self {
        if score < 30 {
            HealthStatus::Critical
        } else if score < 50 {
            HealthStatus::Underperforming
        } else if score < 75 {
            HealthStatus::Performing
        } else {
            HealthStatus::Excellent
        }
    }
}

/// Diagnostic tag raised by the health analyzer. `BadAudienceMatch`,
/// `ConversionDropoff`, and `WeakCreative` are recognized by the decision
/// engine but raised by external annotators, not the analyzer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    CriticallyLowCtr,
    LowCtr,
    CreativeFatigue,
    ZeroRoasHighSpend,
    ZeroRoasEarly,
    UnprofitableRoas,
    MarginalRoas,
    HighCpc,
    ModerateCpc,
    SevereAdFatigue,
    AdFatigue,
    LowFrequencyHighSpend,
    NoConversionsSignificantSpend,
    NoConversionsModerateSpend,
    LowConversionRate,
    HighSpendLowReturn,
    ScalingOpportunity,
    MultipleIssues,
    BadAudienceMatch,
    ConversionDropoff,
    WeakCreative,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Flag::CriticallyLowCtr => "critically_low_ctr",
            Flag::LowCtr => "low_ctr",
            Flag::CreativeFatigue => "creative_fatigue",
            Flag::ZeroRoasHighSpend => "zero_roas_high_spend",
            Flag::ZeroRoasEarly => "zero_roas_early",
            Flag::UnprofitableRoas => "unprofitable_roas",
            Flag::MarginalRoas => "marginal_roas",
            Flag::HighCpc => "high_cpc",
            Flag::ModerateCpc => "moderate_cpc",
            Flag::SevereAdFatigue => "severe_ad_fatigue",
            Flag::AdFatigue => "ad_fatigue",
            Flag::LowFrequencyHighSpend => "low_frequency_high_spend",
            Flag::NoConversionsSignificantSpend => "no_conversions_significant_spend",
            Flag::NoConversionsModerateSpend => "no_conversions_moderate_spend",
            Flag::LowConversionRate => "low_conversion_rate",
            Flag::HighSpendLowReturn => "high_spend_low_return",
            Flag::ScalingOpportunity => "scaling_opportunity",
            Flag::MultipleIssues => "multiple_issues",
            Flag::BadAudienceMatch => "bad_audience_match",
            Flag::ConversionDropoff => "conversion_dropoff",
            Flag::WeakCreative => "weak_creative",
        };
        f.write_str(tag)
    }
}

/// Output of the health analyzer for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Composite health score, always clamped to [0, 100].
    pub score: i32,
    pub status: HealthStatus,
    pub flags: Vec<Flag>,
    pub recommendations: Vec<String>,
    pub priority_actions: Vec<String>,
}

impl Analysis {
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn has_any_flag(&self, flags: &[Flag]) -> bool {
        flags.iter().any(|f| self.flags.contains(f))
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The closed set of corrective actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Pause,
    Scale,
    Clone,
    EditCreative,
    ChangeAudience,
    ReviseOffer,
    OptimizeBudget,
    Wait,
}

impl Action {
    /// Static review-interval lookup, in hours.
    pub fn review_interval_hours(&self) -> u32 {
        match self {
            Action::Pause => 24,
            Action::Scale => 72,
            Action::Clone => 120,
            Action::EditCreative => 48,
            Action::ChangeAudience => 72,
            Action::ReviseOffer => 48,
            Action::OptimizeBudget => 48,
            Action::Wait => 24,
        }
    }

    /// Expected-outcome description attached to the decision.
    pub fn expected_outcome(&self, current_roas: f64) -> String {
        match self {
            Action::Pause => "Stop losses, prepare for restructure".to_string(),
            Action::Scale => format!(
                "Increase profitable returns (target: {:.1}x ROAS)",
                current_roas * 1.2
            ),
            Action::Clone => "Expand reach while maintaining performance".to_string(),
            Action::EditCreative => {
                "Improve CTR and engagement (target: 1.5%+ CTR)".to_string()
            }
            Action::ChangeAudience => "Reduce CPC, improve conversion rate".to_string(),
            Action::ReviseOffer => "Increase conversion rate (target: 2%+)".to_string(),
            Action::OptimizeBudget => "Improve cost efficiency".to_string(),
            Action::Wait => "Gather sufficient data for informed decisions".to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Pause => "pause",
            Action::Scale => "scale",
            Action::Clone => "clone",
            Action::EditCreative => "edit_creative",
            Action::ChangeAudience => "change_audience",
            Action::ReviseOffer => "revise_offer",
            Action::OptimizeBudget => "optimize_budget",
            Action::Wait => "wait",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// How much signal backs the decision, from spend / conversions /
/// days-running sufficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Compact metric summary embedded in decisions and audit logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub roas: f64,
    pub spend: f64,
    pub conversions: u64,
    pub score: i32,
}

/// One cycle's verdict for one campaign. Never persisted beyond the cycle
/// that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub campaign_id: Uuid,
    pub external_id: String,
    pub action: Action,
    pub reason: String,
    pub priority: Priority,
    pub confidence: Confidence,
    pub next_review_hours: u32,
    pub expected_outcome: String,
    pub summary: MetricsSummary,
    pub flags: Vec<Flag>,
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Append-only audit record written after every successfully executed
/// mutating action. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationLog {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub product_id: Uuid,
    pub action: Action,
    pub reason: String,
    /// Metric summary captured at decision time.
    pub metrics_snapshot: MetricsSummary,
    pub creative_used: Option<Uuid>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Action results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Executed,
    HumanAssist,
    Waiting,
    Noop,
    Failed,
}

/// Direction of a budget-optimization move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetMove {
    ScaleUp,
    Maintain,
    ScaleDown,
}

/// Structured suggestion payload for the human-assist offer revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRevisionAssist {
    pub product_name: String,
    pub current_price: f64,
    pub current_value_prop: String,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub roas: f64,
    pub reason: String,
    pub revision_template: OfferRevisionTemplate,
}

/// Fill-in-the-blanks template handed to a human reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRevisionTemplate {
    pub suggested_price: String,
    pub new_offer_bonus: String,
    pub urgency_hook: String,
    pub value_messaging: String,
    pub landing_page_tip: String,
}

impl Default for OfferRevisionTemplate {
    fn default() -> Self {
        Self {
            suggested_price: "[Your new price here]".to_string(),
            new_offer_bonus: "[Add bonus/extra here]".to_string(),
            urgency_hook: "[Add scarcity angle]".to_string(),
            value_messaging: "[Rewrite the pitch or hook]".to_string(),
            landing_page_tip: "[Suggest tweaks to boost trust or CTA]".to_string(),
        }
    }
}

/// What the dispatcher actually did, one variant per action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    Paused {
        already_paused: bool,
    },
    Scaled {
        adset_id: String,
        scale_percent: u32,
        old_budget: f64,
        new_budget: f64,
    },
    Cloned {
        new_external_id: String,
        new_campaign_id: Uuid,
    },
    CreativeRefreshed {
        old_ad_id: Option<String>,
        new_ad_id: String,
        platform_creative_id: String,
        creative_id: Uuid,
        headline: String,
    },
    AudienceChanged {
        adset_id: String,
        audience: Audience,
    },
    OfferRevision {
        assist: OfferRevisionAssist,
    },
    BudgetAdjusted {
        adset_id: String,
        direction: BudgetMove,
        old_budget: f64,
        new_budget: f64,
    },
    Waiting,
}

/// Terminal result of dispatching one decision. Handlers fail gracefully:
/// an external error becomes `status: Failed` with the error string, never
/// a panic or propagated `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub campaign_id: Uuid,
    pub action: Action,
    pub status: ActionStatus,
    pub outcome: Option<ActionOutcome>,
    pub error: Option<String>,
    pub message: String,
}

impl ActionResult {
    pub fn executed(
        campaign_id: Uuid,
        action: Action,
        outcome: ActionOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            campaign_id,
            action,
            status: ActionStatus::Executed,
            outcome: Some(outcome),
            error: None,
            message: message.into(),
        }
    }

    pub fn human_assist(
        campaign_id: Uuid,
        action: Action,
        outcome: ActionOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            campaign_id,
            action,
            status: ActionStatus::HumanAssist,
            outcome: Some(outcome),
            error: None,
            message: message.into(),
        }
    }

    pub fn waiting(campaign_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            campaign_id,
            action: Action::Wait,
            status: ActionStatus::Waiting,
            outcome: Some(ActionOutcome::Waiting),
            error: None,
            message: message.into(),
        }
    }

    pub fn noop(campaign_id: Uuid, action: Action, message: impl Into<String>) -> Self {
        Self {
            campaign_id,
            action,
            status: ActionStatus::Noop,
            outcome: None,
            error: None,
            message: message.into(),
        }
    }

    pub fn failed(campaign_id: Uuid, action: Action, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            campaign_id,
            action,
            status: ActionStatus::Failed,
            outcome: None,
            message: format!("{} failed: {}", action, error),
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == ActionStatus::Failed
    }
}

// ---------------------------------------------------------------------------
// Interest resolution
// ---------------------------------------------------------------------------

/// A platform interest category resolved from a human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestId {
    pub id: String,
    pub name: String,
}
