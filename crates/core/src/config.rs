//! Optimizer configuration. Every numeric threshold used by the analyzer,
//! decision engine, and budget handler lives here so behavior can be tuned
//! and tested independently of control-flow code. Loaded from environment
//! variables with the prefix `ADPILOT__`.

use serde::Deserialize;

/// Root configuration for the optimization loop.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Ruleset version; bump when any threshold group changes meaning.
    #[serde(default = "default_ruleset_version")]
    pub version: u32,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

fn default_ruleset_version() -> u32 {
    1
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            version: default_ruleset_version(),
            scoring: ScoringConfig::default(),
            decision: DecisionConfig::default(),
            budget: BudgetConfig::default(),
            scheduler: SchedulerConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADPILOT")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );
        let config = builder.build()?;
        config.try_deserialize()
    }
}

// ─── Scoring thresholds ─────────────────────────────────────────────────────
//
// The analyzer applies these groups in a fixed order (CTR, fatigue compound,
// ROAS, CPC, frequency, conversions, velocity, compound). The adjustments
// are not commutative; the order is part of the scoring contract.

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_baseline")]
    pub baseline: i32,
    #[serde(default)]
    pub ctr: CtrScoring,
    #[serde(default)]
    pub fatigue: FatigueCompound,
    #[serde(default)]
    pub roas: RoasScoring,
    #[serde(default)]
    pub cpc: CpcScoring,
    #[serde(default)]
    pub frequency: FrequencyScoring,
    #[serde(default)]
    pub conversion: ConversionScoring,
    #[serde(default)]
    pub velocity: VelocityScoring,
    #[serde(default)]
    pub compound: CompoundScoring,
}

fn default_baseline() -> i32 {
    50
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            ctr: CtrScoring::default(),
            fatigue: FatigueCompound::default(),
            roas: RoasScoring::default(),
            cpc: CpcScoring::default(),
            frequency: FrequencyScoring::default(),
            conversion: ConversionScoring::default(),
            velocity: VelocityScoring::default(),
            compound: CompoundScoring::default(),
        }
    }
}

/// CTR tiers in percent, with the weight applied per tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CtrScoring {
    pub critical_below: f64,
    pub low_below: f64,
    pub decent_below: f64,
    pub strong_below: f64,
    pub critical_penalty: i32,
    pub low_penalty: i32,
    pub decent_bonus: i32,
    pub strong_bonus: i32,
    pub excellent_bonus: i32,
}

impl Default for CtrScoring {
    fn default() -> Self {
        Self {
            critical_below: 0.5,
            low_below: 0.9,
            decent_below: 1.5,
            strong_below: 2.5,
            critical_penalty: 25,
            low_penalty: 15,
            decent_bonus: 5,
            strong_bonus: 15,
            excellent_bonus: 20,
        }
    }
}

/// Low CTR together with high frequency flags creative fatigue, independent
/// of the CTR-only penalty.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FatigueCompound {
    pub ctr_below: f64,
    pub frequency_above: f64,
}

impl Default for FatigueCompound {
    fn default() -> Self {
        Self {
            ctr_below: 1.0,
            frequency_above: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoasScoring {
    /// Spend above which a zero ROAS is a severe signal rather than noise.
    pub zero_spend_floor: f64,
    pub zero_high_penalty: i32,
    pub zero_early_penalty: i32,
    pub breakeven_below: f64,
    pub unprofitable_penalty: i32,
    pub marginal_below: f64,
    pub good_below: f64,
    pub good_bonus: i32,
    pub excellent_bonus: i32,
}

impl Default for RoasScoring {
    fn default() -> Self {
        Self {
            zero_spend_floor: 15.0,
            zero_high_penalty: 30,
            zero_early_penalty: 10,
            breakeven_below: 2.0,
            unprofitable_penalty: 20,
            marginal_below: 3.0,
            good_below: 5.0,
            good_bonus: 20,
            excellent_bonus: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CpcScoring {
    pub high_above: f64,
    pub moderate_above: f64,
    pub fair_above: f64,
    pub high_penalty: i32,
    pub moderate_penalty: i32,
    pub fair_bonus: i32,
    pub efficient_bonus: i32,
}

impl Default for CpcScoring {
    fn default() -> Self {
        Self {
            high_above: 2.0,
            moderate_above: 1.0,
            fair_above: 0.5,
            high_penalty: 15,
            moderate_penalty: 5,
            fair_bonus: 5,
            efficient_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrequencyScoring {
    pub severe_at: f64,
    pub high_at: f64,
    pub optimal_at: f64,
    pub low_below: f64,
    /// Spend above which a low frequency hints the audience is too broad.
    pub broad_spend_floor: f64,
    pub severe_penalty: i32,
    pub high_penalty: i32,
    pub optimal_bonus: i32,
    pub broad_penalty: i32,
    pub fresh_bonus: i32,
}

impl Default for FrequencyScoring {
    fn default() -> Self {
        Self {
            severe_at: 3.5,
            high_at: 2.0,
            optimal_at: 1.5,
            low_below: 1.2,
            broad_spend_floor: 20.0,
            severe_penalty: 25,
            high_penalty: 15,
            optimal_bonus: 5,
            broad_penalty: 5,
            fresh_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionScoring {
    pub significant_spend: f64,
    pub moderate_spend: f64,
    pub significant_penalty: i32,
    pub moderate_penalty: i32,
    pub early_penalty: i32,
    /// Conversion-rate tiers in percent.
    pub low_rate_below: f64,
    pub fair_rate_below: f64,
    pub good_rate_below: f64,
    pub low_rate_penalty: i32,
    pub good_rate_bonus: i32,
    pub excellent_rate_bonus: i32,
}

impl Default for ConversionScoring {
    fn default() -> Self {
        Self {
            significant_spend: 15.0,
            moderate_spend: 10.0,
            significant_penalty: 35,
            moderate_penalty: 20,
            early_penalty: 5,
            low_rate_below: 1.0,
            fair_rate_below: 2.0,
            good_rate_below: 5.0,
            low_rate_penalty: 15,
            good_rate_bonus: 10,
            excellent_rate_bonus: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VelocityScoring {
    pub high_daily_spend: f64,
    pub low_return_roas: f64,
    pub high_spend_penalty: i32,
    pub low_daily_spend: f64,
    pub efficient_cpc: f64,
}

impl Default for VelocityScoring {
    fn default() -> Self {
        Self {
            high_daily_spend: 15.0,
            low_return_roas: 3.0,
            high_spend_penalty: 10,
            low_daily_spend: 10.0,
            efficient_cpc: 0.5,
        }
    }
}

/// One extra bonus when CTR, ROAS, and conversion rate are simultaneously
/// in their best tier; one extra penalty when CTR, ROAS, and frequency are
/// simultaneously in their worst.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompoundScoring {
    pub best_ctr_above: f64,
    pub best_roas_above: f64,
    pub best_rate_above: f64,
    pub bonus: i32,
    pub worst_ctr_below: f64,
    pub worst_roas_below: f64,
    pub worst_frequency_above: f64,
    pub penalty: i32,
}

impl Default for CompoundScoring {
    fn default() -> Self {
        Self {
            best_ctr_above: 2.5,
            best_roas_above: 3.0,
            best_rate_above: 2.5,
            bonus: 15,
            worst_ctr_below: 1.0,
            worst_roas_below: 2.0,
            worst_frequency_above: 2.5,
            penalty: 15,
        }
    }
}

// ─── Decision thresholds ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DecisionConfig {
    #[serde(default)]
    pub pause: PauseRule,
    #[serde(default)]
    pub scale: ScaleRule,
    #[serde(default)]
    pub clone: CloneRule,
    #[serde(default)]
    pub creative: CreativeRule,
    #[serde(default)]
    pub audience: AudienceRule,
    #[serde(default)]
    pub offer: OfferRule,
    #[serde(default)]
    pub budget_opt: BudgetOptRule,
    #[serde(default)]
    pub wait: WaitRule,
    #[serde(default)]
    pub confidence: ConfidenceRule,
    #[serde(default)]
    pub scale_tiers: ScaleTiers,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PauseRule {
    pub no_conversion_spend: f64,
    pub no_conversion_days: u32,
    pub high_spend: f64,
    pub roas_floor: f64,
}

impl Default for PauseRule {
    fn default() -> Self {
        Self {
            no_conversion_spend: 15.0,
            no_conversion_days: 3,
            high_spend: 30.0,
            roas_floor: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScaleRule {
    pub strong_roas: f64,
    pub strong_score: i32,
    pub strong_conversions: u64,
    pub strong_spend: f64,
    pub proven_roas: f64,
    pub proven_score: i32,
    pub proven_conversions: u64,
    pub proven_days: u32,
    pub proven_spend: f64,
}

impl Default for ScaleRule {
    fn default() -> Self {
        Self {
            strong_roas: 4.0,
            strong_score: 80,
            strong_conversions: 5,
            strong_spend: 30.0,
            proven_roas: 3.5,
            proven_score: 75,
            proven_conversions: 3,
            proven_days: 2,
            proven_spend: 20.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloneRule {
    pub excellent_roas: f64,
    pub excellent_conversions: u64,
    pub excellent_score: i32,
    pub outstanding_roas: f64,
    pub outstanding_conversions: u64,
    pub outstanding_score: i32,
}

impl Default for CloneRule {
    fn default() -> Self {
        Self {
            excellent_roas: 4.0,
            excellent_conversions: 5,
            excellent_score: 85,
            outstanding_roas: 5.0,
            outstanding_conversions: 3,
            outstanding_score: 80,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CreativeRule {
    pub ctr_floor: f64,
    pub clicks_floor: u64,
    pub frequency_ceiling: f64,
}

impl Default for CreativeRule {
    fn default() -> Self {
        Self {
            ctr_floor: 0.9,
            clicks_floor: 50,
            frequency_ceiling: 3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudienceRule {
    pub cpc_floor: f64,
    pub rate_ceiling: f64,
    pub roas_floor: f64,
    pub cpc_ceiling: f64,
}

impl Default for AudienceRule {
    fn default() -> Self {
        Self {
            cpc_floor: 1.5,
            rate_ceiling: 1.5,
            roas_floor: 2.0,
            cpc_ceiling: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfferRule {
    pub ctr_floor: f64,
    pub rate_ceiling: f64,
    pub clicks_floor: u64,
}

impl Default for OfferRule {
    fn default() -> Self {
        Self {
            ctr_floor: 1.5,
            rate_ceiling: 1.0,
            clicks_floor: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BudgetOptRule {
    pub high_daily_spend: f64,
    pub roas_ceiling: f64,
    pub score_ceiling: i32,
    pub low_daily_spend: f64,
    pub roas_floor: f64,
    pub cpc_ceiling: f64,
}

impl Default for BudgetOptRule {
    fn default() -> Self {
        Self {
            high_daily_spend: 20.0,
            roas_ceiling: 2.5,
            score_ceiling: 60,
            low_daily_spend: 15.0,
            roas_floor: 4.0,
            cpc_ceiling: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaitRule {
    pub young_days: u32,
    pub young_spend: f64,
    pub low_spend: f64,
    pub impressions_floor: u64,
}

impl Default for WaitRule {
    fn default() -> Self {
        Self {
            young_days: 2,
            young_spend: 20.0,
            low_spend: 10.0,
            impressions_floor: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfidenceRule {
    pub high_spend: f64,
    pub high_conversions: u64,
    pub high_days: u32,
    pub medium_spend: f64,
    pub medium_days: u32,
}

impl Default for ConfidenceRule {
    fn default() -> Self {
        Self {
            high_spend: 30.0,
            high_conversions: 3,
            high_days: 3,
            medium_spend: 20.0,
            medium_days: 2,
        }
    }
}

/// Scale percent by ROAS tier, descending.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScaleTiers {
    pub top_roas: f64,
    pub top_percent: u32,
    pub mid_roas: f64,
    pub mid_percent: u32,
    pub base_roas: f64,
    pub base_percent: u32,
    pub fallback_percent: u32,
}

impl Default for ScaleTiers {
    fn default() -> Self {
        Self {
            top_roas: 5.0,
            top_percent: 50,
            mid_roas: 4.0,
            mid_percent: 35,
            base_roas: 3.0,
            base_percent: 25,
            fallback_percent: 20,
        }
    }
}

impl ScaleTiers {
    pub fn percent_for(&self, roas: f64) -> u32 {
        if roas >= self.top_roas {
            self.top_percent
        } else if roas >= self.mid_roas {
            self.mid_percent
        } else if roas >= self.base_roas {
            self.base_percent
        } else {
            self.fallback_percent
        }
    }
}

// ─── Budget bounds ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_min_budget")]
    pub min_budget: f64,
    #[serde(default = "default_max_budget")]
    pub max_budget: f64,
    /// Changes smaller than this are treated as a no-op.
    #[serde(default = "default_min_change")]
    pub min_change: f64,
    #[serde(default = "default_high_roas")]
    pub high_roas: f64,
    #[serde(default = "default_low_roas")]
    pub low_roas: f64,
    #[serde(default = "default_scale_up")]
    pub scale_up: f64,
    #[serde(default = "default_scale_down")]
    pub scale_down: f64,
    #[serde(default = "default_scale_down_hard")]
    pub scale_down_hard: f64,
    /// Below this ROAS the hard scale-down factor applies.
    #[serde(default = "default_hard_floor_roas")]
    pub hard_floor_roas: f64,
}

fn default_min_budget() -> f64 {
    10.0
}
fn default_max_budget() -> f64 {
    500.0
}
fn default_min_change() -> f64 {
    1.0
}
fn default_high_roas() -> f64 {
    3.0
}
fn default_low_roas() -> f64 {
    1.0
}
fn default_scale_up() -> f64 {
    1.3
}
fn default_scale_down() -> f64 {
    0.7
}
fn default_scale_down_hard() -> f64 {
    0.5
}
fn default_hard_floor_roas() -> f64 {
    0.5
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            min_budget: default_min_budget(),
            max_budget: default_max_budget(),
            min_change: default_min_change(),
            high_roas: default_high_roas(),
            low_roas: default_low_roas(),
            scale_up: default_scale_up(),
            scale_down: default_scale_down(),
            scale_down_hard: default_scale_down_hard(),
            hard_floor_roas: default_hard_floor_roas(),
        }
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    /// Campaigns scoring below this are skipped as dead rather than acted on.
    #[serde(default = "default_dead_score_floor")]
    pub dead_score_floor: i32,
}

fn default_cycle_interval_secs() -> u64 {
    3600
}
fn default_dead_score_floor() -> i32 {
    20
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            dead_score_floor: default_dead_score_floor(),
        }
    }
}

// ─── Platform boundary ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub ad_account_id: String,
    /// Every external call carries this timeout; a timeout surfaces as a
    /// structured error, not a crash.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://graph.facebook.com/v23.0".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: String::new(),
            ad_account_id: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
