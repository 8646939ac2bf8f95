//! Decision engine: a total function from one campaign's snapshot and
//! health analysis to exactly one action. Rules are evaluated in strict
//! priority order (pause, scale, clone, creative, audience, offer, budget,
//! wait) and the first match wins; the fallback is a creative refresh.

use adpilot_core::config::{ConfidenceRule, DecisionConfig};
use adpilot_core::types::{
    Action, Analysis, Campaign, Confidence, Decision, Flag, HealthStatus, MetricsSnapshot,
    MetricsSummary, Priority,
};

const PAUSE_FLAGS: [Flag; 4] = [
    Flag::ZeroRoasHighSpend,
    Flag::NoConversionsSignificantSpend,
    Flag::MultipleIssues,
    Flag::CriticallyLowCtr,
];

const CREATIVE_FLAGS: [Flag; 5] = [
    Flag::CriticallyLowCtr,
    Flag::LowCtr,
    Flag::CreativeFatigue,
    Flag::SevereAdFatigue,
    Flag::WeakCreative,
];

const AUDIENCE_FLAGS: [Flag; 3] = [
    Flag::BadAudienceMatch,
    Flag::HighCpc,
    Flag::LowFrequencyHighSpend,
];

const OFFER_FLAGS: [Flag; 2] = [Flag::ConversionDropoff, Flag::LowConversionRate];

/// Produce the single decision for this cycle. Total: every input maps to
/// an action, so an unmatched campaign can never stall the loop.
pub fn decide(
    campaign: &Campaign,
    metrics: &MetricsSnapshot,
    analysis: &Analysis,
    cfg: &DecisionConfig,
) -> Decision {
    let (action, reason, priority) = if let Some(reason) = pause_reason(metrics, analysis, cfg) {
        (Action::Pause, reason, Priority::Critical)
    } else if should_scale(metrics, analysis, cfg) {
        (
            Action::Scale,
            format!(
                "SCALE: Excellent performance (ROAS {:.1}x, score {}/100, {} conversions). Increase budget by 25-50%.",
                metrics.roas, analysis.score, metrics.conversions
            ),
            Priority::High,
        )
    } else if should_clone(metrics, analysis, cfg) {
        (
            Action::Clone,
            format!(
                "CLONE: Outstanding performance (ROAS {:.1}x, {} conversions). Duplicate with a new audience for horizontal scale.",
                metrics.roas, metrics.conversions
            ),
            Priority::High,
        )
    } else if should_edit_creative(metrics, analysis, cfg) {
        (
            Action::EditCreative,
            creative_reason(metrics, analysis),
            Priority::Medium,
        )
    } else if should_change_audience(metrics, analysis, cfg) {
        (
            Action::ChangeAudience,
            audience_reason(metrics, analysis),
            Priority::Medium,
        )
    } else if should_revise_offer(metrics, analysis, cfg) {
        (
            Action::ReviseOffer,
            offer_reason(metrics, analysis),
            Priority::Medium,
        )
    } else if should_optimize_budget(metrics, analysis, cfg) {
        (Action::OptimizeBudget, budget_reason(metrics, cfg), Priority::Low)
    } else if should_wait(metrics, cfg) {
        (Action::Wait, wait_reason(metrics, cfg), Priority::Low)
    } else {
        (
            Action::EditCreative,
            "Campaign performance needs improvement. Start with creative optimization.".to_string(),
            Priority::Medium,
        )
    };

    Decision {
        campaign_id: campaign.id,
        external_id: campaign.external_id.clone(),
        action,
        reason,
        priority,
        confidence: confidence_for(metrics, &cfg.confidence),
        next_review_hours: action.review_interval_hours(),
        expected_outcome: action.expected_outcome(metrics.roas),
        summary: MetricsSummary {
            roas: metrics.roas,
            spend: metrics.spend,
            conversions: metrics.conversions,
            score: analysis.score,
        },
        flags: analysis.flags.clone(),
    }
}

fn pause_reason(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> Option<String> {
    let rule = &cfg.pause;
    let no_conversions = m.spend >= rule.no_conversion_spend
        && m.conversions == 0
        && m.days_running >= rule.no_conversion_days;
    let bleeding = m.spend >= rule.high_spend && m.roas < rule.roas_floor;

    if !(no_conversions || bleeding || a.has_any_flag(&PAUSE_FLAGS)) {
        return None;
    }

    Some(if m.spend >= rule.high_spend && m.conversions == 0 {
        format!(
            "CRITICAL: ${:.0} spent with zero conversions. Pause immediately to stop the loss.",
            m.spend
        )
    } else if a.has_flag(Flag::MultipleIssues) {
        "CRITICAL: Multiple failing signals at once. Pause and restructure the campaign."
            .to_string()
    } else if bleeding {
        format!(
            "CRITICAL: ROAS {:.2}x after ${:.0} spend. The campaign is actively losing money; pause now.",
            m.roas, m.spend
        )
    } else {
        "CRITICAL: Campaign is in a failing state. Pause to prevent further losses.".to_string()
    })
}

fn should_scale(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.scale;
    let strong = m.roas >= rule.strong_roas
        && a.score >= rule.strong_score
        && m.conversions >= rule.strong_conversions
        && a.has_flag(Flag::ScalingOpportunity)
        && m.spend >= rule.strong_spend;
    let proven = m.roas >= rule.proven_roas
        && a.score >= rule.proven_score
        && m.conversions >= rule.proven_conversions
        && m.days_running >= rule.proven_days
        && m.spend >= rule.proven_spend;
    strong || proven
}

fn should_clone(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.clone;
    let excellent = a.status == HealthStatus::Excellent
        && m.roas >= rule.excellent_roas
        && m.conversions >= rule.excellent_conversions
        && a.score >= rule.excellent_score;
    let outstanding = m.roas >= rule.outstanding_roas
        && m.conversions >= rule.outstanding_conversions
        && a.score >= rule.outstanding_score
        && a.has_flag(Flag::ScalingOpportunity);
    excellent || outstanding
}

fn should_edit_creative(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.creative;
    a.has_any_flag(&CREATIVE_FLAGS)
        || (m.ctr < rule.ctr_floor && m.clicks > rule.clicks_floor)
        || m.frequency >= rule.frequency_ceiling
}

fn creative_reason(m: &MetricsSnapshot, a: &Analysis) -> String {
    if a.has_flag(Flag::SevereAdFatigue) {
        format!(
            "URGENT: Severe ad fatigue (frequency {:.1}). Refresh creative immediately.",
            m.frequency
        )
    } else if a.has_flag(Flag::CriticallyLowCtr) {
        format!(
            "URGENT: CTR critically low ({:.2}%). Complete creative overhaul needed.",
            m.ctr
        )
    } else if a.has_flag(Flag::LowCtr) {
        format!(
            "Creative underperforming (CTR {:.2}%). Test new hooks, visuals, and copy.",
            m.ctr
        )
    } else {
        "Creative needs a refresh. Test new angles and formats.".to_string()
    }
}

fn should_change_audience(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.audience;
    a.has_any_flag(&AUDIENCE_FLAGS)
        || (m.cpc > rule.cpc_floor && m.conversion_rate < rule.rate_ceiling)
        || (m.roas >= rule.roas_floor && m.cpc > rule.cpc_ceiling)
}

fn audience_reason(m: &MetricsSnapshot, a: &Analysis) -> String {
    if a.has_flag(Flag::BadAudienceMatch) {
        format!(
            "Audience mismatch: CPC ${:.2} with conversion rate {:.1}%. Refine targeting.",
            m.cpc, m.conversion_rate
        )
    } else if a.has_flag(Flag::HighCpc) {
        format!(
            "CPC ${:.2} is too high. Test more specific or less competitive audiences.",
            m.cpc
        )
    } else {
        "Audience optimization needed. Test narrower targeting or new segments.".to_string()
    }
}

fn should_revise_offer(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.offer;
    a.has_any_flag(&OFFER_FLAGS)
        || (m.ctr >= rule.ctr_floor
            && m.conversion_rate < rule.rate_ceiling
            && m.clicks > rule.clicks_floor)
}

fn offer_reason(m: &MetricsSnapshot, a: &Analysis) -> String {
    if a.has_flag(Flag::LowConversionRate) || a.has_flag(Flag::ConversionDropoff) {
        format!(
            "Conversion rate {:.1}% is low. Review pricing, landing page, and value proposition.",
            m.conversion_rate
        )
    } else {
        format!(
            "Good engagement (CTR {:.2}%) but conversions lag ({:.1}%). Revisit the offer and landing page.",
            m.ctr, m.conversion_rate
        )
    }
}

fn should_optimize_budget(m: &MetricsSnapshot, a: &Analysis, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.budget_opt;
    (m.daily_spend > rule.high_daily_spend
        && m.roas < rule.roas_ceiling
        && a.score < rule.score_ceiling)
        || (m.daily_spend < rule.low_daily_spend
            && m.roas > rule.roas_floor
            && m.cpc < rule.cpc_ceiling)
}

fn budget_reason(m: &MetricsSnapshot, cfg: &DecisionConfig) -> String {
    if m.daily_spend > cfg.budget_opt.high_daily_spend {
        format!(
            "Daily spend ${:.0} is high for ROAS {:.1}x. Reduce budget until efficiency recovers.",
            m.daily_spend, m.roas
        )
    } else {
        format!(
            "Strong returns (ROAS {:.1}x) on modest spend. Budget can go up.",
            m.roas
        )
    }
}

fn should_wait(m: &MetricsSnapshot, cfg: &DecisionConfig) -> bool {
    let rule = &cfg.wait;
    (m.days_running < rule.young_days && m.spend < rule.young_spend)
        || (m.spend < rule.low_spend
            && m.conversions == 0
            && m.impressions < rule.impressions_floor)
}

fn wait_reason(m: &MetricsSnapshot, cfg: &DecisionConfig) -> String {
    if m.days_running < cfg.wait.young_days {
        format!(
            "Campaign is only {} day(s) old. Allow 2-3 days before optimizing.",
            m.days_running
        )
    } else {
        format!(
            "Insufficient data (${:.0} spent, {} impressions). Keep monitoring.",
            m.spend, m.impressions
        )
    }
}

fn confidence_for(m: &MetricsSnapshot, rule: &ConfidenceRule) -> Confidence {
    if m.spend >= rule.high_spend
        && m.conversions >= rule.high_conversions
        && m.days_running >= rule.high_days
    {
        Confidence::High
    } else if m.spend >= rule.medium_spend && m.days_running >= rule.medium_days {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
