//! Health analyzer: folds one metrics snapshot into a 0-100 score with
//! diagnostic flags, operator recommendations, and priority call-outs.
//!
//! Adjustment groups run in a fixed order: CTR, creative-fatigue compound,
//! ROAS, CPC, frequency, conversions, spend velocity, then the compound
//! best/worst signals. The final score is clamped to [0, 100].

use adpilot_core::config::ScoringConfig;
use adpilot_core::types::{Analysis, Flag, HealthStatus, MetricsSnapshot};

/// Score one snapshot. Pure; the same snapshot and config always produce
/// the same analysis.
pub fn analyze(metrics: &MetricsSnapshot, cfg: &ScoringConfig) -> Analysis {
    let mut score = cfg.baseline;
    let mut flags = Vec::new();
    let mut recommendations = Vec::new();

    // CTR tiers.
    if metrics.ctr < cfg.ctr.critical_below {
        score -= cfg.ctr.critical_penalty;
        flags.push(Flag::CriticallyLowCtr);
        recommendations.push(format!(
            "CTR is critically low ({:.2}%). The creative is not resonating; replace it.",
            metrics.ctr
        ));
    } else if metrics.ctr < cfg.ctr.low_below {
        score -= cfg.ctr.low_penalty;
        flags.push(Flag::LowCtr);
        recommendations.push(format!(
            "CTR is below average ({:.2}%). Test new hooks and visuals.",
            metrics.ctr
        ));
    } else if metrics.ctr < cfg.ctr.decent_below {
        score += cfg.ctr.decent_bonus;
    } else if metrics.ctr < cfg.ctr.strong_below {
        score += cfg.ctr.strong_bonus;
    } else {
        score += cfg.ctr.excellent_bonus;
    }

    // Low engagement at high exposure flags fatigue without a second
    // score hit; the CTR tier above already took one.
    if metrics.ctr < cfg.fatigue.ctr_below && metrics.frequency > cfg.fatigue.frequency_above {
        flags.push(Flag::CreativeFatigue);
        recommendations.push(
            "The audience has seen this creative too often for the engagement it earns. Rotate creative."
                .to_string(),
        );
    }

    // ROAS tiers. Zero ROAS is severe only once spend is past noise level.
    if metrics.roas == 0.0 {
        if metrics.spend > cfg.roas.zero_spend_floor {
            score -= cfg.roas.zero_high_penalty;
            flags.push(Flag::ZeroRoasHighSpend);
            recommendations.push(format!(
                "No revenue after ${:.2} spend. Verify conversion tracking and the landing page.",
                metrics.spend
            ));
        } else {
            score -= cfg.roas.zero_early_penalty;
            flags.push(Flag::ZeroRoasEarly);
        }
    } else if metrics.roas < cfg.roas.breakeven_below {
        score -= cfg.roas.unprofitable_penalty;
        flags.push(Flag::UnprofitableRoas);
        recommendations.push(format!(
            "ROAS {:.2}x is below breakeven. The campaign is losing money.",
            metrics.roas
        ));
    } else if metrics.roas < cfg.roas.marginal_below {
        flags.push(Flag::MarginalRoas);
    } else if metrics.roas < cfg.roas.good_below {
        score += cfg.roas.good_bonus;
    } else {
        score += cfg.roas.excellent_bonus;
    }

    // CPC tiers.
    if metrics.cpc > cfg.cpc.high_above {
        score -= cfg.cpc.high_penalty;
        flags.push(Flag::HighCpc);
        recommendations.push(format!(
            "CPC ${:.2} is expensive. Targeting may be too competitive.",
            metrics.cpc
        ));
    } else if metrics.cpc > cfg.cpc.moderate_above {
        score -= cfg.cpc.moderate_penalty;
        flags.push(Flag::ModerateCpc);
    } else if metrics.cpc > cfg.cpc.fair_above {
        score += cfg.cpc.fair_bonus;
    } else {
        score += cfg.cpc.efficient_bonus;
    }

    // Frequency. The [low_below, optimal_at) band is neutral.
    if metrics.frequency >= cfg.frequency.severe_at {
        score -= cfg.frequency.severe_penalty;
        flags.push(Flag::SevereAdFatigue);
        recommendations.push(format!(
            "Frequency {:.1} means heavy ad fatigue. Refresh creative or widen the audience.",
            metrics.frequency
        ));
    } else if metrics.frequency >= cfg.frequency.high_at {
        score -= cfg.frequency.high_penalty;
        flags.push(Flag::AdFatigue);
        recommendations.push(format!(
            "Frequency {:.1} is creeping up. Plan a creative rotation.",
            metrics.frequency
        ));
    } else if metrics.frequency >= cfg.frequency.optimal_at {
        score += cfg.frequency.optimal_bonus;
    } else if metrics.frequency < cfg.frequency.low_below {
        if metrics.spend > cfg.frequency.broad_spend_floor {
            score -= cfg.frequency.broad_penalty;
            flags.push(Flag::LowFrequencyHighSpend);
            recommendations.push(
                "Spend is high but frequency is low; the audience may be too broad.".to_string(),
            );
        } else {
            score += cfg.frequency.fresh_bonus;
        }
    }

    // Conversions, then conversion rate for campaigns that have any.
    if metrics.conversions == 0 {
        if metrics.spend > cfg.conversion.significant_spend {
            score -= cfg.conversion.significant_penalty;
            flags.push(Flag::NoConversionsSignificantSpend);
            recommendations.push(format!(
                "No conversions after ${:.2} spend. Check the funnel end to end.",
                metrics.spend
            ));
        } else if metrics.spend > cfg.conversion.moderate_spend {
            score -= cfg.conversion.moderate_penalty;
            flags.push(Flag::NoConversionsModerateSpend);
        } else {
            score -= cfg.conversion.early_penalty;
        }
    } else if metrics.conversion_rate < cfg.conversion.low_rate_below {
        score -= cfg.conversion.low_rate_penalty;
        flags.push(Flag::LowConversionRate);
        recommendations.push(format!(
            "Conversion rate {:.1}% is weak. The offer or landing page needs work.",
            metrics.conversion_rate
        ));
    } else if metrics.conversion_rate < cfg.conversion.fair_rate_below {
        // Fair tier, no adjustment.
    } else if metrics.conversion_rate < cfg.conversion.good_rate_below {
        score += cfg.conversion.good_rate_bonus;
    } else {
        score += cfg.conversion.excellent_rate_bonus;
    }

    // Spend velocity.
    if metrics.daily_spend > cfg.velocity.high_daily_spend
        && metrics.roas < cfg.velocity.low_return_roas
    {
        score -= cfg.velocity.high_spend_penalty;
        flags.push(Flag::HighSpendLowReturn);
        recommendations.push(
            "Daily spend is high relative to returns. Slow down until efficiency recovers."
                .to_string(),
        );
    } else if metrics.daily_spend < cfg.velocity.low_daily_spend
        && metrics.cpc < cfg.velocity.efficient_cpc
        && metrics.clicks > 0
    {
        recommendations.push(
            "Clicks are cheap and spend is modest. There is room to increase budget.".to_string(),
        );
    }

    // Compound signals across metric groups.
    if metrics.ctr > cfg.compound.best_ctr_above
        && metrics.roas > cfg.compound.best_roas_above
        && metrics.conversion_rate > cfg.compound.best_rate_above
    {
        score += cfg.compound.bonus;
        flags.push(Flag::ScalingOpportunity);
        recommendations.push("All core metrics are strong. The campaign is ready to scale.".to_string());
    }
    if metrics.ctr < cfg.compound.worst_ctr_below
        && metrics.roas < cfg.compound.worst_roas_below
        && metrics.frequency > cfg.compound.worst_frequency_above
    {
        score -= cfg.compound.penalty;
        flags.push(Flag::MultipleIssues);
        recommendations.push(
            "Creative, returns, and frequency are failing at once. A restructure is likely needed."
                .to_string(),
        );
    }

    let score = score.clamp(0, 100);
    Analysis {
        score,
        status: HealthStatus::from_score(score),
        priority_actions: priority_actions(&flags),
        flags,
        recommendations,
    }
}

fn priority_actions(flags: &[Flag]) -> Vec<String> {
    let mut actions = Vec::new();
    if flags.contains(&Flag::CriticallyLowCtr) || flags.contains(&Flag::SevereAdFatigue) {
        actions.push("URGENT: Refresh creative immediately".to_string());
    }
    if flags.contains(&Flag::ZeroRoasHighSpend) || flags.contains(&Flag::NoConversionsSignificantSpend) {
        actions.push("URGENT: Check conversion tracking and landing page".to_string());
    }
    if flags.contains(&Flag::ScalingOpportunity) {
        actions.push("OPPORTUNITY: Scale budget by 20-30%".to_string());
    }
    actions
}
