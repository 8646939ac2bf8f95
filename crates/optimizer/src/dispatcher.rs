//! Action dispatcher: executes one decision against the ad platform and
//! the campaign store. Handlers fail gracefully into a `Failed` result,
//! write an audit record only after the platform confirms the mutation,
//! and treat alerting as fire-and-forget.

use adpilot_core::config::{BudgetConfig, ScaleTiers};
use adpilot_core::types::{
    Action, ActionOutcome, ActionResult, ActionStatus, Audience, BudgetMove, Campaign,
    CampaignStatus, CampaignUpdate, Decision, OfferRevisionAssist, OfferRevisionTemplate,
    OptimizationLog,
};
use adpilot_core::{OptimizeError, OptimizeResult};
use adpilot_platform::traits::{CopyContext, CreativeSpec, ExternalStatus, PlatformTargeting};
use adpilot_platform::{AdPlatform, CampaignStore, ContentGenerator, Notifier};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ActionDispatcher {
    platform: Arc<dyn AdPlatform>,
    store: Arc<dyn CampaignStore>,
    content: Arc<dyn ContentGenerator>,
    notifier: Arc<dyn Notifier>,
    budget: BudgetConfig,
    scale_tiers: ScaleTiers,
    // One lock per campaign so concurrent dispatches for the same
    // campaign serialize instead of interleaving platform writes.
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ActionDispatcher {
    pub fn new(
        platform: Arc<dyn AdPlatform>,
        store: Arc<dyn CampaignStore>,
        content: Arc<dyn ContentGenerator>,
        notifier: Arc<dyn Notifier>,
        budget: BudgetConfig,
        scale_tiers: ScaleTiers,
    ) -> Self {
        Self {
            platform,
            store,
            content,
            notifier,
            budget,
            scale_tiers,
            locks: DashMap::new(),
        }
    }

    /// Execute one decision. Never returns `Err`: every failure is folded
    /// into a `Failed` result so one campaign cannot take down a cycle.
    pub fn dispatch(&self, decision: &Decision) -> ActionResult {
        let lock = self
            .locks
            .entry(decision.campaign_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        let campaign = match self.store.get(decision.campaign_id) {
            Ok(c) => c,
            Err(e) => {
                return ActionResult::failed(decision.campaign_id, decision.action, e.to_string())
            }
        };

        let outcome = match decision.action {
            Action::Pause => self.pause(&campaign, decision),
            Action::Scale => self.scale(&campaign, decision),
            Action::Clone => self.clone_campaign(&campaign, decision),
            Action::EditCreative => self.edit_creative(&campaign, decision),
            Action::ChangeAudience => self.change_audience(&campaign, decision),
            Action::ReviseOffer => self.revise_offer(&campaign, decision),
            Action::OptimizeBudget => self.optimize_budget(&campaign, decision),
            Action::Wait => Ok(ActionResult::waiting(
                campaign.id,
                "Campaign under observation; no changes made.",
            )),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    campaign_id = %campaign.id,
                    action = %decision.action,
                    error = %e,
                    "Action failed"
                );
                metrics::counter!("dispatcher.actions_failed").increment(1);
                return ActionResult::failed(campaign.id, decision.action, e.to_string());
            }
        };

        if matches!(result.status, ActionStatus::Executed | ActionStatus::HumanAssist) {
            metrics::counter!("dispatcher.actions_executed").increment(1);
            let subject = format!("{} applied to campaign {}", decision.action, campaign.name);
            if let Err(e) = self.notifier.send_alert(&subject, &decision.reason) {
                warn!(campaign_id = %campaign.id, error = %e, "Alert delivery failed");
            }
        }
        result
    }

    fn pause(&self, campaign: &Campaign, decision: &Decision) -> OptimizeResult<ActionResult> {
        let already_paused = campaign.status == CampaignStatus::Paused;

        // Re-confirm remote state even when already paused locally.
        self.platform
            .set_status(&campaign.external_id, ExternalStatus::Paused)?;
        self.store.apply(
            campaign.id,
            CampaignUpdate {
                status: Some(CampaignStatus::Paused),
                ..CampaignUpdate::default()
            },
        )?;

        if !already_paused {
            self.audit(campaign, Action::Pause, decision, None, None);
        }
        info!(campaign_id = %campaign.id, already_paused, "Campaign paused");
        Ok(ActionResult::executed(
            campaign.id,
            Action::Pause,
            ActionOutcome::Paused { already_paused },
            if already_paused {
                "Campaign was already paused; remote state confirmed"
            } else {
                "Campaign paused"
            },
        ))
    }

    fn scale(&self, campaign: &Campaign, decision: &Decision) -> OptimizeResult<ActionResult> {
        let percent = self.scale_tiers.percent_for(decision.summary.roas);
        let adset = self.platform.primary_adset(&campaign.external_id)?;
        if adset.daily_budget <= 0.0 {
            return Err(OptimizeError::Dispatch(format!(
                "ad set {} has no usable daily budget",
                adset.id
            )));
        }

        let old_budget = adset.daily_budget;
        let new_budget = round2(old_budget * (1.0 + f64::from(percent) / 100.0))
            .min(self.budget.max_budget);
        if (new_budget - old_budget).abs() < self.budget.min_change {
            return Ok(ActionResult::noop(
                campaign.id,
                Action::Scale,
                format!("Budget ${:.2} is already at the ceiling", old_budget),
            ));
        }

        self.platform.update_budget(&adset.id, new_budget)?;
        self.store.apply(
            campaign.id,
            CampaignUpdate {
                budget: Some(new_budget),
                adset_id: Some(adset.id.clone()),
                ..CampaignUpdate::default()
            },
        )?;
        self.audit(
            campaign,
            Action::Scale,
            decision,
            None,
            Some(format!(
                "Budget ${:.2} -> ${:.2} (+{}%)",
                old_budget, new_budget, percent
            )),
        );

        info!(campaign_id = %campaign.id, percent, new_budget, "Campaign scaled");
        Ok(ActionResult::executed(
            campaign.id,
            Action::Scale,
            ActionOutcome::Scaled {
                adset_id: adset.id,
                scale_percent: percent,
                old_budget,
                new_budget,
            },
            format!("Budget increased by {}% to ${:.2}", percent, new_budget),
        ))
    }

    fn clone_campaign(
        &self,
        campaign: &Campaign,
        decision: &Decision,
    ) -> OptimizeResult<ActionResult> {
        let now = Utc::now();
        let suffix = format!("Clone_{}_{}", campaign.external_id, now.format("%m%d"));
        let new_external_id = self.platform.copy_campaign(&campaign.external_id, &suffix)?;

        let clone = Campaign {
            id: Uuid::new_v4(),
            external_id: new_external_id.clone(),
            adset_id: None,
            product_id: campaign.product_id,
            name: format!("{} {}", campaign.name, suffix),
            objective: campaign.objective.clone(),
            // Clones start inactive and are promoted by an operator once
            // their new audience is in place.
            status: CampaignStatus::Inactive,
            budget: campaign.budget,
            audience: campaign.audience.clone(),
            headline: campaign.headline.clone(),
            ad_copy: campaign.ad_copy.clone(),
            cta: campaign.cta.clone(),
            creative_ids: campaign.creative_ids.clone(),
            revenue: 0.0,
            conversions: 0,
            latest_metrics: None,
            created_at: now,
            updated_at: now,
        };
        let new_campaign_id = clone.id;
        self.store.insert(clone)?;
        self.audit(
            campaign,
            Action::Clone,
            decision,
            None,
            Some(format!("Cloned as {} ({})", suffix, new_external_id)),
        );

        info!(
            campaign_id = %campaign.id,
            new_external_id = %new_external_id,
            "Campaign cloned"
        );
        Ok(ActionResult::executed(
            campaign.id,
            Action::Clone,
            ActionOutcome::Cloned {
                new_external_id,
                new_campaign_id,
            },
            "Campaign duplicated for horizontal scaling",
        ))
    }

    fn edit_creative(
        &self,
        campaign: &Campaign,
        decision: &Decision,
    ) -> OptimizeResult<ActionResult> {
        let adset_id = campaign.adset_id.clone().ok_or_else(|| {
            OptimizeError::Dispatch(format!("campaign {} has no ad set on record", campaign.id))
        })?;
        let product = self.store.product(campaign.product_id)?;

        let current = self.store.active_creative(campaign);
        let next = self
            .store
            .next_creative(campaign.product_id, current.as_ref().map(|c| c.id))
            .ok_or_else(|| {
                OptimizeError::Dispatch(format!(
                    "no fresh creative available for product {}",
                    product.name
                ))
            })?;

        let prior = CopyContext {
            previous_headline: campaign.headline.clone(),
            previous_ad_copy: campaign.ad_copy.clone(),
            previous_cta: campaign.cta.clone(),
        };
        let copy = self.content.generate_copy(&product, &prior)?;

        let platform_creative_id = self.platform.create_creative(&CreativeSpec {
            name: format!("{} creative {}", product.name, Utc::now().format("%m%d")),
            headline: copy.headline.clone(),
            ad_copy: copy.ad_copy.clone(),
            cta: copy.cta.clone(),
            image_hash: next.file_hash.clone(),
        })?;

        // Best effort; an ad set with no active ad is not an error.
        let old_ad_id = match self.platform.pause_active_ad(&adset_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(campaign_id = %campaign.id, error = %e, "Could not pause outgoing ad");
                None
            }
        };

        let new_ad_id = self
            .platform
            .create_ad(&adset_id, &platform_creative_id, &copy.headline)?;

        if let Some(current) = &current {
            self.store.set_creative_active(current.id, false)?;
        }
        self.store.apply(
            campaign.id,
            CampaignUpdate {
                headline: Some(copy.headline.clone()),
                ad_copy: Some(copy.ad_copy),
                cta: Some(copy.cta),
                creative_ids: Some(vec![next.id]),
                ..CampaignUpdate::default()
            },
        )?;
        self.audit(
            campaign,
            Action::EditCreative,
            decision,
            Some(next.id),
            Some(format!(
                "New ad {} with platform creative {}",
                new_ad_id, platform_creative_id
            )),
        );

        info!(campaign_id = %campaign.id, new_ad_id = %new_ad_id, "Creative refreshed");
        Ok(ActionResult::executed(
            campaign.id,
            Action::EditCreative,
            ActionOutcome::CreativeRefreshed {
                old_ad_id,
                new_ad_id,
                platform_creative_id,
                creative_id: next.id,
                headline: copy.headline,
            },
            "Creative refreshed with a new ad",
        ))
    }

    fn change_audience(
        &self,
        campaign: &Campaign,
        decision: &Decision,
    ) -> OptimizeResult<ActionResult> {
        let adset_id = campaign.adset_id.clone().ok_or_else(|| {
            OptimizeError::Dispatch(format!("campaign {} has no ad set on record", campaign.id))
        })?;
        let product = self.store.product(campaign.product_id)?;

        let suggestion = self
            .content
            .generate_audience(&product, &campaign.audience, &decision.reason)?;
        if suggestion.interests.is_empty() {
            return Err(OptimizeError::ContentGeneration(
                "generated audience has no interests".to_string(),
            ));
        }

        let resolved = self.platform.resolve_interests(&suggestion.interests)?;
        if resolved.len() < 2 {
            return Err(OptimizeError::Dispatch(format!(
                "only {} of {} interests resolved; refusing to narrow targeting that far",
                resolved.len(),
                suggestion.interests.len()
            )));
        }

        let audience = Audience {
            interests: resolved.iter().map(|i| i.name.clone()).collect(),
            age_min: suggestion.age_min,
            age_max: suggestion.age_max,
            gender: suggestion.gender,
        };
        let targeting = PlatformTargeting::from_audience(&audience, resolved);
        self.platform.update_targeting(&adset_id, &targeting)?;
        self.store.apply(
            campaign.id,
            CampaignUpdate {
                audience: Some(audience.clone()),
                ..CampaignUpdate::default()
            },
        )?;
        let previous = if campaign.audience.interests.is_empty() {
            "(none)".to_string()
        } else {
            campaign.audience.interests.join(", ")
        };
        self.audit(
            campaign,
            Action::ChangeAudience,
            decision,
            None,
            Some(format!(
                "Interests: {} -> {}",
                previous,
                audience.interests.join(", ")
            )),
        );

        info!(campaign_id = %campaign.id, adset_id = %adset_id, "Audience changed");
        Ok(ActionResult::executed(
            campaign.id,
            Action::ChangeAudience,
            ActionOutcome::AudienceChanged { adset_id, audience },
            "Ad set retargeted to a new audience",
        ))
    }

    fn revise_offer(
        &self,
        campaign: &Campaign,
        decision: &Decision,
    ) -> OptimizeResult<ActionResult> {
        let product = self.store.product(campaign.product_id)?;
        let (ctr, conversion_rate) = campaign
            .latest_metrics
            .as_ref()
            .map(|m| (m.ctr, m.conversion_rate))
            .unwrap_or((0.0, 0.0));

        let assist = OfferRevisionAssist {
            product_name: product.name.clone(),
            current_price: product.price,
            current_value_prop: product.benefits.clone(),
            ctr,
            conversion_rate,
            roas: decision.summary.roas,
            reason: decision.reason.clone(),
            revision_template: OfferRevisionTemplate::default(),
        };
        self.audit(
            campaign,
            Action::ReviseOffer,
            decision,
            None,
            Some("Offer revision packet prepared for review".to_string()),
        );

        Ok(ActionResult::human_assist(
            campaign.id,
            Action::ReviseOffer,
            ActionOutcome::OfferRevision { assist },
            format!("Offer revision for {} needs a human decision", product.name),
        ))
    }

    fn optimize_budget(
        &self,
        campaign: &Campaign,
        decision: &Decision,
    ) -> OptimizeResult<ActionResult> {
        let adset_id = campaign.adset_id.clone().ok_or_else(|| {
            OptimizeError::Dispatch(format!("campaign {} has no ad set on record", campaign.id))
        })?;
        let roas = decision.summary.roas;
        let old_budget = campaign.budget;
        if old_budget <= 0.0 {
            return Err(OptimizeError::Dispatch(format!(
                "campaign {} has no usable budget on record",
                campaign.id
            )));
        }
        if roas <= 0.0 {
            return Err(OptimizeError::Dispatch(
                "cannot steer budget without a usable ROAS".to_string(),
            ));
        }

        let cfg = &self.budget;
        let (direction, factor) = if roas >= cfg.high_roas {
            (BudgetMove::ScaleUp, cfg.scale_up)
        } else if roas >= cfg.low_roas {
            (BudgetMove::Maintain, 1.0)
        } else if roas < cfg.hard_floor_roas {
            (BudgetMove::ScaleDown, cfg.scale_down_hard)
        } else {
            (BudgetMove::ScaleDown, cfg.scale_down)
        };

        let new_budget = round2(old_budget * factor).clamp(cfg.min_budget, cfg.max_budget);
        if (new_budget - old_budget).abs() < cfg.min_change {
            return Ok(ActionResult::noop(
                campaign.id,
                Action::OptimizeBudget,
                format!(
                    "Budget ${:.2} is already within ${:.2} of target; leaving it alone",
                    old_budget, cfg.min_change
                ),
            ));
        }

        self.platform.update_budget(&adset_id, new_budget)?;
        self.store.apply(
            campaign.id,
            CampaignUpdate {
                budget: Some(new_budget),
                ..CampaignUpdate::default()
            },
        )?;
        self.audit(
            campaign,
            Action::OptimizeBudget,
            decision,
            None,
            Some(format!(
                "ROAS {:.2}x, budget ${:.2} -> ${:.2}",
                roas, old_budget, new_budget
            )),
        );

        info!(campaign_id = %campaign.id, old_budget, new_budget, "Budget adjusted");
        Ok(ActionResult::executed(
            campaign.id,
            Action::OptimizeBudget,
            ActionOutcome::BudgetAdjusted {
                adset_id,
                direction,
                old_budget,
                new_budget,
            },
            format!("Budget moved from ${:.2} to ${:.2}", old_budget, new_budget),
        ))
    }

    fn audit(
        &self,
        campaign: &Campaign,
        action: Action,
        decision: &Decision,
        creative_used: Option<Uuid>,
        notes: Option<String>,
    ) {
        self.store.append_log(OptimizationLog {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            product_id: campaign.product_id,
            action,
            reason: decision.reason.clone(),
            metrics_snapshot: decision.summary.clone(),
            creative_used,
            notes,
            timestamp: Utc::now(),
        });
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::types::{Confidence, MetricsSummary, Priority};
    use adpilot_platform::sandbox::{
        CountingNotifier, FailingNotifier, SandboxPlatform, TemplateContentGenerator,
    };
    use adpilot_platform::InMemoryCampaignStore;

    struct Harness {
        platform: Arc<SandboxPlatform>,
        store: Arc<InMemoryCampaignStore>,
        dispatcher: ActionDispatcher,
        campaign: Campaign,
    }

    fn harness() -> Harness {
        harness_with_notifier(Arc::new(CountingNotifier::default()))
    }

    fn harness_with_notifier(notifier: Arc<dyn Notifier>) -> Harness {
        let platform = Arc::new(SandboxPlatform::new(30));
        let store = Arc::new(InMemoryCampaignStore::new());
        platform.seed_campaign("ext-1", "Summer Sale", "adset-1", 40.0);

        let product_id = Uuid::new_v4();
        store.insert_product(adpilot_core::types::Product {
            id: product_id,
            name: "Trail Shoes".to_string(),
            description: "Grippy shoes for rough ground.".to_string(),
            benefits: "Lightweight and durable.".to_string(),
            use_cases: "Running, Trail Hiking".to_string(),
            price: 89.0,
        });

        let current_creative = adpilot_core::types::Creative {
            id: Uuid::new_v4(),
            product_id,
            creative_type: "image".to_string(),
            file_hash: "hash-a".to_string(),
            file_url: "https://cdn.example.com/a.png".to_string(),
            headline: Some("Old headline".to_string()),
            ad_copy: None,
            cta: None,
            is_active: true,
        };
        let fresh_creative = adpilot_core::types::Creative {
            id: Uuid::new_v4(),
            file_hash: "hash-b".to_string(),
            ..current_creative.clone()
        };
        store.insert_creative(current_creative.clone());
        store.insert_creative(fresh_creative);

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            external_id: "ext-1".to_string(),
            adset_id: Some("adset-1".to_string()),
            product_id,
            name: "Summer Sale".to_string(),
            objective: "conversions".to_string(),
            status: CampaignStatus::Active,
            budget: 40.0,
            audience: Audience::default(),
            headline: Some("Old headline".to_string()),
            ad_copy: Some("Old copy".to_string()),
            cta: Some("Buy Now".to_string()),
            creative_ids: vec![current_creative.id],
            revenue: 120.0,
            conversions: 4,
            latest_metrics: None,
            created_at: now - chrono::Duration::days(4),
            updated_at: now,
        };
        store.insert(campaign.clone()).unwrap();

        let dispatcher = ActionDispatcher::new(
            platform.clone(),
            store.clone(),
            Arc::new(TemplateContentGenerator::new()),
            notifier,
            BudgetConfig::default(),
            ScaleTiers::default(),
        );
        Harness {
            platform,
            store,
            dispatcher,
            campaign,
        }
    }

    fn decision(campaign: &Campaign, action: Action, roas: f64) -> Decision {
        Decision {
            campaign_id: campaign.id,
            external_id: campaign.external_id.clone(),
            action,
            reason: "CRITICAL: test reason".to_string(),
            priority: Priority::High,
            confidence: Confidence::Medium,
            next_review_hours: action.review_interval_hours(),
            expected_outcome: action.expected_outcome(roas),
            summary: MetricsSummary {
                roas,
                spend: 30.0,
                conversions: 4,
                score: 70,
            },
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_pause_is_idempotent() {
        let h = harness();
        let decision = decision(&h.campaign, Action::Pause, 0.0);

        let first = h.dispatcher.dispatch(&decision);
        assert_eq!(first.status, ActionStatus::Executed);
        assert_eq!(
            h.platform.external_status("ext-1"),
            Some(ExternalStatus::Paused)
        );
        assert_eq!(
            h.store.get(h.campaign.id).unwrap().status,
            CampaignStatus::Paused
        );
        assert_eq!(h.store.logs_for(h.campaign.id).len(), 1);

        // Second pause confirms remote state but writes no second log.
        let second = h.dispatcher.dispatch(&decision);
        assert_eq!(second.status, ActionStatus::Executed);
        assert!(matches!(
            second.outcome,
            Some(ActionOutcome::Paused { already_paused: true })
        ));
        assert_eq!(h.store.logs_for(h.campaign.id).len(), 1);
    }

    #[test]
    fn test_scale_percent_follows_roas_tier() {
        let h = harness();
        let result = h.dispatcher.dispatch(&decision(&h.campaign, Action::Scale, 5.2));
        assert_eq!(result.status, ActionStatus::Executed);
        match result.outcome {
            Some(ActionOutcome::Scaled {
                scale_percent,
                new_budget,
                ..
            }) => {
                assert_eq!(scale_percent, 50);
                assert!((new_budget - 60.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.platform.adset_budget("ext-1"), Some(60.0));
        assert_eq!(h.store.logs_for(h.campaign.id).len(), 1);
    }

    #[test]
    fn test_scale_failure_writes_no_audit_log() {
        let h = harness();
        h.platform.inject_rate_limit("ext-1");
        let result = h.dispatcher.dispatch(&decision(&h.campaign, Action::Scale, 4.0));
        assert_eq!(result.status, ActionStatus::Failed);
        assert!(result.error.unwrap().contains("Rate limited"));
        assert!(h.store.logs_for(h.campaign.id).is_empty());
        // Budget untouched.
        assert_eq!(h.platform.adset_budget("ext-1"), Some(40.0));
    }

    #[test]
    fn test_clone_registers_new_campaign() {
        let h = harness();
        let result = h.dispatcher.dispatch(&decision(&h.campaign, Action::Clone, 5.5));
        assert_eq!(result.status, ActionStatus::Executed);
        let (new_external_id, new_campaign_id) = match result.outcome {
            Some(ActionOutcome::Cloned {
                new_external_id,
                new_campaign_id,
            }) => (new_external_id, new_campaign_id),
            other => panic!("unexpected outcome: {:?}", other),
        };
        let clone = h.store.get(new_campaign_id).unwrap();
        assert_eq!(clone.external_id, new_external_id);
        assert!(clone.name.contains("Clone_ext-1_"));
        assert_eq!(clone.conversions, 0);
        assert_eq!(clone.revenue, 0.0);
        assert_eq!(h.store.len(), 2);
    }

    #[test]
    fn test_edit_creative_rotates_assets() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::EditCreative, 1.2));
        assert_eq!(result.status, ActionStatus::Executed);
        match result.outcome {
            Some(ActionOutcome::CreativeRefreshed {
                old_ad_id,
                creative_id,
                ..
            }) => {
                assert!(old_ad_id.is_some());
                assert_ne!(creative_id, h.campaign.creative_ids[0]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let updated = h.store.get(h.campaign.id).unwrap();
        assert_ne!(updated.headline, h.campaign.headline);
        let log = &h.store.logs_for(h.campaign.id)[0];
        assert!(log.creative_used.is_some());
    }

    #[test]
    fn test_edit_creative_without_fresh_asset_fails() {
        let h = harness();
        // Exhaust the pool: deactivate the only fresh creative.
        let fresh = h
            .store
            .next_creative(h.campaign.product_id, Some(h.campaign.creative_ids[0]))
            .unwrap();
        h.store.set_creative_active(fresh.id, false).unwrap();

        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::EditCreative, 1.2));
        assert_eq!(result.status, ActionStatus::Failed);
        assert!(result.error.unwrap().contains("no fresh creative"));
    }

    #[test]
    fn test_change_audience_updates_targeting() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::ChangeAudience, 2.0));
        assert_eq!(result.status, ActionStatus::Executed);
        let targeting = h.platform.last_targeting("ext-1").unwrap();
        assert!(targeting.interests.len() >= 2);
        let updated = h.store.get(h.campaign.id).unwrap();
        assert!(!updated.audience.interests.is_empty());
    }

    #[test]
    fn test_revise_offer_is_human_assist() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::ReviseOffer, 2.0));
        assert_eq!(result.status, ActionStatus::HumanAssist);
        match result.outcome {
            Some(ActionOutcome::OfferRevision { assist }) => {
                assert_eq!(assist.product_name, "Trail Shoes");
                assert!(assist
                    .revision_template
                    .suggested_price
                    .starts_with('['));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // Human-assist still leaves an audit trail.
        assert_eq!(h.store.logs_for(h.campaign.id).len(), 1);
    }

    #[test]
    fn test_budget_scale_up_and_clamp() {
        let h = harness();
        // ROAS 4.5 -> x1.3 on a $40 budget.
        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::OptimizeBudget, 4.5));
        match result.outcome {
            Some(ActionOutcome::BudgetAdjusted {
                direction,
                new_budget,
                ..
            }) => {
                assert_eq!(direction, BudgetMove::ScaleUp);
                assert!((new_budget - 52.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        // A hard scale-down from a small budget clamps at the floor.
        let small = h.store.apply(
            h.campaign.id,
            CampaignUpdate {
                budget: Some(12.0),
                ..CampaignUpdate::default()
            },
        );
        assert!(small.is_ok());
        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::OptimizeBudget, 0.3));
        match result.outcome {
            Some(ActionOutcome::BudgetAdjusted { new_budget, .. }) => {
                assert!((new_budget - 10.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_budget_maintain_is_noop() {
        let h = harness();
        let result = h
            .dispatcher
            .dispatch(&decision(&h.campaign, Action::OptimizeBudget, 2.0));
        assert_eq!(result.status, ActionStatus::Noop);
        assert!(h.store.logs_for(h.campaign.id).is_empty());
        assert_eq!(h.platform.adset_budget("ext-1"), Some(40.0));
    }

    #[test]
    fn test_notifier_failure_is_swallowed() {
        let h = harness_with_notifier(Arc::new(FailingNotifier::default()));
        let result = h.dispatcher.dispatch(&decision(&h.campaign, Action::Pause, 0.0));
        assert_eq!(result.status, ActionStatus::Executed);
    }

    #[test]
    fn test_unknown_campaign_fails_cleanly() {
        let h = harness();
        let mut missing = decision(&h.campaign, Action::Pause, 0.0);
        missing.campaign_id = Uuid::new_v4();
        let result = h.dispatcher.dispatch(&missing);
        assert_eq!(result.status, ActionStatus::Failed);
        assert!(result.error.unwrap().contains("not found"));
    }
}
