//! Cycle scheduler: runs the collect -> analyze -> decide -> dispatch
//! pipeline over every active campaign, sequentially, with per-campaign
//! failure isolation. One bad campaign lands in the report's `skipped` or
//! `failed` bucket; the rest of the cycle proceeds.

use crate::analyzer::analyze;
use crate::collector::MetricCollector;
use crate::decision::decide;
use crate::dispatcher::ActionDispatcher;
use adpilot_core::config::OptimizerConfig;
use adpilot_core::types::{Action, ActionResult};
use adpilot_platform::traits::ReportingWindow;
use adpilot_platform::{AdPlatform, CampaignStore, ContentGenerator, Notifier};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Cooperative stop signal, honored between campaigns so an in-flight
/// action is never interrupted halfway.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizedCampaign {
    pub campaign_id: Uuid,
    pub external_id: String,
    pub action: Action,
    pub result: ActionResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedCampaign {
    pub campaign_id: Uuid,
    pub external_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedCampaign {
    pub campaign_id: Uuid,
    pub external_id: String,
    pub error: String,
}

/// Outcome of one full pass over the active campaigns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub optimized: Vec<OptimizedCampaign>,
    pub skipped: Vec<SkippedCampaign>,
    pub failed: Vec<FailedCampaign>,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.optimized.len() + self.skipped.len() + self.failed.len()
    }
}

pub struct Scheduler {
    store: Arc<dyn CampaignStore>,
    collector: MetricCollector,
    dispatcher: ActionDispatcher,
    config: OptimizerConfig,
    cancel: CancelToken,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        platform: Arc<dyn AdPlatform>,
        content: Arc<dyn ContentGenerator>,
        notifier: Arc<dyn Notifier>,
        config: OptimizerConfig,
    ) -> Self {
        let collector =
            MetricCollector::new(platform.clone(), store.clone(), ReportingWindow::Today);
        let dispatcher = ActionDispatcher::new(
            platform,
            store.clone(),
            content,
            notifier,
            config.budget.clone(),
            config.decision.scale_tiers.clone(),
        );
        Self {
            store,
            collector,
            dispatcher,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Handle for requesting a stop from another thread or task.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// One full optimization pass. The campaign list is fixed at cycle
    /// start; campaigns created mid-cycle (clones) wait for the next one.
    pub fn run_cycle(&self) -> CycleReport {
        let campaigns = self.store.active();
        info!(count = campaigns.len(), "Starting optimization cycle");

        let mut report = CycleReport::default();
        for campaign in campaigns {
            if self.cancel.is_cancelled() {
                info!("Cycle cancelled; stopping at campaign boundary");
                break;
            }

            let metrics = match self.collector.collect(&campaign) {
                Ok(m) => m,
                Err(e) => {
                    warn!(campaign_id = %campaign.id, error = %e, "Skipping campaign");
                    metrics::counter!("scheduler.campaigns_skipped").increment(1);
                    report.skipped.push(SkippedCampaign {
                        campaign_id: campaign.id,
                        external_id: campaign.external_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let analysis = analyze(&metrics, &self.config.scoring);
            if analysis.score < self.config.scheduler.dead_score_floor {
                info!(
                    campaign_id = %campaign.id,
                    score = analysis.score,
                    "Skipping dead campaign"
                );
                metrics::counter!("scheduler.campaigns_skipped").increment(1);
                report.skipped.push(SkippedCampaign {
                    campaign_id: campaign.id,
                    external_id: campaign.external_id.clone(),
                    reason: format!(
                        "dead campaign: health score {} below floor {}",
                        analysis.score, self.config.scheduler.dead_score_floor
                    ),
                });
                continue;
            }

            let decision = decide(&campaign, &metrics, &analysis, &self.config.decision);
            info!(
                campaign_id = %campaign.id,
                action = %decision.action,
                score = analysis.score,
                confidence = ?decision.confidence,
                "Decision made"
            );

            let result = self.dispatcher.dispatch(&decision);
            if result.is_failure() {
                metrics::counter!("scheduler.campaigns_failed").increment(1);
                report.failed.push(FailedCampaign {
                    campaign_id: campaign.id,
                    external_id: campaign.external_id.clone(),
                    error: result.error.clone().unwrap_or_default(),
                });
            } else {
                metrics::counter!("scheduler.campaigns_optimized").increment(1);
                report.optimized.push(OptimizedCampaign {
                    campaign_id: campaign.id,
                    external_id: campaign.external_id.clone(),
                    action: decision.action,
                    result,
                });
            }
        }

        metrics::counter!("scheduler.cycles").increment(1);
        info!(
            optimized = report.optimized.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Optimization cycle complete"
        );
        report
    }
}
